//! List the members of an object or the indices of an array.

use super::Session;
use anyhow::{Context, Result};
use std::path::Path;

pub fn list_keys(session: &Session, file: &Path, path: Option<&str>) -> Result<()> {
    let target = session.open(file, path)?;
    let keys = target
        .keys()
        .with_context(|| format!("Failed to list keys of {}", target.as_uri()))?;

    for key in keys {
        println!("{}", key);
    }

    session.finish(&target);
    Ok(())
}
