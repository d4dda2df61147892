//! Print the resolved value at a path.

use super::Session;
use anyhow::{Context, Result};
use std::path::Path;

pub fn read_value(session: &Session, file: &Path, path: Option<&str>, pretty: bool) -> Result<()> {
    let target = session.open(file, path)?;
    let value = target
        .read_value()
        .with_context(|| format!("Failed to resolve {}", target.as_uri()))?;

    let json = if pretty {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    }
    .context("Failed to serialize value")?;
    println!("{}", json);

    session.finish(&target);
    Ok(())
}
