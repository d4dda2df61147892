//! Report whether a path exists and what it holds.

use super::Session;
use anyhow::{Context, Result};
use std::path::Path;

pub fn stat_path(session: &Session, file: &Path, path: Option<&str>) -> Result<()> {
    let target = session.open(file, path)?;
    let stat = target
        .stat()
        .with_context(|| format!("Failed to stat {}", target.as_uri()))?;

    println!("{}", serde_json::to_string(&stat)?);

    session.finish(&target);
    Ok(())
}
