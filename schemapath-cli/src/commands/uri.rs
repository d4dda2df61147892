//! Print the JSON Pointer form of a path.

use super::Session;
use anyhow::Result;
use std::path::Path;

pub fn show_uri(session: &Session, file: &Path, path: Option<&str>) -> Result<()> {
    let target = session.open(file, path)?;
    println!("{}", target.as_uri());
    Ok(())
}
