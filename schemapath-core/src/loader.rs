//! Parsing raw document text into nodes

use schemapath_types::Node;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parse a JSON or YAML document.
///
/// Text that looks like JSON goes through the JSON parser first; YAML
/// flow mappings also start with `{`, so a JSON failure falls back to
/// YAML. When both fail the JSON error is reported.
pub fn parse_document(text: &str) -> Result<Node, LoadError> {
    let trimmed = text.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return match serde_json::from_str::<Node>(trimmed) {
            Ok(node) => Ok(node),
            Err(json_err) => serde_yaml::from_str::<Node>(text).map_err(|_| LoadError::Json(json_err)),
        };
    }
    Ok(serde_yaml::from_str::<Node>(text)?)
}
