//! Accessor configuration

use crate::deref::DEFAULT_MAX_CHAIN_DEPTH;
use schemapath_types::DEFAULT_SEPARATOR;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Settings for a [`SchemaAccessor`](crate::SchemaAccessor), matching
/// the `schemapath.yml` schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessorConfig {
    /// URI the root document is registered under
    pub base_uri: String,

    /// Capacity of the full-path cache (0 disables it)
    pub resolved_cache_maxsize: usize,

    /// Reference hops allowed in a single chain
    pub max_chain_depth: usize,

    /// Separator used when parsing path literals
    pub separator: String,

    /// Timeout for HTTP retrieval
    pub http_timeout_secs: u64,
}

impl Default for AccessorConfig {
    fn default() -> Self {
        AccessorConfig {
            base_uri: String::new(),
            resolved_cache_maxsize: 0,
            max_chain_depth: DEFAULT_MAX_CHAIN_DEPTH,
            separator: DEFAULT_SEPARATOR.to_string(),
            http_timeout_secs: 10,
        }
    }
}

impl AccessorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: AccessorConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.separator.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "separator",
                reason: "must not be empty".to_string(),
            });
        }
        if self.max_chain_depth == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_chain_depth",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn with_base_uri(mut self, base_uri: impl Into<String>) -> Self {
        self.base_uri = base_uri.into();
        self
    }

    pub fn with_cache_size(mut self, maxsize: usize) -> Self {
        self.resolved_cache_maxsize = maxsize;
        self
    }

    pub fn with_max_chain_depth(mut self, depth: usize) -> Self {
        self.max_chain_depth = depth;
        self
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn with_http_timeout(mut self, secs: u64) -> Self {
        self.http_timeout_secs = secs;
        self
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
