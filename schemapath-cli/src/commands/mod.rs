//! CLI command implementations.

pub mod keys;
pub mod read;
pub mod stat;
pub mod uri;

pub use keys::list_keys;
pub use read::read_value;
pub use stat::stat_path;
pub use uri::show_uri;

use anyhow::{Context, Result};
use schemapath_core::{AccessorConfig, SchemaPath};
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG: &str = "schemapath.yml";

/// Options shared by every command
pub struct Session {
    pub config_path: Option<PathBuf>,
    pub cache_size: Option<usize>,
    pub print_stats: bool,
}

impl Session {
    /// Configuration from `--config`, else `./schemapath.yml` when
    /// present, with command-line overrides applied.
    pub fn load_config(&self) -> Result<AccessorConfig> {
        let mut config = match &self.config_path {
            Some(path) => AccessorConfig::from_file(path)
                .with_context(|| format!("Failed to load configuration {:?}", path))?,
            None if Path::new(DEFAULT_CONFIG).is_file() => AccessorConfig::from_file(DEFAULT_CONFIG)
                .with_context(|| format!("Failed to load configuration {}", DEFAULT_CONFIG))?,
            None => AccessorConfig::default(),
        };
        if let Some(size) = self.cache_size {
            config.resolved_cache_maxsize = size;
        }
        Ok(config)
    }

    /// Open `file` and move to `path` inside it.
    pub fn open(&self, file: &Path, path: Option<&str>) -> Result<SchemaPath> {
        let config = self.load_config()?;
        let root = SchemaPath::from_path_with_config(file, config)
            .with_context(|| format!("Failed to open document {:?}", file))?;
        tracing::debug!(file = ?file, base_uri = %root.accessor().config().base_uri, "document loaded");
        Ok(match path {
            Some(literal) => root.join(literal),
            None => root,
        })
    }

    pub fn finish(&self, target: &SchemaPath) {
        if self.print_stats {
            eprint!("{}", target.accessor().stats());
        }
    }
}
