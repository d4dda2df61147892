//! # schemapath CLI
//!
//! Command-line interface for reading JSON Schema and OpenAPI documents
//! through the schemapath resolution engine.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "schemapath")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (defaults to ./schemapath.yml when present)
    #[arg(long, env = "SCHEMAPATH_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Capacity of the full-path result cache (overrides the config file)
    #[arg(long)]
    cache_size: Option<usize>,

    /// Print cache statistics to stderr after the command
    #[arg(long)]
    stats: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the resolved value at a path as JSON
    Read {
        /// Document to read (JSON or YAML)
        file: PathBuf,

        /// Path inside the document, segments joined by the separator
        path: Option<String>,

        /// Pretty-print JSON
        #[arg(long)]
        pretty: bool,
    },

    /// List member names or array indices at a path
    Keys {
        /// Document to read (JSON or YAML)
        file: PathBuf,

        /// Path inside the document
        path: Option<String>,
    },

    /// Report existence, kind and length of a path as JSON
    Stat {
        /// Document to read (JSON or YAML)
        file: PathBuf,

        /// Path inside the document
        path: Option<String>,
    },

    /// Print the JSON Pointer form of a path
    Uri {
        /// Document to read (JSON or YAML)
        file: PathBuf,

        /// Path inside the document
        path: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; stdout is reserved for command output
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::WARN.into()
            }),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let session = commands::Session {
        config_path: cli.config,
        cache_size: cli.cache_size,
        print_stats: cli.stats,
    };

    match cli.command {
        Commands::Read { file, path, pretty } => {
            commands::read_value(&session, &file, path.as_deref(), pretty)
        }
        Commands::Keys { file, path } => commands::list_keys(&session, &file, path.as_deref()),
        Commands::Stat { file, path } => commands::stat_path(&session, &file, path.as_deref()),
        Commands::Uri { file, path } => commands::show_uri(&session, &file, path.as_deref()),
    }
}
