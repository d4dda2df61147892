//! Schemapath Reference Resolution Engine
//!
//! This crate provides path-addressed, `$ref`-aware navigation over
//! JSON Schema and OpenAPI style documents. A path is walked one segment
//! at a time; every `$ref` met on the way is followed, including
//! references into documents fetched on demand.
//!
//! # Architecture
//!
//! ```text
//! SchemaPath → SchemaAccessor → [full-path cache] → [prefix cache]
//!            → path walker → dereferencer → resolver → registry → retriever
//! ```
//!
//! - **Registry**: immutable, versioned map of base URI to root document.
//!   Fetching a new resource yields a new registry with the next
//!   generation.
//! - **Resolver**: a base URI plus a registry version; looks up
//!   references, fetching unknown resources at most once.
//! - **Dereferencer**: follows `$ref` chains in an explicit loop with
//!   cycle detection and a hop limit.
//! - **Caches**: a prefix cache for sibling fan-out and a bounded LRU
//!   for exact repeats, both emptied when the registry grows.
//!
//! # Example
//!
//! ```rust,ignore
//! use schemapath_core::SchemaPath;
//!
//! let spec = SchemaPath::from_path("openapi.yaml")?;
//! for (name, _) in (&spec / "paths").str_items()? {
//!     println!("{name}");
//! }
//! let title = (&spec / "info#title").read_str()?;
//! ```

#![warn(missing_debug_implementations)]

// Core modules
pub mod accessor;
pub mod cache;
pub mod config;
pub mod deref;
pub mod error;
pub mod generation;
pub mod metrics;
pub mod registry;
pub mod resolver;
pub mod uri;
pub mod walker;

// Documents and retrieval
pub mod loader;
pub mod readers;
pub mod retriever;

// Typed facade
pub mod schema_path;

// Re-export main types
pub use accessor::{SchemaAccessor, Stat};
pub use cache::{FullPathCache, PrefixCache};
pub use config::{AccessorConfig, ConfigError};
pub use deref::{dereference, Dereferencer, DEFAULT_MAX_CHAIN_DEPTH};
pub use error::ResolveError;
pub use generation::Generation;
pub use loader::{parse_document, LoadError};
pub use metrics::CacheStats;
pub use readers::{FilePathReader, FileReader};
pub use registry::{Registry, Resource};
pub use resolver::{Resolved, Resolver};
#[cfg(feature = "http")]
pub use retriever::UrlHandler;
pub use retriever::{default_retriever, CombinedHandler, FileHandler, Retrieve, RetrieveError, SchemeRetriever, ALL_URLS};
pub use schema_path::{PathError, SchemaPath, StrOrList};
pub use schemapath_types::{Members, Node, NodeKind, Path, Segment};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::accessor::SchemaAccessor;
    pub use crate::config::AccessorConfig;
    pub use crate::error::ResolveError;
    pub use crate::retriever::{Retrieve, RetrieveError};
    pub use crate::schema_path::{PathError, SchemaPath};
    pub use schemapath_types::{Node, Path, Segment};
}
