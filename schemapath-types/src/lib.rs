//! Shared types for schemapath
//!
//! This crate provides the document tree that paths address and the path
//! types used to address it. Nodes are immutable and cheap to clone, so
//! many resolved results and cache entries can share one loaded document.

mod node;
mod path;

pub use node::{Members, Node, NodeKind};
pub use path::{escape_pointer_token, Path, Segment, DEFAULT_SEPARATOR};
