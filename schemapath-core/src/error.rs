//! Resolution errors

use crate::retriever::RetrieveError;
use schemapath_types::{NodeKind, Segment};
use thiserror::Error;

/// Why a path or reference could not be resolved
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("key not found: '{0}'")]
    KeyNotFound(String),

    #[error("index out of range: {0}")]
    IndexOutOfRange(usize),

    #[error("cannot traverse {kind} node{}", describe_segment(.segment))]
    NotTraversable {
        kind: NodeKind,
        segment: Option<Segment>,
    },

    #[error("cyclic reference: {}", .0.join(" -> "))]
    CyclicReference(Vec<String>),

    #[error("reference chain longer than {0} hops")]
    ReferenceChainTooLong(usize),

    #[error("resource unavailable: {uri}")]
    ResourceUnavailable {
        uri: String,
        #[source]
        source: RetrieveError,
    },

    #[error("invalid reference: '{0}'")]
    InvalidReference(String),
}

impl ResolveError {
    /// Missing member or element. These are the errors a typed read may
    /// replace with a default.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ResolveError::KeyNotFound(_) | ResolveError::IndexOutOfRange(_)
        )
    }

    pub(crate) fn not_traversable(kind: NodeKind, segment: impl Into<Segment>) -> Self {
        ResolveError::NotTraversable {
            kind,
            segment: Some(segment.into()),
        }
    }
}

fn describe_segment(segment: &Option<Segment>) -> String {
    match segment {
        Some(Segment::Key(k)) => format!(" with key '{k}'"),
        Some(Segment::Index(i)) => format!(" with index {i}"),
        None => String::new(),
    }
}
