//! Path-style handle on a document
//!
//! A [`SchemaPath`] pairs a shared [`SchemaAccessor`] with a [`Path`].
//! Extending a path is cheap and never touches the document; the
//! accessor is only consulted when the path is read.
//!
//! ```rust,ignore
//! use schemapath_core::SchemaPath;
//! use serde_json::json;
//!
//! let spec = SchemaPath::from_value(json!({
//!     "components": {"schemas": {"Pet": {"type": "object"}}},
//!     "paths": {"/pets": {"$ref": "#/components/schemas/Pet"}}
//! }));
//! let pet = &spec / "paths" / "/pets";
//! assert_eq!((&pet / "type").read_str()?, "object");
//! ```

use crate::accessor::{SchemaAccessor, Stat};
use crate::config::{AccessorConfig, ConfigError};
use crate::error::ResolveError;
use crate::readers::{FilePathReader, FileReader};
use crate::resolver::Resolved;
use crate::retriever::{Retrieve, RetrieveError};
use schemapath_types::{Node, NodeKind, Path, Segment};
use serde::Serialize;
use std::fmt;
use std::io::Read;
use std::ops::Div;
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by [`SchemaPath`]
#[derive(Error, Debug)]
pub enum PathError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("{path}: expected {expected}, found {found}")]
    UnexpectedType {
        path: String,
        expected: &'static str,
        found: NodeKind,
    },

    #[error(transparent)]
    Retrieve(#[from] RetrieveError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl PathError {
    /// Whether the location does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, PathError::Resolve(err) if err.is_not_found())
    }
}

/// A string, or a list of strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum StrOrList {
    Str(String),
    List(Vec<String>),
}

impl StrOrList {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            StrOrList::Str(s) => vec![s],
            StrOrList::List(items) => items,
        }
    }
}

/// A location inside a document, read through a shared accessor
#[derive(Clone)]
pub struct SchemaPath {
    accessor: Arc<SchemaAccessor>,
    path: Path,
}

impl SchemaPath {
    pub fn new(accessor: Arc<SchemaAccessor>, path: Path) -> Self {
        SchemaPath { accessor, path }
    }

    /// Root of `node`, with the default configuration and retrievers
    pub fn from_node(node: Node) -> Self {
        Self::from_accessor(SchemaAccessor::from_node(node))
    }

    pub fn from_value(value: serde_json::Value) -> Self {
        Self::from_node(Node::from(value))
    }

    pub fn with_config(node: Node, config: AccessorConfig) -> Self {
        Self::from_accessor(SchemaAccessor::with_config(node, config))
    }

    pub fn with_retriever(node: Node, config: AccessorConfig, retriever: Arc<dyn Retrieve>) -> Self {
        Self::from_accessor(SchemaAccessor::new(node, config, retriever))
    }

    pub fn from_accessor(accessor: SchemaAccessor) -> Self {
        SchemaPath::new(Arc::new(accessor), Path::root())
    }

    /// Read a document from disk, based at its `file://` URL.
    pub fn from_path(path: impl AsRef<std::path::Path>) -> Result<Self, PathError> {
        Self::from_path_with_config(path, AccessorConfig::default())
    }

    /// Like [`SchemaPath::from_path`]; `config.base_uri` is replaced by
    /// the file's URL.
    pub fn from_path_with_config(
        path: impl AsRef<std::path::Path>,
        config: AccessorConfig,
    ) -> Result<Self, PathError> {
        config.validate()?;
        let (node, base_uri) = FilePathReader::new(path.as_ref()).read()?;
        Ok(Self::with_config(node, config.with_base_uri(base_uri)))
    }

    /// Read a document from a byte stream, based at `base_uri`.
    pub fn from_file(reader: impl Read, base_uri: &str) -> Result<Self, PathError> {
        let (node, _) = FileReader::new(reader).read()?;
        Ok(Self::with_config(node, AccessorConfig::default().with_base_uri(base_uri)))
    }

    pub fn accessor(&self) -> &Arc<SchemaAccessor> {
        &self.accessor
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn parts(&self) -> &[Segment] {
        self.path.parts()
    }

    pub fn name(&self) -> Option<&Segment> {
        self.path.last()
    }

    /// This location extended by a path literal; separators inside
    /// `literal` start new segments.
    pub fn join(&self, literal: &str) -> SchemaPath {
        let extra = Path::parse(literal, &self.accessor.config().separator);
        self.with_path(self.path.concat(&extra))
    }

    /// This location extended by exactly one segment.
    pub fn child(&self, segment: impl Into<Segment>) -> SchemaPath {
        self.with_path(self.path.join(segment))
    }

    pub fn parent(&self) -> Option<SchemaPath> {
        self.path.parent().map(|path| self.with_path(path))
    }

    fn with_path(&self, path: Path) -> SchemaPath {
        SchemaPath {
            accessor: self.accessor.clone(),
            path,
        }
    }

    pub fn resolve(&self) -> Result<Arc<Resolved>, PathError> {
        Ok(self.accessor.resolve(&self.path)?)
    }

    pub fn open(&self) -> Result<Node, PathError> {
        Ok(self.accessor.open(&self.path)?)
    }

    pub fn exists(&self) -> Result<bool, PathError> {
        Ok(self.stat()?.exists)
    }

    pub fn stat(&self) -> Result<Stat, PathError> {
        Ok(self.accessor.stat(&self.path)?)
    }

    pub fn keys(&self) -> Result<Vec<Segment>, PathError> {
        Ok(self.accessor.keys(&self.path)?)
    }

    /// Member names of an object; anything else is an error.
    pub fn str_keys(&self) -> Result<Vec<String>, PathError> {
        let node = self.open()?;
        match node.as_object() {
            Some(members) => Ok(members.keys().map(str::to_string).collect()),
            None => Err(self.unexpected("an object", node.kind())),
        }
    }

    /// Children paired with their segment
    pub fn items(&self) -> Result<Vec<(Segment, SchemaPath)>, PathError> {
        Ok(self
            .keys()?
            .into_iter()
            .map(|key| {
                let child = self.child(key.clone());
                (key, child)
            })
            .collect())
    }

    /// Children of an object, keyed by member name
    pub fn str_items(&self) -> Result<Vec<(String, SchemaPath)>, PathError> {
        Ok(self
            .str_keys()?
            .into_iter()
            .map(|key| {
                let child = self.child(key.as_str());
                (key, child)
            })
            .collect())
    }

    pub fn len(&self) -> Result<usize, PathError> {
        Ok(self.accessor.len(&self.path)?)
    }

    pub fn contains(&self, key: impl Into<Segment>) -> Result<bool, PathError> {
        Ok(self.accessor.contains(&self.path, key)?)
    }

    /// The child at `key`, which must exist.
    pub fn require_child(&self, key: impl Into<Segment>) -> Result<SchemaPath, PathError> {
        let key = key.into();
        self.accessor.require_child(&self.path, key.clone())?;
        Ok(self.child(key))
    }

    pub fn read_value(&self) -> Result<Node, PathError> {
        self.open()
    }

    pub fn read_value_or(&self, default: Node) -> Result<Node, PathError> {
        or_default(self.read_value(), default)
    }

    pub fn read_str(&self) -> Result<String, PathError> {
        let node = self.read_value()?;
        match node.as_str() {
            Some(s) => Ok(s.to_string()),
            None => Err(self.unexpected("a string", node.kind())),
        }
    }

    pub fn read_str_or(&self, default: &str) -> Result<String, PathError> {
        or_default(self.read_str(), default.to_string())
    }

    pub fn read_bool(&self) -> Result<bool, PathError> {
        let node = self.read_value()?;
        node.as_bool()
            .ok_or_else(|| self.unexpected("a bool", node.kind()))
    }

    /// Missing values and non-bool values both give `default`.
    pub fn read_bool_or(&self, default: bool) -> Result<bool, PathError> {
        match self.read_bool() {
            Err(PathError::UnexpectedType { .. }) => Ok(default),
            other => or_default(other, default),
        }
    }

    pub fn read_str_or_list(&self) -> Result<StrOrList, PathError> {
        let node = self.read_value()?;
        if let Some(s) = node.as_str() {
            return Ok(StrOrList::Str(s.to_string()));
        }
        let strings = node
            .as_array()
            .and_then(|items| items.iter().map(|item| item.as_str().map(str::to_string)).collect());
        match strings {
            Some(list) => Ok(StrOrList::List(list)),
            None => Err(self.unexpected("a string or a list of strings", node.kind())),
        }
    }

    pub fn read_str_or_list_or(&self, default: StrOrList) -> Result<StrOrList, PathError> {
        or_default(self.read_str_or_list(), default)
    }

    /// JSON Pointer fragment naming this location, e.g. `#/paths/~1pets`.
    /// The root is `#/`.
    pub fn as_uri(&self) -> String {
        if self.path.is_empty() {
            return "#/".to_string();
        }
        self.path.to_pointer()
    }

    fn unexpected(&self, expected: &'static str, found: NodeKind) -> PathError {
        PathError::UnexpectedType {
            path: self.as_uri(),
            expected,
            found,
        }
    }
}

fn or_default<T>(result: Result<T, PathError>, default: T) -> Result<T, PathError> {
    match result {
        Err(err) if err.is_not_found() => Ok(default),
        other => other,
    }
}

impl PartialEq for SchemaPath {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.accessor, &other.accessor) && self.path == other.path
    }
}

impl Eq for SchemaPath {}

impl fmt::Display for SchemaPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)
    }
}

impl fmt::Debug for SchemaPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SchemaPath").field(&self.as_uri()).finish()
    }
}

impl Div<&str> for &SchemaPath {
    type Output = SchemaPath;

    fn div(self, literal: &str) -> SchemaPath {
        self.join(literal)
    }
}

impl Div<&str> for SchemaPath {
    type Output = SchemaPath;

    fn div(self, literal: &str) -> SchemaPath {
        self.join(literal)
    }
}

impl Div<usize> for &SchemaPath {
    type Output = SchemaPath;

    fn div(self, index: usize) -> SchemaPath {
        self.child(index)
    }
}

impl Div<usize> for SchemaPath {
    type Output = SchemaPath;

    fn div(self, index: usize) -> SchemaPath {
        self.child(index)
    }
}
