//! Versioned resource registry
//!
//! A registry maps base URIs to root documents. It never changes in
//! place: adding a resource yields a new registry with the next
//! generation, sharing every existing resource with its predecessor.

use crate::generation::Generation;
use crate::resolver::Resolver;
use crate::retriever::{Retrieve, RetrieveError};
use crate::uri::normalize_base;
use hashbrown::HashMap;
use schemapath_types::Node;
use std::fmt;
use std::sync::Arc;

/// A root document registered under its base URI
#[derive(Debug, Clone)]
pub struct Resource {
    uri: Arc<str>,
    contents: Node,
}

impl Resource {
    pub fn new(uri: impl Into<Arc<str>>, contents: Node) -> Self {
        Resource {
            uri: uri.into(),
            contents,
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn contents(&self) -> &Node {
        &self.contents
    }
}

struct RegistryInner {
    resources: HashMap<Arc<str>, Resource>,
    generation: Generation,
    retriever: Arc<dyn Retrieve>,
}

/// Append-only collection of resources
#[derive(Clone)]
pub struct Registry {
    inner: Arc<RegistryInner>,
}

impl Registry {
    /// An empty registry that fetches unknown resources through `retriever`
    pub fn new(retriever: Arc<dyn Retrieve>) -> Self {
        Registry {
            inner: Arc::new(RegistryInner {
                resources: HashMap::new(),
                generation: Generation::ZERO,
                retriever,
            }),
        }
    }

    /// A registry that also contains `contents` under `uri`.
    ///
    /// Registering a URI that is already present returns this registry
    /// unchanged; resources are never replaced.
    pub fn with_resource(&self, uri: &str, contents: Node) -> Registry {
        let uri = normalize_base(uri);
        if self.inner.resources.contains_key(uri.as_str()) {
            return self.clone();
        }

        let uri: Arc<str> = uri.into();
        let mut resources = self.inner.resources.clone();
        resources.insert(uri.clone(), Resource::new(uri, contents));

        Registry {
            inner: Arc::new(RegistryInner {
                resources,
                generation: self.inner.generation.next(),
                retriever: self.inner.retriever.clone(),
            }),
        }
    }

    pub fn get(&self, uri: &str) -> Option<&Resource> {
        self.inner.resources.get(uri)
    }

    pub fn contains(&self, uri: &str) -> bool {
        self.inner.resources.contains_key(uri)
    }

    pub fn len(&self) -> usize {
        self.inner.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.resources.is_empty()
    }

    pub fn generation(&self) -> Generation {
        self.inner.generation
    }

    /// Registered base URIs, sorted
    pub fn uris(&self) -> Vec<&str> {
        let mut uris: Vec<&str> = self.inner.resources.keys().map(|u| &**u).collect();
        uris.sort();
        uris
    }

    /// A resolver interpreting references relative to `base_uri`
    pub fn resolver(&self, base_uri: &str) -> Resolver {
        Resolver::new(normalize_base(base_uri), self.clone())
    }

    /// Whether both values are the same registry version
    pub fn ptr_eq(&self, other: &Registry) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn retrieve(&self, uri: &str) -> Result<Node, RetrieveError> {
        self.inner.retriever.retrieve(uri)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("generation", &self.inner.generation)
            .field("uris", &self.uris())
            .finish()
    }
}
