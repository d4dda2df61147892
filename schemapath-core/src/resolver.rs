//! Resolvers: a base URI paired with a registry version

use crate::deref::{Dereferencer, DEFAULT_MAX_CHAIN_DEPTH};
use crate::error::ResolveError;
use crate::generation::Generation;
use crate::registry::Registry;
use schemapath_types::Node;
use std::sync::Arc;

/// Context for interpreting references found in a document
#[derive(Debug, Clone)]
pub struct Resolver {
    base_uri: Arc<str>,
    registry: Registry,
}

impl Resolver {
    pub fn new(base_uri: impl Into<Arc<str>>, registry: Registry) -> Self {
        Resolver {
            base_uri: base_uri.into(),
            registry,
        }
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn generation(&self) -> Generation {
        self.registry.generation()
    }

    /// Same base URI, different registry version
    pub fn with_registry(&self, registry: Registry) -> Resolver {
        Resolver {
            base_uri: self.base_uri.clone(),
            registry,
        }
    }

    /// Same registry, different base URI
    pub fn in_resource(&self, base_uri: &str) -> Resolver {
        Resolver {
            base_uri: base_uri.into(),
            registry: self.registry.clone(),
        }
    }

    /// Root of the resource registered under `base`, fetching it first
    /// when the registry does not know it yet.
    ///
    /// The returned resolver is based at `base` and carries the (possibly
    /// grown) registry.
    pub fn resource(&self, base: &str) -> Result<(Node, Resolver), ResolveError> {
        if let Some(resource) = self.registry.get(base) {
            return Ok((resource.contents().clone(), self.in_resource(base)));
        }

        tracing::debug!(uri = base, "retrieving external resource");
        let contents = self.registry.retrieve(base).map_err(|source| {
            tracing::warn!(uri = base, "retrieval failed: {}", source);
            ResolveError::ResourceUnavailable {
                uri: base.to_string(),
                source,
            }
        })?;

        let registry = self.registry.with_resource(base, contents);
        tracing::debug!(uri = base, generation = %registry.generation(), "registry grew");

        // Read back from the registry so the root is keyed by its
        // normalized URI.
        let root = match registry.get(base) {
            Some(resource) => resource.contents().clone(),
            None => return Err(ResolveError::InvalidReference(base.to_string())),
        };
        Ok((root, Resolver::new(base, registry)))
    }

    /// Content at `reference`, relative to this resolver's base URI.
    ///
    /// References met along the fragment pointer are followed; the target
    /// itself is returned as found, even when it is a reference.
    pub fn lookup(&self, reference: &str) -> Result<Resolved, ResolveError> {
        Dereferencer::new(self.registry.clone(), DEFAULT_MAX_CHAIN_DEPTH).lookup(self, reference)
    }
}

/// Concrete content together with the resolver valid at that point
#[derive(Debug, Clone)]
pub struct Resolved {
    pub contents: Node,
    pub resolver: Resolver,
}

impl Resolved {
    pub fn new(contents: Node, resolver: Resolver) -> Self {
        Resolved { contents, resolver }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retriever::{Retrieve, RetrieveError};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting(calls: Arc<AtomicUsize>, doc: serde_json::Value) -> Arc<dyn Retrieve> {
        Arc::new(move |_: &str| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, RetrieveError>(Node::from(doc.clone()))
        })
    }

    #[test]
    fn test_lookup_local_fragment() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = Registry::new(counting(calls.clone(), json!({})))
            .with_resource("", Node::from(json!({"$defs": {"A": {"type": "string"}}})));
        let resolver = registry.resolver("");

        let resolved = resolver.lookup("#/$defs/A").unwrap();
        assert_eq!(resolved.contents, json!({"type": "string"}));
        assert_eq!(resolved.resolver.generation(), resolver.generation());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_lookup_returns_target_reference_unfollowed() {
        let registry = Registry::new(counting(Arc::new(AtomicUsize::new(0)), json!({})))
            .with_resource("", Node::from(json!({"a": {"$ref": "#/b"}, "b": 1})));

        let resolved = registry.resolver("").lookup("#/a").unwrap();
        assert_eq!(resolved.contents.ref_uri(), Some("#/b"));
    }

    #[test]
    fn test_lookup_fetches_unknown_base() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = Registry::new(counting(calls.clone(), json!({"Info": {"type": "object"}})))
            .with_resource("", Node::from(json!({})));
        let resolver = registry.resolver("");

        let resolved = resolver.lookup("x://defs#/Info").unwrap();
        assert_eq!(resolved.contents, json!({"type": "object"}));
        assert_eq!(resolved.resolver.base_uri(), "x://defs");
        assert_eq!(resolved.resolver.generation(), Generation(2));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // The grown registry already holds the resource
        let again = resolved.resolver.lookup("x://defs#/Info").unwrap();
        assert_eq!(again.contents, json!({"type": "object"}));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_retrieval_is_not_committed() {
        let registry = Registry::new(Arc::new(|_: &str| {
            Err::<Node, _>(RetrieveError::Other("offline".into()))
        }))
        .with_resource("", Node::from(json!({})));
        let resolver = registry.resolver("");

        let err = resolver.lookup("x://defs#/Info").unwrap_err();
        match err {
            ResolveError::ResourceUnavailable { uri, .. } => assert_eq!(uri, "x://defs"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(resolver.registry().len(), 1);
    }
}
