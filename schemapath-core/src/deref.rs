//! Following `$ref` chains
//!
//! A chain is followed with an explicit loop. Each hop resolves the
//! reference against the current base, fetches the target resource if
//! needed, and applies the fragment's pointer tokens to the resource root
//! as they are written: a `$ref` met partway down the pointer is an
//! ordinary object there. Only the node the pointer lands on is followed
//! further. The chain is cyclic exactly when the same absolute target
//! (base URI plus fragment) is entered twice.

use crate::error::ResolveError;
use crate::registry::Registry;
use crate::resolver::{Resolved, Resolver};
use crate::uri;
use crate::walker::step_token;
use schemapath_types::Node;
use std::collections::HashSet;

/// Upper bound on reference hops within one chain.
pub const DEFAULT_MAX_CHAIN_DEPTH: usize = 4096;

/// Follows reference chains, remembering the largest registry it has seen.
///
/// A dereferencer lives for one top-level operation. The owner reads
/// [`Dereferencer::latest_registry`] afterwards, whether or not the
/// operation succeeded, so that a resource fetched along the way is not
/// fetched again.
#[derive(Debug)]
pub struct Dereferencer {
    max_depth: usize,
    latest: Registry,
}

impl Dereferencer {
    pub fn new(registry: Registry, max_depth: usize) -> Self {
        Dereferencer {
            max_depth,
            latest: registry,
        }
    }

    pub fn latest_registry(&self) -> &Registry {
        &self.latest
    }

    pub fn into_latest_registry(self) -> Registry {
        self.latest
    }

    /// Follow `node` until it is not a reference.
    ///
    /// A non-reference node comes back unchanged with `resolver`.
    pub fn dereference(&mut self, node: &Node, resolver: &Resolver) -> Result<Resolved, ResolveError> {
        let mut chain = Chain::new(self.max_depth);
        let mut current = Resolved::new(node.clone(), resolver.clone());
        while let Some(reference) = current.contents.ref_uri() {
            let reference = reference.to_string();
            current = self.hop(&mut chain, &reference, &current.resolver)?;
        }
        Ok(current)
    }

    /// Content at `reference` without dereferencing the target itself.
    pub fn lookup(&mut self, resolver: &Resolver, reference: &str) -> Result<Resolved, ResolveError> {
        let mut chain = Chain::new(self.max_depth);
        self.hop(&mut chain, reference, resolver)
    }

    fn hop(&mut self, chain: &mut Chain, reference: &str, resolver: &Resolver) -> Result<Resolved, ResolveError> {
        let (root, next, tokens) = chain.enter(reference, resolver)?;
        self.observe(&next);
        let contents = tokens
            .iter()
            .try_fold(root, |node, token| step_token(&node, token))?;
        Ok(Resolved::new(contents, next))
    }

    fn observe(&mut self, resolver: &Resolver) {
        if resolver.generation() > self.latest.generation() {
            self.latest = resolver.registry().clone();
        }
    }
}

/// Bookkeeping for one dereference chain
struct Chain {
    visited: HashSet<String>,
    hops: Vec<String>,
    max_depth: usize,
}

impl Chain {
    fn new(max_depth: usize) -> Self {
        Chain {
            visited: HashSet::new(),
            hops: Vec::new(),
            max_depth,
        }
    }

    /// Record a hop through `reference`: returns the target resource root,
    /// the resolver based at it and the fragment's pointer tokens.
    fn enter(
        &mut self,
        reference: &str,
        resolver: &Resolver,
    ) -> Result<(Node, Resolver, Vec<String>), ResolveError> {
        if self.hops.len() >= self.max_depth {
            return Err(ResolveError::ReferenceChainTooLong(self.max_depth));
        }

        let target = uri::split_reference(resolver.base_uri(), reference)?;
        let tokens = uri::fragment_tokens(&target.fragment)?;
        let absolute = target.to_string();

        self.hops.push(absolute.clone());
        if !self.visited.insert(absolute) {
            return Err(ResolveError::CyclicReference(std::mem::take(&mut self.hops)));
        }
        tracing::trace!(hop = self.hops.len(), target = %target, "following reference");

        let (root, next) = resolver.resource(&target.base)?;
        Ok((root, next, tokens))
    }
}

/// Follow `node` with a throwaway dereferencer.
pub fn dereference(node: &Node, resolver: &Resolver, max_depth: usize) -> Result<Resolved, ResolveError> {
    Dereferencer::new(resolver.registry().clone(), max_depth).dereference(node, resolver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::Generation;
    use crate::retriever::{Retrieve, RetrieveError};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn offline() -> Arc<dyn Retrieve> {
        Arc::new(|uri: &str| Err::<Node, _>(RetrieveError::Other(format!("offline: {uri}"))))
    }

    fn resolver_for(doc: serde_json::Value) -> (Node, Resolver) {
        let root = Node::from(doc);
        let registry = Registry::new(offline()).with_resource("", root.clone());
        (root, registry.resolver(""))
    }

    #[test]
    fn test_non_reference_is_identity() {
        let (root, resolver) = resolver_for(json!({"a": 1}));
        let resolved = dereference(&root, &resolver, DEFAULT_MAX_CHAIN_DEPTH).unwrap();
        assert!(resolved.contents.ptr_eq(&root));
        assert!(resolved.resolver.registry().ptr_eq(resolver.registry()));
    }

    #[test]
    fn test_double_reference() {
        let (root, resolver) = resolver_for(json!({
            "a": {"$ref": "#/b"},
            "b": {"$ref": "#/c"},
            "c": {"value": 42}
        }));
        let a = root.get("a").unwrap();
        let resolved = dereference(a, &resolver, DEFAULT_MAX_CHAIN_DEPTH).unwrap();
        assert_eq!(resolved.contents, json!({"value": 42}));
    }

    #[test]
    fn test_cycle_is_detected() {
        let (root, resolver) = resolver_for(json!({
            "$ref": "#/$defs/A",
            "$defs": {
                "A": {"$ref": "#/$defs/B"},
                "B": {"$ref": "#/$defs/A"}
            }
        }));
        let err = dereference(&root, &resolver, DEFAULT_MAX_CHAIN_DEPTH).unwrap_err();
        match err {
            ResolveError::CyclicReference(chain) => {
                assert_eq!(chain, vec!["#/$defs/A", "#/$defs/B", "#/$defs/A"]);
            }
            other => panic!("expected a cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let (root, resolver) = resolver_for(json!({"$ref": "#"}));
        let err = dereference(&root, &resolver, DEFAULT_MAX_CHAIN_DEPTH).unwrap_err();
        assert!(matches!(err, ResolveError::CyclicReference(_)));
    }

    #[test]
    fn test_long_straight_chain_resolves() {
        let mut defs = serde_json::Map::new();
        let length = 1500;
        for i in 0..length {
            defs.insert(format!("n{i}"), json!({"$ref": format!("#/$defs/n{}", i + 1)}));
        }
        defs.insert(format!("n{length}"), json!({"leaf": true}));
        let (root, resolver) = resolver_for(json!({"$ref": "#/$defs/n0", "$defs": defs}));

        let resolved = dereference(&root, &resolver, DEFAULT_MAX_CHAIN_DEPTH).unwrap();
        assert_eq!(resolved.contents, json!({"leaf": true}));
    }

    #[test]
    fn test_chain_depth_guard() {
        let (root, resolver) = resolver_for(json!({
            "$ref": "#/a",
            "a": {"$ref": "#/b"},
            "b": {"$ref": "#/c"},
            "c": 1
        }));
        let err = dereference(&root, &resolver, 2).unwrap_err();
        assert!(matches!(err, ResolveError::ReferenceChainTooLong(2)));
    }

    #[test]
    fn test_reference_inside_pointer_is_not_followed() {
        let (root, resolver) = resolver_for(json!({
            "start": {"$ref": "#/alias/value"},
            "alias": {"$ref": "#/real"},
            "real": {"value": "found"}
        }));
        let start = root.get("start").unwrap();
        let err = dereference(start, &resolver, DEFAULT_MAX_CHAIN_DEPTH).unwrap_err();
        assert!(matches!(err, ResolveError::KeyNotFound(ref k) if k == "value"));
    }

    #[test]
    fn test_pointer_passes_through_referencing_container() {
        let (root, resolver) = resolver_for(json!({
            "$ref": "#/$defs/Root",
            "$defs": {
                "Root": {"$ref": "#/$defs/Leaf"},
                "Leaf": {"title": "leaf"}
            }
        }));
        let resolved = dereference(&root, &resolver, DEFAULT_MAX_CHAIN_DEPTH).unwrap();
        assert_eq!(resolved.contents, json!({"title": "leaf"}));
    }

    #[test]
    fn test_same_target_from_different_sources_is_not_a_cycle() {
        let (root, resolver) = resolver_for(json!({
            "A": {"$ref": "#/D"},
            "B": {"$ref": "#/D"},
            "D": {"value": 1}
        }));
        let mut deref = Dereferencer::new(resolver.registry().clone(), DEFAULT_MAX_CHAIN_DEPTH);
        let a = deref.dereference(root.get("A").unwrap(), &resolver).unwrap();
        let b = deref.dereference(root.get("B").unwrap(), &resolver).unwrap();
        assert!(a.contents.ptr_eq(&b.contents));
    }

    #[test]
    fn test_self_extending_pointer_fails_fast() {
        let (root, resolver) = resolver_for(json!({"A": {"$ref": "#/A/x"}}));
        let a = root.get("A").unwrap();
        let err = dereference(a, &resolver, DEFAULT_MAX_CHAIN_DEPTH).unwrap_err();
        assert!(matches!(err, ResolveError::KeyNotFound(ref k) if k == "x"));
    }

    #[test]
    fn test_two_member_cycle_at_default_depth() {
        let (root, resolver) = resolver_for(json!({
            "A": {"$ref": "#/B"},
            "B": {"$ref": "#/A"}
        }));
        let err = dereference(root.get("A").unwrap(), &resolver, DEFAULT_MAX_CHAIN_DEPTH).unwrap_err();
        match err {
            ResolveError::CyclicReference(chain) => assert_eq!(chain, vec!["#/B", "#/A", "#/B"]),
            other => panic!("expected a cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_target() {
        let (root, resolver) = resolver_for(json!({"a": {"$ref": "#/nope"}}));
        let err = dereference(root.get("a").unwrap(), &resolver, DEFAULT_MAX_CHAIN_DEPTH).unwrap_err();
        assert!(matches!(err, ResolveError::KeyNotFound(ref k) if k == "nope"));
    }

    #[test]
    fn test_latest_registry_survives_errors() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let retriever: Arc<dyn Retrieve> = Arc::new(move |_: &str| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, RetrieveError>(Node::from(json!({"Info": {}})))
        });
        let root = Node::from(json!({"bad": {"$ref": "x://defs#/Missing"}}));
        let registry = Registry::new(retriever).with_resource("", root.clone());
        let resolver = registry.resolver("");

        let mut deref = Dereferencer::new(registry.clone(), DEFAULT_MAX_CHAIN_DEPTH);
        let err = deref.dereference(root.get("bad").unwrap(), &resolver).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(deref.latest_registry().generation(), Generation(2));
        assert!(deref.latest_registry().contains("x://defs"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
