//! Cached, reference-aware access to one root document
//!
//! A [`SchemaAccessor`] owns the root document, the latest resolver and
//! both caches. All mutable state sits behind one lock; each public
//! operation takes it once and runs to completion, retriever I/O
//! included.
//!
//! Resolution of a path goes through three stages:
//!
//! 1. the full-path cache, for exact repeats,
//! 2. the prefix cache, to resume below the longest walked prefix,
//! 3. the path walker, storing every intermediate node it passes.
//!
//! Afterwards the registry reached by the walk is compared with the one
//! the accessor held before. If it grew, the accessor adopts it and both
//! caches are emptied.

use crate::cache::{FullPathCache, PrefixCache};
use crate::config::AccessorConfig;
use crate::deref::Dereferencer;
use crate::error::ResolveError;
use crate::metrics::CacheStats;
use crate::registry::Registry;
use crate::resolver::{Resolved, Resolver};
use crate::retriever::{default_retriever, Retrieve};
use crate::walker::{step, walk_from};
use parking_lot::Mutex;
use schemapath_types::{Node, NodeKind, Path, Segment};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Existence and shallow shape of a location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Stat {
    pub exists: bool,
    pub kind: Option<NodeKind>,
    pub len: Option<usize>,
}

impl Stat {
    pub fn missing() -> Self {
        Stat {
            exists: false,
            kind: None,
            len: None,
        }
    }

    fn of(node: &Node) -> Self {
        Stat {
            exists: true,
            kind: Some(node.kind()),
            len: node.len(),
        }
    }
}

struct AccessorState {
    /// Latest resolver for the root document
    resolver: Resolver,
    prefix: PrefixCache,
    full: FullPathCache,
    stats: CacheStats,
}

impl AccessorState {
    fn resolve(&mut self, root: &Node, path: &Path, max_depth: usize) -> Result<Arc<Resolved>, ResolveError> {
        if let Some(hit) = self.full.get(path) {
            self.stats.full_hits += 1;
            tracing::trace!(path = %path, "full-path cache hit");
            return Ok(hit);
        }

        let mut deref = Dereferencer::new(self.resolver.registry().clone(), max_depth);
        let outcome = self.walk(root, path.parts(), &mut deref);
        // Keep fetched resources even when the walk failed afterwards.
        self.adopt(deref.into_latest_registry());

        let resolved = Arc::new(outcome?);
        self.full.set(path, resolved.clone());
        Ok(resolved)
    }

    fn walk(&mut self, root: &Node, parts: &[Segment], deref: &mut Dereferencer) -> Result<Resolved, ResolveError> {
        let (consumed, start) = match self.prefix.longest_prefix_hit(parts) {
            Some((consumed, hit)) if consumed > 0 => {
                self.stats.prefix_hits += 1;
                tracing::trace!(consumed, total = parts.len(), "prefix cache hit");
                (consumed, hit)
            }
            Some((_, root_hit)) => {
                self.stats.misses += 1;
                (0, root_hit)
            }
            None => {
                self.stats.misses += 1;
                let start = deref.dereference(root, &self.resolver)?;
                self.prefix.seed_root(start.clone());
                (0, start)
            }
        };

        let prefix = &mut self.prefix;
        walk_from(start, &parts[consumed..], deref, |i, resolved| {
            prefix.store_intermediate(parts, consumed + i + 1, resolved);
        })
    }

    fn adopt(&mut self, latest: Registry) {
        let current = self.resolver.generation();
        if latest.generation() <= current {
            return;
        }
        self.stats.fetches += latest.generation().since(current);
        tracing::debug!(
            from = %current,
            to = %latest.generation(),
            "registry grew, invalidating caches"
        );
        self.resolver = self.resolver.with_registry(latest);
        self.invalidate();
    }

    fn invalidate(&mut self) {
        self.prefix.invalidate();
        self.full.invalidate();
        self.stats.invalidations += 1;
    }
}

/// Reference-aware view of a root document
pub struct SchemaAccessor {
    root: Node,
    config: AccessorConfig,
    state: Mutex<AccessorState>,
}

impl SchemaAccessor {
    /// Accessor for `root`, registered under `config.base_uri`, fetching
    /// external resources through `retriever`.
    pub fn new(root: Node, config: AccessorConfig, retriever: Arc<dyn Retrieve>) -> Self {
        let registry = Registry::new(retriever).with_resource(&config.base_uri, root.clone());
        let resolver = registry.resolver(&config.base_uri);
        let state = AccessorState {
            resolver,
            prefix: PrefixCache::new(),
            full: FullPathCache::new(config.resolved_cache_maxsize),
            stats: CacheStats::default(),
        };
        SchemaAccessor {
            root,
            config,
            state: Mutex::new(state),
        }
    }

    /// Accessor using [`default_retriever`]
    pub fn with_config(root: Node, config: AccessorConfig) -> Self {
        let retriever = Arc::new(default_retriever(config.http_timeout()));
        Self::new(root, config, retriever)
    }

    pub fn from_node(root: Node) -> Self {
        Self::with_config(root, AccessorConfig::default())
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn config(&self) -> &AccessorConfig {
        &self.config
    }

    /// The latest resolver for the root document
    pub fn resolver(&self) -> Resolver {
        self.state.lock().resolver.clone()
    }

    /// Resolve `path` to concrete content.
    ///
    /// With the full-path cache enabled, repeating a path returns the
    /// same `Arc` until the registry grows.
    pub fn resolve(&self, path: &Path) -> Result<Arc<Resolved>, ResolveError> {
        self.state
            .lock()
            .resolve(&self.root, path, self.config.max_chain_depth)
    }

    pub fn open(&self, path: &Path) -> Result<Node, ResolveError> {
        Ok(self.resolve(path)?.contents.clone())
    }

    /// Existence and shape of `path`.
    ///
    /// Missing or untraversable locations are reported as not existing;
    /// cycles and fetch failures are still errors.
    pub fn stat(&self, path: &Path) -> Result<Stat, ResolveError> {
        match self.resolve(path) {
            Ok(resolved) => Ok(Stat::of(&resolved.contents)),
            Err(err) if is_absent(&err) => Ok(Stat::missing()),
            Err(err) => Err(err),
        }
    }

    /// Member names of an object or indices of an array, in order
    pub fn keys(&self, path: &Path) -> Result<Vec<Segment>, ResolveError> {
        let resolved = self.resolve(path)?;
        match &resolved.contents {
            Node::Object(members) => Ok(members.keys().map(Segment::from).collect()),
            Node::Array(items) => Ok((0..items.len()).map(Segment::Index).collect()),
            other => Err(ResolveError::NotTraversable {
                kind: other.kind(),
                segment: None,
            }),
        }
    }

    pub fn len(&self, path: &Path) -> Result<usize, ResolveError> {
        let resolved = self.resolve(path)?;
        resolved.contents.len().ok_or(ResolveError::NotTraversable {
            kind: resolved.contents.kind(),
            segment: None,
        })
    }

    /// Whether `path` has a child `key`; a missing parent is `false`.
    pub fn contains(&self, path: &Path, key: impl Into<Segment>) -> Result<bool, ResolveError> {
        let parent = match self.resolve(path) {
            Ok(parent) => parent,
            Err(err) if is_absent(&err) => return Ok(false),
            Err(err) => return Err(err),
        };
        match step(&parent.contents, &key.into()) {
            Ok(_) => Ok(true),
            Err(err) if is_absent(&err) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Resolve `path/key`, failing with the child's not-found error when
    /// the parent exists but the child does not.
    pub fn require_child(&self, path: &Path, key: impl Into<Segment>) -> Result<Arc<Resolved>, ResolveError> {
        let parent = self.resolve(path)?;
        let key = key.into();
        step(&parent.contents, &key)?;
        self.resolve(&path.join(key))
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        CacheStats {
            prefix_entries: state.prefix.len(),
            full_entries: state.full.len(),
            ..state.stats
        }
    }

    /// Empty both caches without touching the registry.
    pub fn clear_caches(&self) {
        let mut state = self.state.lock();
        state.prefix.invalidate();
        state.full.invalidate();
        tracing::debug!("caches cleared");
    }
}

impl fmt::Debug for SchemaAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("SchemaAccessor")
            .field("base_uri", &self.config.base_uri)
            .field("registry", state.resolver.registry())
            .field("stats", &state.stats)
            .finish()
    }
}

fn is_absent(err: &ResolveError) -> bool {
    err.is_not_found() || matches!(err, ResolveError::NotTraversable { .. })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retriever::RetrieveError;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn offline() -> Arc<dyn Retrieve> {
        Arc::new(|uri: &str| Err::<Node, _>(RetrieveError::Other(format!("offline: {uri}"))))
    }

    fn accessor(doc: serde_json::Value, cache_size: usize) -> SchemaAccessor {
        let config = AccessorConfig::default().with_cache_size(cache_size);
        SchemaAccessor::new(Node::from(doc), config, offline())
    }

    fn path(keys: &[&str]) -> Path {
        keys.iter().copied().collect()
    }

    #[test]
    fn test_resolve_and_open() {
        let accessor = accessor(json!({"a": {"$ref": "#/b"}, "b": {"c": true}}), 0);
        assert_eq!(accessor.open(&path(&["a", "c"])).unwrap(), Node::from(true));
        assert_eq!(accessor.open(&Path::root()).unwrap(), accessor.root().clone());
    }

    #[test]
    fn test_full_cache_returns_same_arc() {
        let accessor = accessor(json!({"a": {"b": 1}}), 8);
        let first = accessor.resolve(&path(&["a", "b"])).unwrap();
        let second = accessor.resolve(&path(&["a", "b"])).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(accessor.stats().full_hits, 1);
    }

    #[test]
    fn test_prefix_cache_counts() {
        let accessor = accessor(json!({"a": {"b": {"x": 1, "y": 2}}}), 0);
        accessor.resolve(&path(&["a", "b", "x"])).unwrap();
        accessor.resolve(&path(&["a", "b", "y"])).unwrap();

        let stats = accessor.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.prefix_hits, 1);
        assert_eq!(stats.full_hits, 0);
        // root, ["a"], ["a", "b"]
        assert_eq!(stats.prefix_entries, 3);
    }

    #[test]
    fn test_stat() {
        let accessor = accessor(json!({"arr": [1, 2, 3], "s": "x"}), 0);
        assert_eq!(
            accessor.stat(&path(&["arr"])).unwrap(),
            Stat {
                exists: true,
                kind: Some(NodeKind::Array),
                len: Some(3)
            }
        );
        assert_eq!(accessor.stat(&path(&["s"])).unwrap().len, None);
        assert_eq!(accessor.stat(&path(&["nope"])).unwrap(), Stat::missing());
        assert_eq!(accessor.stat(&path(&["s", "deeper"])).unwrap(), Stat::missing());
    }

    #[test]
    fn test_stat_propagates_cycles() {
        let accessor = accessor(json!({"a": {"$ref": "#/a"}}), 0);
        assert!(matches!(
            accessor.stat(&path(&["a"])),
            Err(ResolveError::CyclicReference(_))
        ));
    }

    #[test]
    fn test_keys_and_len() {
        let accessor = accessor(json!({"obj": {"z": 1, "a": 2}, "arr": [5, 6], "n": 3}), 0);
        assert_eq!(
            accessor.keys(&path(&["obj"])).unwrap(),
            vec![Segment::from("z"), Segment::from("a")]
        );
        assert_eq!(
            accessor.keys(&path(&["arr"])).unwrap(),
            vec![Segment::Index(0), Segment::Index(1)]
        );
        assert_eq!(accessor.len(&path(&["obj"])).unwrap(), 2);
        assert!(matches!(
            accessor.keys(&path(&["n"])),
            Err(ResolveError::NotTraversable { kind: NodeKind::Number, segment: None })
        ));
        assert!(accessor.len(&path(&["n"])).is_err());
        assert!(accessor.len(&path(&["missing"])).is_err());
    }

    #[test]
    fn test_contains_and_require_child() {
        let accessor = accessor(json!({"arr": [10, 20], "obj": {"k": null}}), 0);
        let arr = path(&["arr"]);

        assert!(accessor.contains(&arr, 1usize).unwrap());
        assert!(!accessor.contains(&arr, 2usize).unwrap());
        assert!(accessor.contains(&path(&["obj"]), "k").unwrap());
        assert!(!accessor.contains(&path(&["missing"]), "k").unwrap());

        assert!(matches!(
            accessor.require_child(&arr, 2usize),
            Err(ResolveError::IndexOutOfRange(2))
        ));
        assert!(matches!(
            accessor.require_child(&path(&["obj"]), "x"),
            Err(ResolveError::KeyNotFound(ref k)) if k == "x"
        ));
        assert!(matches!(
            accessor.require_child(&path(&["missing"]), "x"),
            Err(ResolveError::KeyNotFound(ref k)) if k == "missing"
        ));
        assert!(accessor.require_child(&path(&["obj"]), "k").unwrap().contents.is_null());
    }

    #[test]
    fn test_growth_invalidates_caches() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let retriever: Arc<dyn Retrieve> = Arc::new(move |_: &str| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, RetrieveError>(Node::from(json!({"Info": {"v": 1}})))
        });
        let root = Node::from(json!({"local": {"x": 1}, "remote": {"$ref": "x://defs#/Info"}}));
        let accessor = SchemaAccessor::new(root, AccessorConfig::default().with_cache_size(8), retriever);

        let before = accessor.resolve(&path(&["local", "x"])).unwrap();
        accessor.resolve(&path(&["remote", "v"])).unwrap();
        let after = accessor.resolve(&path(&["local", "x"])).unwrap();

        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(before.contents, after.contents);
        assert_eq!(after.resolver.generation(), accessor.resolver().generation());

        let stats = accessor.stats();
        assert_eq!(stats.fetches, 1);
        assert_eq!(stats.invalidations, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_walk_keeps_fetch() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let retriever: Arc<dyn Retrieve> = Arc::new(move |_: &str| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, RetrieveError>(Node::from(json!({"Info": {}})))
        });
        let root = Node::from(json!({"a": {"$ref": "x://defs#/Info"}}));
        let accessor = SchemaAccessor::new(root, AccessorConfig::default(), retriever);

        assert!(accessor.resolve(&path(&["a", "missing"])).is_err());
        accessor.resolve(&path(&["a"])).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_clear_caches() {
        let accessor = accessor(json!({"a": {"b": 1}}), 4);
        accessor.resolve(&path(&["a", "b"])).unwrap();
        accessor.clear_caches();
        let stats = accessor.stats();
        assert_eq!(stats.prefix_entries, 0);
        assert_eq!(stats.full_entries, 0);
    }

    #[test]
    fn test_accessor_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SchemaAccessor>();
    }
}
