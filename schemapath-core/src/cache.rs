//! Caches of resolution results
//!
//! Two caches sit in front of the path walker:
//!
//! - [`PrefixCache`] remembers the dereferenced node at every prefix it
//!   has walked through, so sibling lookups resume below their common
//!   parent instead of at the document root.
//! - [`FullPathCache`] is a bounded LRU over complete paths, keyed by
//!   `(path, generation)`, returning the very same result object on an
//!   exact repeat.
//!
//! Both are derived state. They are emptied whenever the registry grows.

use crate::generation::Generation;
use crate::resolver::Resolved;
use hashbrown::HashMap;
use lru::LruCache;
use schemapath_types::{Path, Segment};
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Dereferenced nodes keyed by the path prefix that reached them
#[derive(Debug, Default)]
pub struct PrefixCache {
    entries: HashMap<Vec<Segment>, Resolved>,
}

impl PrefixCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the dereferenced root has been stored
    pub fn is_seeded(&self) -> bool {
        self.entries.contains_key::<[Segment]>(&[])
    }

    /// Store the dereferenced root under the empty prefix.
    pub fn seed_root(&mut self, root: Resolved) {
        self.entries.insert(Vec::new(), root);
    }

    /// Longest stored prefix of `parts`.
    ///
    /// Returns the number of segments the prefix covers together with
    /// the result stored for it.
    pub fn longest_prefix_hit(&self, parts: &[Segment]) -> Option<(usize, Resolved)> {
        (0..=parts.len())
            .rev()
            .find_map(|n| self.entries.get(&parts[..n]).map(|hit| (n, hit.clone())))
    }

    /// Store the result reached after `parts[..consumed]`.
    ///
    /// The complete path is left to the full-path cache.
    pub fn store_intermediate(&mut self, parts: &[Segment], consumed: usize, resolved: &Resolved) {
        if consumed >= parts.len() {
            return;
        }
        self.entries
            .entry(parts[..consumed].to_vec())
            .or_insert_with(|| resolved.clone());
    }

    /// Drop every entry, the root included.
    pub fn invalidate(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Bounded LRU of complete resolutions
///
/// A capacity of zero disables the cache: lookups miss and stores are
/// ignored.
#[derive(Debug)]
pub struct FullPathCache {
    /// `None` when disabled
    entries: Option<LruCache<(Path, Generation), Arc<Resolved>>>,

    /// Generation stamped into new keys
    generation: Generation,
}

impl FullPathCache {
    pub fn new(capacity: usize) -> Self {
        FullPathCache {
            entries: NonZeroUsize::new(capacity).map(LruCache::new),
            generation: Generation::ZERO,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.entries.is_some()
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Cached result for `path` under the current generation
    pub fn get(&mut self, path: &Path) -> Option<Arc<Resolved>> {
        let generation = self.generation;
        self.entries
            .as_mut()?
            .get(&(path.clone(), generation))
            .cloned()
    }

    /// Remember `resolved` for `path`, evicting the least recently used
    /// entry when full.
    pub fn set(&mut self, path: &Path, resolved: Arc<Resolved>) {
        let generation = self.generation;
        if let Some(entries) = self.entries.as_mut() {
            entries.put((path.clone(), generation), resolved);
        }
    }

    /// Move to a new generation and drop stored entries.
    ///
    /// The generation bump alone makes older keys unreachable.
    pub fn invalidate(&mut self) {
        self.generation = self.generation.next();
        if let Some(entries) = self.entries.as_mut() {
            entries.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, |entries| entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
