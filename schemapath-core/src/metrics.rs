//! Cache statistics
//!
//! Counters kept by a [`SchemaAccessor`](crate::SchemaAccessor) to show
//! how well its caches are working.

use serde::Serialize;
use std::fmt;

/// Snapshot of an accessor's cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Resolutions answered by the full-path cache
    pub full_hits: u64,

    /// Resolutions resumed from a cached non-root prefix
    pub prefix_hits: u64,

    /// Resolutions walked from the document root
    pub misses: u64,

    /// External resources fetched through the retriever
    pub fetches: u64,

    /// Times the caches were emptied after registry growth
    pub invalidations: u64,

    /// Entries currently held by the prefix cache
    pub prefix_entries: usize,

    /// Entries currently held by the full-path cache
    pub full_entries: usize,
}

impl CacheStats {
    pub fn lookups(&self) -> u64 {
        self.full_hits + self.prefix_hits + self.misses
    }

    /// Share of lookups that avoided a walk from the root (0.0 to 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.lookups();
        if total == 0 {
            0.0
        } else {
            (self.full_hits + self.prefix_hits) as f64 / total as f64
        }
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Cache Statistics:")?;
        writeln!(
            f,
            "  Full hits: {} | Prefix hits: {} | Misses: {} | Hit Rate: {:.1}%",
            self.full_hits,
            self.prefix_hits,
            self.misses,
            self.hit_rate() * 100.0
        )?;
        writeln!(
            f,
            "  Fetches: {} | Invalidations: {}",
            self.fetches, self.invalidations
        )?;
        writeln!(
            f,
            "  Entries: {} prefix, {} full",
            self.prefix_entries, self.full_entries
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate() {
        let stats = CacheStats {
            full_hits: 1,
            prefix_hits: 2,
            misses: 1,
            ..Default::default()
        };
        assert_eq!(stats.lookups(), 4);
        assert_eq!(stats.hit_rate(), 0.75);
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }

    #[test]
    fn test_display() {
        let stats = CacheStats {
            full_hits: 3,
            misses: 1,
            fetches: 2,
            ..Default::default()
        };
        let text = stats.to_string();
        assert!(text.contains("Full hits: 3"));
        assert!(text.contains("Hit Rate: 75.0%"));
        assert!(text.contains("Fetches: 2"));
    }
}
