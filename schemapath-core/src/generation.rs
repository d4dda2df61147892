//! Registry generations
//!
//! Every resource added to a registry bumps its generation. Caches key on
//! the generation so that nothing computed against a smaller registry is
//! served after it grows.

use std::fmt;

/// Generation number of a registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(pub u64);

impl Generation {
    pub const ZERO: Generation = Generation(0);

    pub fn next(self) -> Generation {
        Generation(self.0 + 1)
    }

    /// Number of generations between `earlier` and `self`
    pub fn since(self, earlier: Generation) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}
