//! Paths into a document
//!
//! A path only means something relative to the root document it is
//! resolved against.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Separator used by [`Path::parse`] when none is configured.
pub const DEFAULT_SEPARATOR: &str = "#";

/// One step of a path: an object member name or an array position
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Segment {
    Key(String),
    Index(usize),
}

impl Segment {
    pub fn key(name: impl Into<String>) -> Self {
        Segment::Key(name.into())
    }

    pub fn as_key(&self) -> Option<&str> {
        match self {
            Segment::Key(k) => Some(k),
            Segment::Index(_) => None,
        }
    }

    pub fn as_index(&self) -> Option<usize> {
        match self {
            Segment::Index(i) => Some(*i),
            Segment::Key(_) => None,
        }
    }
}

impl From<&str> for Segment {
    fn from(key: &str) -> Self {
        Segment::Key(key.to_string())
    }
}

impl From<String> for Segment {
    fn from(key: String) -> Self {
        Segment::Key(key)
    }
}

impl From<usize> for Segment {
    fn from(index: usize) -> Self {
        Segment::Index(index)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(k) => f.write_str(k),
            Segment::Index(i) => write!(f, "{i}"),
        }
    }
}

/// Escape a JSON Pointer reference token (`~` → `~0`, `/` → `~1`).
pub fn escape_pointer_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

/// An immutable, ordered sequence of segments
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Path {
    parts: Arc<[Segment]>,
}

impl Path {
    /// The empty path, addressing the document root
    pub fn root() -> Self {
        Self::default()
    }

    /// Tokenize a path literal such as `paths#/pets#get`.
    ///
    /// Empty and `.` tokens are dropped; every token becomes a key.
    pub fn parse(literal: &str, separator: &str) -> Self {
        let sep = if separator.is_empty() {
            DEFAULT_SEPARATOR
        } else {
            separator
        };
        literal
            .split(sep)
            .filter(|token| !token.is_empty() && *token != ".")
            .map(Segment::from)
            .collect()
    }

    pub fn parts(&self) -> &[Segment] {
        &self.parts
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn last(&self) -> Option<&Segment> {
        self.parts.last()
    }

    /// A new path with one more segment
    pub fn join(&self, segment: impl Into<Segment>) -> Self {
        let mut parts = self.parts.to_vec();
        parts.push(segment.into());
        Path { parts: parts.into() }
    }

    /// A new path with every segment of `other` appended
    pub fn concat(&self, other: &Path) -> Self {
        let mut parts = self.parts.to_vec();
        parts.extend_from_slice(&other.parts);
        Path { parts: parts.into() }
    }

    pub fn parent(&self) -> Option<Self> {
        let (_, init) = self.parts.split_last()?;
        Some(Path { parts: init.into() })
    }

    /// JSON Pointer fragment form, e.g. `#/paths/~1pets/0`
    pub fn to_pointer(&self) -> String {
        let mut out = String::from("#");
        for part in self.parts.iter() {
            out.push('/');
            match part {
                Segment::Key(k) => out.push_str(&escape_pointer_token(k)),
                Segment::Index(i) => out.push_str(&i.to_string()),
            }
        }
        out
    }
}

impl<S: Into<Segment>> FromIterator<S> for Path {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Path {
            parts: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<Vec<Segment>> for Path {
    fn from(parts: Vec<Segment>) -> Self {
        Path {
            parts: parts.into(),
        }
    }
}

impl From<&[Segment]> for Path {
    fn from(parts: &[Segment]) -> Self {
        Path {
            parts: parts.into(),
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{part}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_parse_drops_empty_tokens() {
        let path = Path::parse("paths#/pets##.#get", "#");
        assert_eq!(
            path.parts(),
            &[Segment::key("paths"), Segment::key("/pets"), Segment::key("get")]
        );
        assert!(Path::parse("", "#").is_empty());
    }

    #[test]
    fn test_structural_identity() {
        let a = Path::root().join("arr").join(2usize);
        let b: Path = vec![Segment::key("arr"), Segment::Index(2)].into();
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
        assert_ne!(b, Path::root().join("arr").join("2"));
    }

    #[test]
    fn test_parent_and_display() {
        let path: Path = ["a", "b", "c"].into_iter().collect();
        assert_eq!(path.to_string(), "a/b/c");
        assert_eq!(path.parent().unwrap().to_string(), "a/b");
        assert_eq!(Path::root().parent(), None);
    }

    #[test]
    fn test_pointer_escaping() {
        let path = Path::root().join("paths").join("/pets/{id}").join("a~b").join(0usize);
        assert_eq!(path.to_pointer(), "#/paths/~1pets~1{id}/a~0b/0");
        assert_eq!(Path::root().to_pointer(), "#");
    }

    #[test]
    fn test_segment_untagged_serde() {
        let parts: Vec<Segment> = serde_json::from_str(r#"["a", 3]"#).unwrap();
        assert_eq!(parts, vec![Segment::key("a"), Segment::Index(3)]);
    }
}
