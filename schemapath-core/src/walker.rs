//! Walking a path through a document
//!
//! Every node is dereferenced before the next segment is applied, so a
//! `$ref` anywhere along the path (the root included) is transparent.

use crate::deref::Dereferencer;
use crate::error::ResolveError;
use crate::resolver::{Resolved, Resolver};
use schemapath_types::{Node, Segment};

/// Apply one segment to a concrete (already dereferenced) node.
///
/// Arrays also accept keys that spell a decimal index, so that paths
/// parsed from text can address array elements.
pub fn step(node: &Node, segment: &Segment) -> Result<Node, ResolveError> {
    match (node, segment) {
        (Node::Object(members), Segment::Key(key)) => members
            .get(key)
            .cloned()
            .ok_or_else(|| ResolveError::KeyNotFound(key.clone())),
        (Node::Array(items), Segment::Index(index)) => element(items, *index),
        (Node::Array(items), Segment::Key(key)) => match parse_index(key) {
            Some(index) => element(items, index),
            None => Err(ResolveError::not_traversable(node.kind(), segment.clone())),
        },
        _ => Err(ResolveError::not_traversable(node.kind(), segment.clone())),
    }
}

/// Apply one decoded JSON Pointer token.
pub(crate) fn step_token(node: &Node, token: &str) -> Result<Node, ResolveError> {
    match node {
        Node::Object(members) => members
            .get(token)
            .cloned()
            .ok_or_else(|| ResolveError::KeyNotFound(token.to_string())),
        Node::Array(items) => match parse_index(token) {
            Some(index) => element(items, index),
            None => Err(ResolveError::not_traversable(node.kind(), token)),
        },
        _ => Err(ResolveError::not_traversable(node.kind(), token)),
    }
}

fn element(items: &[Node], index: usize) -> Result<Node, ResolveError> {
    items
        .get(index)
        .cloned()
        .ok_or(ResolveError::IndexOutOfRange(index))
}

/// Decimal array index: digits only, no sign, no leading zeros.
fn parse_index(token: &str) -> Option<usize> {
    let valid = !token.is_empty()
        && token.bytes().all(|b| b.is_ascii_digit())
        && (token == "0" || !token.starts_with('0'));
    if valid {
        token.parse().ok()
    } else {
        None
    }
}

/// Walk `parts` starting from an already dereferenced `start`.
///
/// `visit(i, resolved)` is called with the dereferenced node reached
/// after consuming `parts[..=i]`, for every segment but the last.
pub fn walk_from<F>(
    start: Resolved,
    parts: &[Segment],
    deref: &mut Dereferencer,
    mut visit: F,
) -> Result<Resolved, ResolveError>
where
    F: FnMut(usize, &Resolved),
{
    let mut current = start;
    for (i, segment) in parts.iter().enumerate() {
        let child = step(&current.contents, segment)?;
        current = deref.dereference(&child, &current.resolver)?;
        if i + 1 < parts.len() {
            visit(i, &current);
        }
    }
    Ok(current)
}

/// Resolve `parts` from `root` without any caching.
pub fn resolve_path(
    root: &Node,
    resolver: &Resolver,
    parts: &[Segment],
    max_depth: usize,
) -> Result<Resolved, ResolveError> {
    let mut deref = Dereferencer::new(resolver.registry().clone(), max_depth);
    let start = deref.dereference(root, resolver)?;
    walk_from(start, parts, &mut deref, |_, _| {})
}
