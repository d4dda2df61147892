//! Reference URIs and JSON Pointer fragments

use crate::error::ResolveError;
use std::fmt;
use url::Url;

/// A reference split into the resource it names and the pointer into it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub base: String,
    pub fragment: String,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.base, self.fragment)
    }
}

/// Canonical form of a base URI: absolute URLs are normalized and lose
/// their fragment, anything else is kept verbatim.
pub fn normalize_base(uri: &str) -> String {
    match Url::parse(uri) {
        Ok(mut url) => {
            url.set_fragment(None);
            url.to_string()
        }
        Err(_) => uri.to_string(),
    }
}

/// Split `reference` into target base and fragment, interpreting it
/// relative to `current_base`.
pub fn split_reference(current_base: &str, reference: &str) -> Result<Target, ResolveError> {
    let (base_part, fragment) = reference.split_once('#').unwrap_or((reference, ""));
    let base = if base_part.is_empty() {
        current_base.to_string()
    } else {
        resolve_base(current_base, base_part)?
    };
    Ok(Target {
        base,
        fragment: fragment.to_string(),
    })
}

fn resolve_base(current_base: &str, base_part: &str) -> Result<String, ResolveError> {
    match Url::parse(base_part) {
        Ok(url) => Ok(url.to_string()),
        Err(url::ParseError::RelativeUrlWithoutBase) => match Url::parse(current_base) {
            Ok(base) => base
                .join(base_part)
                .map(|url| url.to_string())
                .map_err(|_| ResolveError::InvalidReference(base_part.to_string())),
            // Nothing absolute to resolve against: the text is the identifier.
            Err(_) => Ok(base_part.to_string()),
        },
        Err(_) => Err(ResolveError::InvalidReference(base_part.to_string())),
    }
}

/// Decode a fragment into JSON Pointer reference tokens.
///
/// The empty fragment addresses the resource root. Plain-name anchors
/// are not supported.
pub fn fragment_tokens(fragment: &str) -> Result<Vec<String>, ResolveError> {
    if fragment.is_empty() {
        return Ok(Vec::new());
    }
    let invalid = || ResolveError::InvalidReference(format!("#{fragment}"));
    let decoded = urlencoding::decode(fragment).map_err(|_| invalid())?;
    let pointer = decoded.strip_prefix('/').ok_or_else(invalid)?;
    Ok(pointer.split('/').map(unescape_token).collect())
}

fn unescape_token(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}
