//! Retrieval of documents that live outside the registry
//!
//! A `$ref` naming an unknown base URI is handed to a [`Retrieve`]
//! implementation. [`SchemeRetriever`] dispatches on the URI scheme to
//! one handler per scheme, with [`ALL_URLS`] as the catch-all.

use crate::loader::{parse_document, LoadError};
use hashbrown::HashMap;
use schemapath_types::Node;
use std::fmt;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

/// Handler key matching any scheme without a dedicated handler.
pub const ALL_URLS: &str = "<all_urls>";

/// Errors raised while fetching or parsing an external document
#[derive(Error, Debug)]
pub enum RetrieveError {
    #[error("no handler for scheme '{scheme}' ({uri})")]
    UnsupportedScheme { scheme: String, uri: String },

    #[error("invalid URI '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("request for {uri} failed: {reason}")]
    Http { uri: String, reason: String },

    #[error("{0}")]
    Other(String),
}

/// Source of documents for base URIs the registry does not know yet.
///
/// Implementations may block on I/O; the engine calls them at most once
/// per distinct base URI.
pub trait Retrieve: Send + Sync {
    fn retrieve(&self, uri: &str) -> Result<Node, RetrieveError>;
}

impl<F> Retrieve for F
where
    F: Fn(&str) -> Result<Node, RetrieveError> + Send + Sync,
{
    fn retrieve(&self, uri: &str) -> Result<Node, RetrieveError> {
        self(uri)
    }
}

/// Scheme of `uri`, or the empty string for scheme-less identifiers
fn scheme_of(uri: &str) -> String {
    Url::parse(uri)
        .map(|url| url.scheme().to_string())
        .unwrap_or_default()
}

/// Dispatches retrieval by URI scheme
#[derive(Clone, Default)]
pub struct SchemeRetriever {
    handlers: HashMap<String, Arc<dyn Retrieve>>,
}

impl SchemeRetriever {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `scheme` (or [`ALL_URLS`]).
    pub fn with_handler(mut self, scheme: impl Into<String>, handler: impl Retrieve + 'static) -> Self {
        self.insert(scheme, Arc::new(handler));
        self
    }

    pub fn insert(&mut self, scheme: impl Into<String>, handler: Arc<dyn Retrieve>) {
        self.handlers.insert(scheme.into(), handler);
    }

    /// Registered schemes, sorted
    pub fn schemes(&self) -> Vec<&str> {
        let mut schemes: Vec<&str> = self.handlers.keys().map(|s| s.as_str()).collect();
        schemes.sort();
        schemes
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Retrieve for SchemeRetriever {
    fn retrieve(&self, uri: &str) -> Result<Node, RetrieveError> {
        let scheme = scheme_of(uri);
        let handler = self
            .handlers
            .get(&scheme)
            .or_else(|| self.handlers.get(ALL_URLS))
            .ok_or_else(|| RetrieveError::UnsupportedScheme {
                scheme: scheme.clone(),
                uri: uri.to_string(),
            })?;
        tracing::debug!(uri, scheme = %scheme, "dispatching retrieval");
        handler.retrieve(uri)
    }
}

impl fmt::Debug for SchemeRetriever {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemeRetriever")
            .field("schemes", &self.schemes())
            .finish()
    }
}

/// Reads `file://` URIs from the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FileHandler;

impl FileHandler {
    /// Parse a document from any reader.
    pub fn load(&self, mut reader: impl Read) -> Result<Node, RetrieveError> {
        let mut text = String::new();
        reader
            .read_to_string(&mut text)
            .map_err(|source| RetrieveError::Io {
                path: PathBuf::from("<reader>"),
                source,
            })?;
        Ok(parse_document(&text)?)
    }

    pub fn load_path(&self, path: &std::path::Path) -> Result<Node, RetrieveError> {
        let text = std::fs::read_to_string(path).map_err(|source| RetrieveError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(parse_document(&text)?)
    }
}

impl Retrieve for FileHandler {
    fn retrieve(&self, uri: &str) -> Result<Node, RetrieveError> {
        let url = Url::parse(uri).map_err(|e| RetrieveError::InvalidUri {
            uri: uri.to_string(),
            reason: e.to_string(),
        })?;
        if url.scheme() != "file" {
            return Err(RetrieveError::UnsupportedScheme {
                scheme: url.scheme().to_string(),
                uri: uri.to_string(),
            });
        }
        let path = url.to_file_path().map_err(|_| RetrieveError::InvalidUri {
            uri: uri.to_string(),
            reason: "not a local file path".to_string(),
        })?;
        self.load_path(&path)
    }
}

/// Fetches `http`/`https` URIs with a blocking client
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct UrlHandler {
    client: reqwest::blocking::Client,
}

#[cfg(feature = "http")]
impl UrlHandler {
    pub fn new(timeout: std::time::Duration) -> Result<Self, RetrieveError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RetrieveError::Http {
                uri: String::new(),
                reason: e.to_string(),
            })?;
        Ok(UrlHandler { client })
    }
}

#[cfg(feature = "http")]
impl Retrieve for UrlHandler {
    fn retrieve(&self, uri: &str) -> Result<Node, RetrieveError> {
        let http_err = |e: reqwest::Error| RetrieveError::Http {
            uri: uri.to_string(),
            reason: e.to_string(),
        };
        let text = self
            .client
            .get(uri)
            .send()
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.text())
            .map_err(http_err)?;
        Ok(parse_document(&text)?)
    }
}

/// Handler for every scheme the stock set understands, registered as the
/// [`ALL_URLS`] catch-all by [`default_retriever`].
#[derive(Debug, Clone, Default)]
pub struct CombinedHandler {
    file: FileHandler,
    #[cfg(feature = "http")]
    http: Option<UrlHandler>,
}

impl Retrieve for CombinedHandler {
    fn retrieve(&self, uri: &str) -> Result<Node, RetrieveError> {
        let scheme = scheme_of(uri);
        match scheme.as_str() {
            "file" => self.file.retrieve(uri),
            #[cfg(feature = "http")]
            "http" | "https" => match &self.http {
                Some(handler) => handler.retrieve(uri),
                None => Err(RetrieveError::UnsupportedScheme {
                    scheme,
                    uri: uri.to_string(),
                }),
            },
            _ => Err(RetrieveError::UnsupportedScheme {
                scheme,
                uri: uri.to_string(),
            }),
        }
    }
}

/// The stock handler set: `file`, plus `http`/`https` when the `http`
/// feature is enabled, and [`CombinedHandler`] under [`ALL_URLS`].
pub fn default_retriever(http_timeout: std::time::Duration) -> SchemeRetriever {
    #[cfg(feature = "http")]
    let http = UrlHandler::new(http_timeout)
        .map_err(|err| tracing::warn!("HTTP retrieval disabled: {}", err))
        .ok();
    #[cfg(not(feature = "http"))]
    let _ = http_timeout;

    let retriever = SchemeRetriever::new().with_handler("file", FileHandler);

    #[cfg(feature = "http")]
    let retriever = match &http {
        Some(handler) => retriever
            .with_handler("http", handler.clone())
            .with_handler("https", handler.clone()),
        None => retriever,
    };

    let combined = CombinedHandler {
        file: FileHandler,
        #[cfg(feature = "http")]
        http,
    };
    retriever.with_handler(ALL_URLS, combined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_dispatch_by_scheme() {
        let retriever = SchemeRetriever::new()
            .with_handler("x", |_: &str| Ok::<_, RetrieveError>(Node::from("x")))
            .with_handler("y", |_: &str| Ok::<_, RetrieveError>(Node::from("y")));

        assert_eq!(retriever.retrieve("x://a").unwrap(), Node::from("x"));
        assert_eq!(retriever.retrieve("y://b").unwrap(), Node::from("y"));
        assert!(matches!(
            retriever.retrieve("z://c"),
            Err(RetrieveError::UnsupportedScheme { .. })
        ));
    }

    #[test]
    fn test_catch_all_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let retriever = SchemeRetriever::new().with_handler(ALL_URLS, move |_: &str| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, RetrieveError>(Node::Null)
        });

        retriever.retrieve("anything://here").unwrap();
        retriever.retrieve("relative.json").unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_file_handler_reads_uri() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("defs.json");
        std::fs::write(&path, r#"{"Info": {"type": "object"}}"#).unwrap();
        let uri = Url::from_file_path(&path).unwrap().to_string();

        let node = FileHandler.retrieve(&uri).unwrap();
        assert_eq!(node, json!({"Info": {"type": "object"}}));
    }

    #[test]
    fn test_file_handler_missing_file() {
        let err = FileHandler.retrieve("file:///definitely/not/here.json").unwrap_err();
        assert!(matches!(err, RetrieveError::Io { .. }));
    }

    #[test]
    fn test_file_handler_rejects_other_schemes() {
        let err = FileHandler.retrieve("https://example.com/a.json").unwrap_err();
        assert!(matches!(err, RetrieveError::UnsupportedScheme { .. }));
    }

    #[test]
    fn test_default_retriever_schemes() {
        let retriever = default_retriever(std::time::Duration::from_secs(10));
        assert!(retriever.schemes().contains(&"file"));
        assert!(retriever.schemes().contains(&ALL_URLS));
    }

    #[test]
    fn test_default_catch_all_rejects_unknown_scheme() {
        let retriever = default_retriever(std::time::Duration::from_secs(10));
        let err = retriever.retrieve("gopher://example.com/defs").unwrap_err();
        assert!(matches!(err, RetrieveError::UnsupportedScheme { ref scheme, .. } if scheme == "gopher"));
    }

    #[test]
    fn test_combined_handler_reads_files() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("defs.json");
        std::fs::write(&file, r#"{"A": 1}"#).unwrap();
        let uri = Url::from_file_path(&file).unwrap().to_string();

        let node = CombinedHandler::default().retrieve(&uri).unwrap();
        assert_eq!(node, json!({"A": 1}));
    }
}
