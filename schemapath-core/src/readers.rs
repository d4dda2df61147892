//! Reading root documents
//!
//! A reader yields the document together with the base URI it should be
//! registered under.

use crate::retriever::{FileHandler, RetrieveError};
use schemapath_types::Node;
use std::io::Read;
use std::path::{Path, PathBuf};
use url::Url;

/// Reads a document from the filesystem, based at its `file://` URL
#[derive(Debug, Clone)]
pub struct FilePathReader {
    path: PathBuf,
}

impl FilePathReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FilePathReader { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> Result<(Node, String), RetrieveError> {
        let io_err = |source| RetrieveError::Io {
            path: self.path.clone(),
            source,
        };
        let absolute = std::fs::canonicalize(&self.path).map_err(io_err)?;
        if !absolute.is_file() {
            return Err(io_err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "not a regular file",
            )));
        }

        let uri = Url::from_file_path(&absolute)
            .map_err(|_| RetrieveError::InvalidUri {
                uri: absolute.display().to_string(),
                reason: "cannot express path as a file URL".to_string(),
            })?
            .to_string();
        let node = FileHandler.load_path(&absolute)?;
        Ok((node, uri))
    }
}

/// Reads a document from any byte stream; the base URI is empty
#[derive(Debug)]
pub struct FileReader<R> {
    reader: R,
}

impl<R: Read> FileReader<R> {
    pub fn new(reader: R) -> Self {
        FileReader { reader }
    }

    pub fn read(self) -> Result<(Node, String), RetrieveError> {
        let node = FileHandler.load(self.reader)?;
        Ok((node, String::new()))
    }
}
