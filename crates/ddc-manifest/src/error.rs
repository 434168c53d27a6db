//! Errors raised while loading, addressing, or canonicalizing a manifest.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while working with a manifest document.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input is not a well-formed structured document.
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    /// The document lacks the structure needed to locate a field.
    #[error("missing field `{0}`")]
    MissingField(String),

    /// The document holds a value that has no canonical form.
    #[error("canonicalization failed: {0}")]
    Canonicalization(String),
}

impl ManifestError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
