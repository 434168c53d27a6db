use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while building or persisting a hash inventory.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// A file inside the integrity scope could not be opened or read.
    #[error("unreadable file {path}: {source}")]
    UnreadableFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid scope pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),
}
