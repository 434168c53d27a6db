//! Errors raised while loading or compiling a structural contract.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to read schema {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("schema is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// The schema uses a construct outside the supported subset.
    #[error("unsupported schema construct at {at}: {detail}")]
    Unsupported { at: String, detail: String },

    #[error("invalid pattern at {at}: {source}")]
    InvalidPattern {
        at: String,
        #[source]
        source: regex::Error,
    },
}
