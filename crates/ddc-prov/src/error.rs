//! The error taxonomy shared by signing, verification and integrity checks.

use ddc_hash::InventoryError;
use ddc_manifest::ManifestError;
use ddc_schema::Violation;
use thiserror::Error;

use crate::primitive::PrimitiveError;

/// Errors surfaced by provenance operations.
///
/// Every kind is specific so callers can decide which ones are fatal.
#[derive(Debug, Error)]
pub enum ProvError {
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    #[error("missing field: {0}")]
    MissingField(String),

    #[error("unreadable file {path}: {reason}")]
    UnreadableFile { path: String, reason: String },

    /// The signing key could not be loaded or used, or the signing tool
    /// is missing or timed out.
    #[error("signing key unavailable: {0}")]
    KeyUnavailable(String),

    #[error("canonicalization failed: {0}")]
    Canonicalization(String),

    #[error("no signature present")]
    NoSignature,

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("malformed key: {0}")]
    KeyFormat(String),

    #[error("{} schema violation(s): {}", .0.len(), join_violations(.0))]
    SchemaViolation(Vec<Violation>),

    /// Inventory configuration or snapshot problems that are not file reads.
    #[error("integrity error: {0}")]
    Integrity(String),
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<ManifestError> for ProvError {
    fn from(err: ManifestError) -> Self {
        match err {
            ManifestError::Io { path, source } => ProvError::UnreadableFile {
                path: path.display().to_string(),
                reason: source.to_string(),
            },
            ManifestError::MalformedDocument(msg) => ProvError::MalformedDocument(msg),
            ManifestError::MissingField(msg) => ProvError::MissingField(msg),
            ManifestError::Canonicalization(msg) => ProvError::Canonicalization(msg),
        }
    }
}

impl From<InventoryError> for ProvError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::UnreadableFile { path, source } => ProvError::UnreadableFile {
                path,
                reason: source.to_string(),
            },
            InventoryError::Io { path, source } => ProvError::UnreadableFile {
                path: path.display().to_string(),
                reason: source.to_string(),
            },
            other => ProvError::Integrity(other.to_string()),
        }
    }
}

impl From<PrimitiveError> for ProvError {
    fn from(err: PrimitiveError) -> Self {
        match err {
            PrimitiveError::KeyFormat(msg) => ProvError::KeyFormat(msg),
            PrimitiveError::MalformedSignature(msg) => ProvError::InvalidSignature(msg),
            other => ProvError::KeyUnavailable(other.to_string()),
        }
    }
}
