//! Where the signing and integrity fields live inside a manifest.

use crate::document::Manifest;
use crate::error::ManifestError;
use crate::path::FieldPath;

/// Field locations used by signing and verification.
///
/// All paths are relative to `root`. With no root the whole manifest is the
/// signed document; with a root (e.g. `doc_index`) only that section is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningLayout {
    pub root: Option<FieldPath>,
    pub value: FieldPath,
    pub timestamp: FieldPath,
    pub scheme: FieldPath,
    pub key_id: FieldPath,
    pub merkle_root: FieldPath,
    pub integrity_algorithm: FieldPath,
}

impl Default for SigningLayout {
    fn default() -> Self {
        Self {
            root: None,
            value: fixed(&["signing", "signature", "value"]),
            timestamp: fixed(&["signing", "signature", "timestamp"]),
            scheme: fixed(&["signing", "scheme"]),
            key_id: fixed(&["signing", "key_id"]),
            merkle_root: fixed(&["integrity", "merkle_root"]),
            integrity_algorithm: fixed(&["integrity", "algorithm"]),
        }
    }
}

impl SigningLayout {
    /// The default layout nested under `root`.
    pub fn rooted(root: FieldPath) -> Self {
        Self {
            root: Some(root),
            ..Self::default()
        }
    }

    /// Resolve a layout-relative path against the manifest root.
    pub fn absolute(&self, relative: &FieldPath) -> FieldPath {
        match &self.root {
            Some(root) => root.join(relative),
            None => relative.clone(),
        }
    }

    /// The document covered by the signature.
    pub fn signed_document(&self, manifest: &Manifest) -> Result<Manifest, ManifestError> {
        match &self.root {
            Some(root) => manifest.subdocument(root),
            None => Ok(manifest.clone()),
        }
    }
}

fn fixed(segments: &[&str]) -> FieldPath {
    FieldPath::from_static(segments)
}
