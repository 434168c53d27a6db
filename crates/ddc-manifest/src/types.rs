//! Typed views of the well-known manifest sections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Hash algorithm recorded in the `integrity` section.
pub const INTEGRITY_ALGORITHM: &str = "sha256";

/// Signature value left in unsigned templates.
pub const PLACEHOLDER_SIGNATURE: &str = "${MINISIGN_SIG}";

/// A produced output described by the manifest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Artifact {
    /// Path of the artifact relative to the release root (e.g., "dist/app.tar.gz")
    pub path: String,
    /// Content hash, prefixed with the algorithm (e.g., "sha256:e3b0...")
    pub hash: String,
    /// Size in bytes
    pub size: u64,
}

/// The `integrity` section: the Merkle root over the tracked file set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Integrity {
    pub algorithm: String,
    /// 64-character lowercase hex digest
    pub merkle_root: String,
}

/// The `signing` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Signing {
    /// Signature scheme (e.g., "minisign" or "ed25519")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,

    /// Identifier of the key that produced the signature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<SignatureBlock>,
}

/// The detached signature and the moment it was produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignatureBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl SignatureBlock {
    /// True when the value is missing, blank, or the template placeholder.
    pub fn is_unsigned(&self) -> bool {
        match self.value.as_deref() {
            None => true,
            Some(v) => {
                let v = v.trim();
                v.is_empty() || v == PLACEHOLDER_SIGNATURE
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_block_unsigned_states() {
        let mut block = SignatureBlock {
            value: None,
            timestamp: None,
        };
        assert!(block.is_unsigned());

        block.value = Some("   ".to_string());
        assert!(block.is_unsigned());

        block.value = Some(PLACEHOLDER_SIGNATURE.to_string());
        assert!(block.is_unsigned());

        block.value = Some(format!(" {PLACEHOLDER_SIGNATURE} \n"));
        assert!(block.is_unsigned());

        block.value = Some("ed25519:abcd".to_string());
        assert!(!block.is_unsigned());
    }

    #[test]
    fn test_signing_deserializes_partial_section() {
        let yaml = "scheme: minisign\nsignature:\n  timestamp: 2025-01-02T03:04:05Z\n";
        let signing: Signing = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(signing.scheme.as_deref(), Some("minisign"));
        assert!(signing.key_id.is_none());
        let block = signing.signature.unwrap();
        assert!(block.value.is_none());
        assert!(block.timestamp.is_some());
    }
}
