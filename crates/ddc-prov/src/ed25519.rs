//! In-process Ed25519 signatures.
//!
//! Signatures are written as `ed25519:<128 hex>`. A key is identified by the
//! first eight bytes of the SHA-256 of its public key, in uppercase hex.

use crate::primitive::{PrimitiveError, SignaturePrimitive};
use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

const SIGNATURE_PREFIX: &str = "ed25519:";

/// Compute the key identifier for a public key.
pub fn key_id_for(key: &VerifyingKey) -> String {
    let digest = Sha256::digest(key.as_bytes());
    hex::encode_upper(&digest[..8])
}

/// On-disk key pair: `{key_id, private_key, public_key}` with hex-encoded keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyFile {
    pub key_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    pub public_key: String,
}

/// An Ed25519 signing key.
#[derive(Clone)]
pub struct Ed25519SecretKey {
    signing: SigningKey,
}

impl std::fmt::Debug for Ed25519SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ed25519SecretKey")
            .field("key_id", &self.key_id())
            .finish_non_exhaustive()
    }
}

impl Ed25519SecretKey {
    /// Generate a new key from the operating system's random source.
    pub fn generate() -> Result<Self, PrimitiveError> {
        let mut bytes = [0u8; 32];
        getrandom::fill(&mut bytes)
            .map_err(|e| PrimitiveError::KeyUnavailable(format!("no randomness available: {e}")))?;
        Ok(Self::from_bytes(&bytes))
    }

    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        Self {
            signing: SigningKey::from_bytes(bytes),
        }
    }

    pub fn from_hex(text: &str) -> Result<Self, PrimitiveError> {
        Ok(Self::from_bytes(&decode_32(text.trim(), "private key")?))
    }

    pub fn public_key(&self) -> Ed25519PublicKey {
        Ed25519PublicKey {
            verifying: self.signing.verifying_key(),
        }
    }

    pub fn key_id(&self) -> String {
        key_id_for(&self.signing.verifying_key())
    }

    pub fn to_key_file(&self) -> KeyFile {
        KeyFile {
            key_id: self.key_id(),
            private_key: Some(hex::encode(self.signing.to_bytes())),
            public_key: hex::encode(self.signing.verifying_key().to_bytes()),
        }
    }

    /// Read a key-pair file. The stored public key must belong to the private key.
    ///
    /// Any failure to produce a usable signing key is `KeyUnavailable`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PrimitiveError> {
        let path = path.as_ref();
        let unavailable = |detail: String| {
            PrimitiveError::KeyUnavailable(format!("{}: {detail}", path.display()))
        };

        let text = fs::read_to_string(path).map_err(|e| unavailable(format!("cannot read: {e}")))?;
        let file: KeyFile = serde_json::from_str(&text)
            .map_err(|e| unavailable(format!("not a key file: {e}")))?;
        let private = file
            .private_key
            .as_deref()
            .ok_or_else(|| unavailable("holds no private key".to_string()))?;

        let key = Self::from_hex(private).map_err(|e| unavailable(e.to_string()))?;
        let public = hex::encode(key.signing.verifying_key().to_bytes());
        if !public.eq_ignore_ascii_case(file.public_key.trim()) {
            return Err(unavailable(
                "public key does not match private key".to_string(),
            ));
        }
        Ok(key)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), PrimitiveError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(&self.to_key_file())
            .map_err(|e| PrimitiveError::Failed(e.to_string()))?;
        fs::write(path, json).map_err(|e| {
            PrimitiveError::KeyUnavailable(format!("cannot write {}: {e}", path.display()))
        })
    }
}

/// An Ed25519 verifying key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ed25519PublicKey {
    verifying: VerifyingKey,
}

impl Ed25519PublicKey {
    /// Parse a public key from raw hex or from key-file JSON.
    pub fn parse(text: &str) -> Result<Self, PrimitiveError> {
        let text = text.trim();
        let hex_key = if text.starts_with('{') {
            let file: KeyFile = serde_json::from_str(text)
                .map_err(|e| PrimitiveError::KeyFormat(format!("not a key file: {e}")))?;
            file.public_key
        } else {
            text.to_string()
        };

        let bytes = decode_32(hex_key.trim(), "public key")?;
        let verifying = VerifyingKey::from_bytes(&bytes)
            .map_err(|e| PrimitiveError::KeyFormat(format!("invalid public key: {e}")))?;
        Ok(Self { verifying })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PrimitiveError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            PrimitiveError::KeyFormat(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::parse(&text)
    }

    pub fn key_id(&self) -> String {
        key_id_for(&self.verifying)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.verifying.to_bytes())
    }
}

fn decode_32(text: &str, what: &str) -> Result<[u8; 32], PrimitiveError> {
    let bytes =
        hex::decode(text).map_err(|e| PrimitiveError::KeyFormat(format!("{what} is not hex: {e}")))?;
    bytes.try_into().map_err(|b: Vec<u8>| {
        PrimitiveError::KeyFormat(format!("{what} must be 32 bytes, got {}", b.len()))
    })
}

/// Ed25519 through `ed25519-dalek`. Signing is deterministic.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Primitive;

impl SignaturePrimitive for Ed25519Primitive {
    type SecretKey = Ed25519SecretKey;
    type PublicKey = Ed25519PublicKey;

    fn scheme(&self) -> &str {
        "ed25519"
    }

    fn key_id(&self, key: &Ed25519SecretKey) -> Option<String> {
        Some(key.key_id())
    }

    fn public_key_id(&self, key: &Ed25519PublicKey) -> Option<String> {
        Some(key.key_id())
    }

    fn sign(&self, payload: &[u8], key: &Ed25519SecretKey) -> Result<String, PrimitiveError> {
        let signature = key.signing.sign(payload);
        Ok(format!("{SIGNATURE_PREFIX}{}", hex::encode(signature.to_bytes())))
    }

    fn verify(
        &self,
        payload: &[u8],
        signature: &str,
        key: &Ed25519PublicKey,
    ) -> Result<bool, PrimitiveError> {
        let sig_hex = signature.trim().strip_prefix(SIGNATURE_PREFIX).ok_or_else(|| {
            PrimitiveError::MalformedSignature(format!("expected `{SIGNATURE_PREFIX}` prefix"))
        })?;

        let sig_bytes = hex::decode(sig_hex)
            .map_err(|e| PrimitiveError::MalformedSignature(format!("not hex: {e}")))?;
        let sig_array: [u8; 64] = sig_bytes.try_into().map_err(|b: Vec<u8>| {
            PrimitiveError::MalformedSignature(format!("expected 64 bytes, got {}", b.len()))
        })?;

        let signature = ed25519_dalek::Signature::from_bytes(&sig_array);
        Ok(key.verifying.verify(payload, &signature).is_ok())
    }
}
