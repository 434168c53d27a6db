//! The opaque sign/verify capability the signer and verifier are built on.

use std::time::Duration;
use thiserror::Error;

/// Failures reported by a signature primitive.
#[derive(Debug, Error)]
pub enum PrimitiveError {
    /// The key could not be loaded, decrypted or used.
    #[error("key unavailable: {0}")]
    KeyUnavailable(String),

    /// Key material is present but not in a recognised format.
    #[error("malformed key: {0}")]
    KeyFormat(String),

    /// The signature text cannot be parsed by this primitive.
    #[error("malformed signature: {0}")]
    MalformedSignature(String),

    #[error("signing tool did not finish within {0:?}")]
    Timeout(Duration),

    #[error("signing tool failed: {0}")]
    Failed(String),
}

/// A signature scheme with explicit key handles.
///
/// Implementations never consult ambient key state: every call receives the
/// key it should use.
pub trait SignaturePrimitive {
    type SecretKey;
    type PublicKey;

    /// Value written to the manifest's `scheme` field.
    fn scheme(&self) -> &str;

    /// Identifier recorded alongside a signature, when the scheme has one.
    fn key_id(&self, key: &Self::SecretKey) -> Option<String>;

    /// Identifier of a public key, compared against the declared `key_id`.
    fn public_key_id(&self, key: &Self::PublicKey) -> Option<String>;

    /// Sign `payload`, returning the signature as text.
    fn sign(&self, payload: &[u8], key: &Self::SecretKey) -> Result<String, PrimitiveError>;

    /// Check `signature` over `payload`.
    ///
    /// `Ok(false)` means the signature is well formed but does not match.
    fn verify(
        &self,
        payload: &[u8],
        signature: &str,
        key: &Self::PublicKey,
    ) -> Result<bool, PrimitiveError>;
}
