//! Manifest signing.

use crate::error::ProvError;
use crate::primitive::SignaturePrimitive;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use ddc_manifest::{canonical_payload, Manifest, SigningLayout, Value};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

/// Options controlling a signing run.
#[derive(Debug, Clone, Default)]
pub struct SignOptions {
    pub layout: SigningLayout,
    /// Timestamp to record; defaults to now. Truncated to whole seconds.
    pub timestamp: Option<DateTime<Utc>>,
}

impl SignOptions {
    pub fn with_layout(layout: SigningLayout) -> Self {
        Self {
            layout,
            timestamp: None,
        }
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// What a successful signing run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignOutcome {
    pub signature: String,
    /// Hex SHA-256 of the exact bytes that were signed
    pub payload_sha256: String,
    pub signed_at: DateTime<Utc>,
}

/// Sign `manifest` in place.
///
/// Any previous signature value is discarded, the signing metadata
/// (`scheme`, `key_id`, `timestamp`) is written, and the signature is computed
/// over the canonical payload of the result. The metadata is therefore covered
/// by the signature. On error the manifest is left untouched.
pub fn sign_manifest<P: SignaturePrimitive>(
    manifest: &mut Manifest,
    primitive: &P,
    key: &P::SecretKey,
    options: &SignOptions,
) -> Result<SignOutcome, ProvError> {
    let layout = &options.layout;
    let signed_at = options.timestamp.unwrap_or_else(Utc::now).trunc_subsecs(0);

    let mut working = manifest.clone();
    let previous = working.remove(&layout.absolute(&layout.value))?;
    if previous.is_some() {
        debug!("discarded previous signature value");
    }

    working.set(
        &layout.absolute(&layout.scheme),
        Value::String(primitive.scheme().to_string()),
    )?;
    if let Some(key_id) = primitive.key_id(key) {
        working.set(&layout.absolute(&layout.key_id), Value::String(key_id))?;
    }
    working.set(
        &layout.absolute(&layout.timestamp),
        Value::String(signed_at.to_rfc3339_opts(SecondsFormat::Secs, true)),
    )?;

    let payload = canonical_payload(&layout.signed_document(&working)?, &layout.value)?;
    let payload_sha256 = hex::encode(Sha256::digest(&payload));

    let signature = primitive.sign(&payload, key).map_err(|e| match ProvError::from(e) {
        // A signing tool that rejects its input is still a key problem here.
        ProvError::InvalidSignature(msg) => ProvError::KeyUnavailable(msg),
        other => other,
    })?;

    working.set(
        &layout.absolute(&layout.value),
        Value::String(signature.clone()),
    )?;
    *manifest = working;

    info!(
        scheme = primitive.scheme(),
        payload_sha256 = %payload_sha256,
        payload_len = payload.len(),
        "manifest signed"
    );

    Ok(SignOutcome {
        signature,
        payload_sha256,
        signed_at,
    })
}
