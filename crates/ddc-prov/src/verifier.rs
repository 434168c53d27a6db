//! Manifest signature verification.
//!
//! Verification distinguishes three outcomes that must never be conflated:
//! no signature at all, a signature that is present but not (or not yet)
//! proven, and a signature that is cryptographically valid. A signature
//! checked without a public key is only ever reported as present.

use crate::error::ProvError;
use crate::primitive::{PrimitiveError, SignaturePrimitive};
use chrono::{DateTime, Utc};
use ddc_manifest::{
    canonical_payload, render_payload, CanonicalMode, Manifest, SigningLayout, Value,
    PLACEHOLDER_SIGNATURE,
};
use sha2::{Digest, Sha256};
use std::fmt;
use tracing::{debug, warn};

/// Why a present signature was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidReason {
    /// Well formed but does not match the canonical payload.
    Mismatch,
    /// Not a string, or not parseable by the primitive.
    Malformed(String),
    /// The manifest declares a different key than the one supplied.
    KeyMismatch { declared: String, supplied: String },
    /// Matches only the document-order rendering, which is never signed.
    DocumentOrder,
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidReason::Mismatch => write!(f, "signature does not match canonical payload"),
            InvalidReason::Malformed(detail) => write!(f, "malformed signature: {detail}"),
            InvalidReason::KeyMismatch { declared, supplied } => write!(
                f,
                "manifest declares key {declared} but key {supplied} was supplied"
            ),
            InvalidReason::DocumentOrder => write!(
                f,
                "signature covers the document-order payload, not the canonical payload"
            ),
        }
    }
}

/// State of the signature field after verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureStatus {
    /// Missing, empty or whitespace.
    Absent,
    /// The unsigned-template placeholder.
    Placeholder,
    /// A value exists but no key was supplied to check it.
    Present,
    Invalid(InvalidReason),
    Valid,
}

impl SignatureStatus {
    /// True for the "no signature" state.
    pub fn is_unsigned(&self) -> bool {
        matches!(self, SignatureStatus::Absent | SignatureStatus::Placeholder)
    }
}

impl fmt::Display for SignatureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignatureStatus::Absent => write!(f, "no signature present"),
            SignatureStatus::Placeholder => write!(f, "signature is the unsigned placeholder"),
            SignatureStatus::Present => {
                write!(f, "signature present (not verified without a public key)")
            }
            SignatureStatus::Invalid(reason) => write!(f, "invalid: {reason}"),
            SignatureStatus::Valid => write!(f, "signature valid"),
        }
    }
}

/// The result of checking one manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationReport {
    pub status: SignatureStatus,
    /// Hex SHA-256 of the canonical payload
    pub payload_sha256: String,
    /// Key id declared in the manifest
    pub key_id: Option<String>,
    /// Signing timestamp declared in the manifest, when it parses
    pub signed_at: Option<DateTime<Utc>>,
}

impl VerificationReport {
    pub fn is_valid(&self) -> bool {
        self.status == SignatureStatus::Valid
    }

    /// Collapse the report into success or a specific error.
    ///
    /// `accept_unverified` lets a present-but-unchecked signature pass, for
    /// runs where no public key is available.
    pub fn into_result(self, accept_unverified: bool) -> Result<Self, ProvError> {
        match &self.status {
            SignatureStatus::Valid => Ok(self),
            SignatureStatus::Present if accept_unverified => Ok(self),
            SignatureStatus::Present => Err(ProvError::InvalidSignature(
                "signature present but no public key was supplied to verify it".to_string(),
            )),
            SignatureStatus::Absent | SignatureStatus::Placeholder => Err(ProvError::NoSignature),
            SignatureStatus::Invalid(reason) => Err(ProvError::InvalidSignature(reason.to_string())),
        }
    }

    /// Process exit code: 0 on success, 1 for an invalid or unproven
    /// signature, 2 when no signature is present.
    pub fn exit_code(&self, accept_unverified: bool) -> i32 {
        match self.clone().into_result(accept_unverified) {
            Ok(_) => 0,
            Err(ProvError::NoSignature) => 2,
            Err(_) => 1,
        }
    }
}

/// Verify the signature carried by `manifest`.
///
/// Without `public_key` the best possible outcome is
/// [`SignatureStatus::Present`]. Errors are reserved for documents that
/// cannot be canonicalized and keys that cannot be used.
pub fn verify_manifest<P: SignaturePrimitive>(
    manifest: &Manifest,
    primitive: &P,
    public_key: Option<&P::PublicKey>,
    layout: &SigningLayout,
) -> Result<VerificationReport, ProvError> {
    let doc = layout.signed_document(manifest)?;
    let payload = canonical_payload(&doc, &layout.value)?;
    let payload_sha256 = hex::encode(Sha256::digest(&payload));

    let key_id = doc
        .get(&layout.key_id)?
        .and_then(Value::as_str)
        .map(str::to_string);
    let signed_at = doc
        .get(&layout.timestamp)?
        .and_then(Value::as_str)
        .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
        .map(|ts| ts.with_timezone(&Utc));

    let status = match doc.get(&layout.value)? {
        None | Some(Value::Null) => SignatureStatus::Absent,
        Some(Value::String(s)) if s.trim().is_empty() => SignatureStatus::Absent,
        Some(Value::String(s)) if s.trim() == PLACEHOLDER_SIGNATURE => SignatureStatus::Placeholder,
        Some(Value::String(signature)) => match public_key {
            None => SignatureStatus::Present,
            Some(key) => check_signature(
                &doc,
                primitive,
                key,
                signature,
                &payload,
                key_id.as_deref(),
                layout,
            )?,
        },
        Some(_) => SignatureStatus::Invalid(InvalidReason::Malformed(
            "signature value is not a string".to_string(),
        )),
    };

    match &status {
        SignatureStatus::Invalid(reason) => warn!(%reason, "signature rejected"),
        other => debug!(status = %other, "signature checked"),
    }

    Ok(VerificationReport {
        status,
        payload_sha256,
        key_id,
        signed_at,
    })
}

fn check_signature<P: SignaturePrimitive>(
    doc: &Manifest,
    primitive: &P,
    key: &P::PublicKey,
    signature: &str,
    payload: &[u8],
    declared: Option<&str>,
    layout: &SigningLayout,
) -> Result<SignatureStatus, ProvError> {
    if let (Some(declared), Some(supplied)) = (declared, primitive.public_key_id(key)) {
        if !declared.eq_ignore_ascii_case(&supplied) {
            return Ok(SignatureStatus::Invalid(InvalidReason::KeyMismatch {
                declared: declared.to_string(),
                supplied,
            }));
        }
    }

    match primitive.verify(payload, signature, key) {
        Ok(true) => return Ok(SignatureStatus::Valid),
        Ok(false) => {}
        Err(PrimitiveError::MalformedSignature(detail)) => {
            return Ok(SignatureStatus::Invalid(InvalidReason::Malformed(detail)))
        }
        Err(other) => return Err(other.into()),
    }

    // Tell a signature over the wrong rendering apart from a plain mismatch.
    let document_order = render_payload(doc, &layout.value, CanonicalMode::Document)?;
    if primitive.verify(&document_order, signature, key)? {
        return Ok(SignatureStatus::Invalid(InvalidReason::DocumentOrder));
    }
    Ok(SignatureStatus::Invalid(InvalidReason::Mismatch))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(status: SignatureStatus) -> VerificationReport {
        VerificationReport {
            status,
            payload_sha256: String::new(),
            key_id: None,
            signed_at: None,
        }
    }

    #[test]
    fn test_into_result_mapping() {
        assert!(report(SignatureStatus::Valid).into_result(false).is_ok());
        assert!(report(SignatureStatus::Present).into_result(true).is_ok());
        assert!(matches!(
            report(SignatureStatus::Present).into_result(false),
            Err(ProvError::InvalidSignature(_))
        ));
        assert!(matches!(
            report(SignatureStatus::Absent).into_result(true),
            Err(ProvError::NoSignature)
        ));
        assert!(matches!(
            report(SignatureStatus::Placeholder).into_result(true),
            Err(ProvError::NoSignature)
        ));
        assert!(matches!(
            report(SignatureStatus::Invalid(InvalidReason::Mismatch)).into_result(true),
            Err(ProvError::InvalidSignature(_))
        ));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(report(SignatureStatus::Valid).exit_code(false), 0);
        assert_eq!(report(SignatureStatus::Present).exit_code(true), 0);
        assert_eq!(report(SignatureStatus::Present).exit_code(false), 1);
        assert_eq!(
            report(SignatureStatus::Invalid(InvalidReason::DocumentOrder)).exit_code(true),
            1
        );
        assert_eq!(report(SignatureStatus::Absent).exit_code(true), 2);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(
            SignatureStatus::Invalid(InvalidReason::KeyMismatch {
                declared: "AAAA".into(),
                supplied: "BBBB".into()
            })
            .to_string(),
            "invalid: manifest declares key AAAA but key BBBB was supplied"
        );
        assert!(SignatureStatus::Placeholder.is_unsigned());
        assert!(!SignatureStatus::Present.is_unsigned());
    }
}
