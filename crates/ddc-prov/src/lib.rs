//! Deterministic manifest signing and verification.
//!
//! A manifest is signed over its canonical payload: the document with the
//! signature value removed, rendered as sorted-key compact JSON. The
//! [`SignaturePrimitive`] trait keeps the scheme pluggable; an in-process
//! Ed25519 backend and an external `minisign` backend are provided.
//!
//! # Example
//!
//! ```
//! use ddc_manifest::{Manifest, SigningLayout};
//! use ddc_prov::{
//!     sign_manifest, verify_manifest, Ed25519Primitive, Ed25519SecretKey, SignOptions,
//!     SignatureStatus,
//! };
//!
//! let mut manifest = Manifest::from_yaml_str("schema_uri: s\nversion: 1.0.0\n").unwrap();
//! let key = Ed25519SecretKey::generate().unwrap();
//!
//! sign_manifest(&mut manifest, &Ed25519Primitive, &key, &SignOptions::default()).unwrap();
//!
//! let report = verify_manifest(
//!     &manifest,
//!     &Ed25519Primitive,
//!     Some(&key.public_key()),
//!     &SigningLayout::default(),
//! )
//! .unwrap();
//! assert_eq!(report.status, SignatureStatus::Valid);
//! ```

mod ed25519;
mod error;
mod integrity;
mod minisign;
mod primitive;
mod signer;
mod verifier;

pub use ed25519::{key_id_for, Ed25519Primitive, Ed25519PublicKey, Ed25519SecretKey, KeyFile};
pub use error::ProvError;
pub use integrity::{check_integrity, embed_inventory, IntegrityStatus};
pub use minisign::{MinisignCommand, MinisignPublicKey, MinisignSecretKey, DEFAULT_TIMEOUT};
pub use primitive::{PrimitiveError, SignaturePrimitive};
pub use signer::{sign_manifest, SignOptions, SignOutcome};
pub use verifier::{verify_manifest, InvalidReason, SignatureStatus, VerificationReport};
