//! Provenance manifest documents and their canonical signing payload.
//!
//! This crate holds a manifest as a structured YAML value, addresses fields
//! inside it with dotted paths, and derives the deterministic byte payload that
//! signatures are computed over.
//!
//! # Example
//!
//! ```
//! use ddc_manifest::{canonical_payload, Manifest, SigningLayout};
//!
//! let manifest = Manifest::from_yaml_str(
//!     "version: 1.0.0\nschema_uri: schema/manifest.schema.json\n",
//! )
//! .unwrap();
//!
//! let layout = SigningLayout::default();
//! let payload = canonical_payload(&manifest, &layout.value).unwrap();
//! assert_eq!(
//!     payload,
//!     br#"{"schema_uri":"schema/manifest.schema.json","version":"1.0.0"}"#
//! );
//! ```

mod canonical;
mod discover;
mod document;
mod error;
mod layout;
mod path;
mod types;

pub use canonical::{canonical_payload, render_payload, to_json_value, CanonicalMode};
pub use discover::find_manifests;
pub use document::Manifest;
pub use error::ManifestError;
pub use layout::SigningLayout;
pub use path::FieldPath;
pub use types::{
    Artifact, Integrity, SignatureBlock, Signing, INTEGRITY_ALGORITHM, PLACEHOLDER_SIGNATURE,
};

/// Re-exported so callers can build documents without naming `serde_yaml` directly.
pub use serde_yaml::{Mapping, Value};
