//! Binding a file inventory to a manifest's `integrity` section.

use crate::error::ProvError;
use ddc_hash::HashInventory;
use ddc_manifest::{Manifest, SigningLayout, Value, INTEGRITY_ALGORITHM};
use tracing::info;

/// How a manifest's recorded root compares with a fresh inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityStatus {
    Match,
    Mismatch { expected: String, actual: String },
    /// The manifest records no root.
    Missing,
}

/// Record the inventory's Merkle root in the manifest.
///
/// Run this before signing: the root is part of the signed payload.
pub fn embed_inventory(
    manifest: &mut Manifest,
    inventory: &HashInventory,
    layout: &SigningLayout,
) -> Result<String, ProvError> {
    let root = inventory.merkle_root();
    manifest.set(
        &layout.absolute(&layout.integrity_algorithm),
        Value::String(INTEGRITY_ALGORITHM.to_string()),
    )?;
    manifest.set(
        &layout.absolute(&layout.merkle_root),
        Value::String(root.clone()),
    )?;
    info!(merkle_root = %root, files = inventory.len(), "embedded inventory root");
    Ok(root)
}

/// Compare the manifest's recorded root with `inventory`.
pub fn check_integrity(
    manifest: &Manifest,
    inventory: &HashInventory,
    layout: &SigningLayout,
) -> Result<IntegrityStatus, ProvError> {
    let recorded = manifest.get(&layout.absolute(&layout.merkle_root))?;
    let expected = match recorded {
        None | Some(Value::Null) => return Ok(IntegrityStatus::Missing),
        Some(Value::String(s)) => s.clone(),
        Some(_) => {
            return Err(ProvError::MalformedDocument(format!(
                "{} is not a string",
                layout.absolute(&layout.merkle_root)
            )))
        }
    };

    let actual = inventory.merkle_root();
    if expected == actual {
        Ok(IntegrityStatus::Match)
    } else {
        Ok(IntegrityStatus::Mismatch { expected, actual })
    }
}
