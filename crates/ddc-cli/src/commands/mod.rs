//! Subcommand handlers.
//!
//! Each handler returns the process exit code on a completed run and an
//! error only when the run could not be completed at all.

pub mod hash;
pub mod keygen;
pub mod payload;
pub mod schema;
pub mod sign;
pub mod tag_protect;
pub mod validate_all;
pub mod verify;

use crate::config::{Backend, Config};
use anyhow::{Context, Result};
use ddc_manifest::{Manifest, SigningLayout, Value};
use ddc_prov::{
    verify_manifest, Ed25519Primitive, Ed25519PublicKey, MinisignCommand, MinisignPublicKey,
    VerificationReport,
};
use ddc_schema::Contract;
use std::path::Path;

pub(crate) fn load_manifest(path: &Path) -> Result<Manifest> {
    Manifest::load(path).with_context(|| format!("failed to load manifest {}", path.display()))
}

/// The configured JSON-Schema contract, or the built-in one.
pub(crate) fn load_contract(config: &Config, schema: Option<&Path>) -> Result<Contract> {
    match schema.or(config.manifest.schema.as_deref()) {
        Some(path) => Contract::load(path)
            .with_context(|| format!("failed to load schema {}", path.display())),
        None => Ok(Contract::manifest_v1()),
    }
}

/// Pick the backend: explicit flag, then the manifest's declared scheme,
/// then the configured default.
pub(crate) fn resolve_backend(
    flag: Option<Backend>,
    manifest: &Manifest,
    layout: &SigningLayout,
    config: &Config,
) -> Backend {
    flag.or_else(|| {
        manifest
            .get(&layout.absolute(&layout.scheme))
            .ok()
            .flatten()
            .and_then(Value::as_str)
            .and_then(Backend::from_scheme)
    })
    .unwrap_or(config.signing.backend)
}

pub(crate) fn minisign_command(config: &Config) -> MinisignCommand {
    MinisignCommand::new(config.signing.minisign.clone()).with_timeout(config.signing.timeout())
}

/// Verify `manifest` with the given backend and optional public key file.
pub(crate) fn verify_with(
    backend: Backend,
    config: &Config,
    manifest: &Manifest,
    pubkey: Option<&Path>,
    layout: &SigningLayout,
) -> Result<VerificationReport> {
    let report = match backend {
        Backend::Ed25519 => {
            let key = pubkey
                .map(Ed25519PublicKey::load)
                .transpose()
                .context("failed to load public key")?;
            verify_manifest(manifest, &Ed25519Primitive, key.as_ref(), layout)?
        }
        Backend::Minisign => {
            let key = pubkey
                .map(MinisignPublicKey::load)
                .transpose()
                .context("failed to load public key")?;
            verify_manifest(manifest, &minisign_command(config), key.as_ref(), layout)?
        }
    };
    Ok(report)
}
