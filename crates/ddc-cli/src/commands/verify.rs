//! `ddc verify`: check a manifest's signature.

use super::{load_manifest, resolve_backend, verify_with};
use crate::config::{Backend, Config};
use crate::output;
use anyhow::Result;
use clap::Args;
use ddc_prov::{SignatureStatus, VerificationReport};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Args)]
pub struct VerifyArgs {
    /// Manifest to verify (default: `manifest.path` from ddc.toml)
    pub manifest: Option<PathBuf>,

    /// Public key: Ed25519 hex or key file, or a minisign public key
    #[arg(short = 'p', long)]
    pub pubkey: Option<PathBuf>,

    /// Backend (default: the manifest's declared scheme)
    #[arg(long, value_enum)]
    pub backend: Option<Backend>,

    /// Succeed on a present signature when no public key is given
    #[arg(long)]
    pub accept_unverified: bool,
}

pub fn cmd_verify(args: VerifyArgs, config: &Config) -> Result<ExitCode> {
    let path = config.manifest_path(args.manifest);
    let manifest = load_manifest(&path)?;
    let layout = config.layout()?;
    let backend = resolve_backend(args.backend, &manifest, &layout, config);

    let report = verify_with(backend, config, &manifest, args.pubkey.as_deref(), &layout)?;
    print_report(&path.display().to_string(), &report, args.accept_unverified);

    Ok(ExitCode::from(report.exit_code(args.accept_unverified) as u8))
}

pub(crate) fn print_report(source: &str, report: &VerificationReport, accept_unverified: bool) {
    let line = format!("{source}: {}", report.status);
    match &report.status {
        SignatureStatus::Valid => output::pass(line),
        SignatureStatus::Present if accept_unverified => output::warn(line),
        _ => output::fail(line),
    }

    output::field("Payload SHA-256", &report.payload_sha256);
    if let Some(key_id) = &report.key_id {
        output::field("Key ID", key_id);
    }
    if let Some(signed_at) = &report.signed_at {
        output::field("Signed at", signed_at.to_rfc3339());
    }
}
