//! `ddc sign`: sign a manifest over its canonical payload.

use super::{load_contract, load_manifest, minisign_command, resolve_backend};
use crate::config::{Backend, Config};
use crate::output;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use ddc_prov::{
    sign_manifest, Ed25519Primitive, Ed25519SecretKey, MinisignSecretKey, ProvError, SignOptions,
};
use ddc_schema::check_manifest;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

/// Environment variable consulted for an encrypted minisign key's password.
pub const PASSWORD_ENV: &str = "MINISIGN_PASSWORD";

#[derive(Debug, Args)]
pub struct SignArgs {
    /// Manifest to sign (default: `manifest.path` from ddc.toml)
    pub manifest: Option<PathBuf>,

    /// Secret key: an Ed25519 key file or a minisign secret key
    #[arg(short = 's', long = "secret-key")]
    pub secret_key: PathBuf,

    #[arg(long, value_enum)]
    pub backend: Option<Backend>,

    /// Password for an encrypted minisign key (default: $MINISIGN_PASSWORD)
    #[arg(short = 'p', long)]
    pub password: Option<String>,

    /// Write the signed manifest here instead of overwriting the input
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// RFC 3339 signing timestamp (default: now)
    #[arg(long, value_parser = parse_timestamp)]
    pub timestamp: Option<DateTime<Utc>>,

    /// Sign even if the manifest fails its schema check
    #[arg(long)]
    pub skip_schema: bool,
}

fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(text)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| format!("invalid RFC 3339 timestamp: {e}"))
}

pub fn cmd_sign(args: SignArgs, config: &Config) -> Result<ExitCode> {
    let path = config.manifest_path(args.manifest);
    let mut manifest = load_manifest(&path)?;
    let layout = config.layout()?;

    if !args.skip_schema {
        let contract = load_contract(config, None)?;
        let violations = check_manifest(&contract, &layout.signed_document(&manifest)?)?;
        if !violations.is_empty() {
            output::violations(&path.display().to_string(), &violations);
            output::fail("refusing to sign a manifest that fails its schema check");
            return Ok(ExitCode::FAILURE);
        }
    }

    let mut options = SignOptions::with_layout(layout);
    options.timestamp = args.timestamp;

    let backend = resolve_backend(args.backend, &manifest, &options.layout, config);
    let outcome = match backend {
        Backend::Ed25519 => {
            let key = Ed25519SecretKey::load(&args.secret_key)
                .map_err(ProvError::from)
                .with_context(|| {
                    format!("failed to load secret key {}", args.secret_key.display())
                })?;
            sign_manifest(&mut manifest, &Ed25519Primitive, &key, &options)?
        }
        Backend::Minisign => {
            let mut key = MinisignSecretKey::new(&args.secret_key);
            if let Some(password) = args.password.or_else(|| env::var(PASSWORD_ENV).ok()) {
                key = key.with_password(password);
            }
            sign_manifest(&mut manifest, &minisign_command(config), &key, &options)?
        }
    };

    let target = args.output.unwrap_or(path);
    manifest
        .save(&target)
        .with_context(|| format!("failed to write {}", target.display()))?;
    info!(path = %target.display(), "wrote signed manifest");

    output::pass(format!("Signed manifest written to {}", target.display()));
    output::field("Payload SHA-256", &outcome.payload_sha256);
    output::field("Signed at", outcome.signed_at.to_rfc3339());
    Ok(ExitCode::SUCCESS)
}
