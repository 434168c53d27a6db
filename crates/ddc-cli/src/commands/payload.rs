//! `ddc payload`: show exactly what gets signed.

use super::load_manifest;
use crate::config::Config;
use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use ddc_manifest::{render_payload, CanonicalMode};
use sha2::{Digest, Sha256};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum PayloadMode {
    /// Sorted-key compact JSON, the signed bytes
    #[default]
    Sorted,
    /// YAML in document order, for review only
    Document,
}

impl From<PayloadMode> for CanonicalMode {
    fn from(mode: PayloadMode) -> Self {
        match mode {
            PayloadMode::Sorted => CanonicalMode::Sorted,
            PayloadMode::Document => CanonicalMode::Document,
        }
    }
}

#[derive(Debug, Args)]
pub struct PayloadArgs {
    /// Manifest to render (default: `manifest.path` from ddc.toml)
    pub manifest: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = PayloadMode::Sorted)]
    pub mode: PayloadMode,

    /// Print the payload's SHA-256 instead of the payload
    #[arg(long)]
    pub digest: bool,
}

pub fn cmd_payload(args: PayloadArgs, config: &Config) -> Result<ExitCode> {
    let path = config.manifest_path(args.manifest);
    let manifest = load_manifest(&path)?;
    let layout = config.layout()?;
    let document = layout.signed_document(&manifest)?;

    let payload = render_payload(&document, &layout.value, args.mode.into())
        .with_context(|| format!("cannot render payload of {}", path.display()))?;

    let mut stdout = io::stdout().lock();
    if args.digest {
        writeln!(stdout, "{}", hex::encode(Sha256::digest(&payload)))?;
    } else {
        stdout.write_all(&payload)?;
    }
    stdout.flush()?;
    Ok(ExitCode::SUCCESS)
}
