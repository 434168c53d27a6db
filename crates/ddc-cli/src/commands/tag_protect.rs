//! `ddc tag-protect`: require every manifest under a directory to be signed.
//!
//! Intended for release-tag pipelines. With a public key each signature must
//! also verify.

use super::{load_manifest, resolve_backend, verify_with};
use crate::config::{Backend, Config};
use crate::output;
use anyhow::{Context, Result};
use clap::Args;
use ddc_manifest::find_manifests;
use ddc_prov::SignatureStatus;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;

#[derive(Debug, Args)]
pub struct TagProtectArgs {
    /// Directory searched for manifests
    #[arg(short = 'd', long, default_value = ".")]
    pub directory: PathBuf,

    /// Public key every signature must verify against
    #[arg(short = 'p', long)]
    pub pubkey: Option<PathBuf>,

    #[arg(long, value_enum)]
    pub backend: Option<Backend>,
}

pub fn cmd_tag_protect(args: TagProtectArgs, config: &Config) -> Result<ExitCode> {
    let manifests = find_manifests(&args.directory)
        .with_context(|| format!("failed to search {}", args.directory.display()))?;

    if manifests.is_empty() {
        output::warn(format!("No manifests found under {}", args.directory.display()));
        return Ok(ExitCode::SUCCESS);
    }

    println!("Checking {} manifest(s)...", manifests.len());
    let mut all_valid = true;
    for path in &manifests {
        match check_one(path, args.pubkey.as_deref(), args.backend, config) {
            Ok((true, message)) => output::pass(format!("{}: {message}", path.display())),
            Ok((false, message)) => {
                output::fail(format!("{}: {message}", path.display()));
                all_valid = false;
            }
            Err(err) => {
                output::fail(format!("{}: {err:#}", path.display()));
                all_valid = false;
            }
        }
    }

    Ok(if all_valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn check_one(
    path: &Path,
    pubkey: Option<&Path>,
    backend: Option<Backend>,
    config: &Config,
) -> Result<(bool, String)> {
    let manifest = load_manifest(path)?;
    let layout = config.layout()?;
    let backend = resolve_backend(backend, &manifest, &layout, config);
    let report = verify_with(backend, config, &manifest, pubkey, &layout)?;
    debug!(path = %path.display(), status = %report.status, "tag-protect check");

    let ok = match report.status {
        SignatureStatus::Valid => true,
        SignatureStatus::Present => pubkey.is_none(),
        _ => false,
    };
    Ok((ok, report.status.to_string()))
}
