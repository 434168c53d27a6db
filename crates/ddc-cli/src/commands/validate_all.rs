//! `ddc validate-all`: run every release check and summarise.

use super::{load_contract, load_manifest, resolve_backend, verify_with};
use crate::commands::hash::print_diff;
use crate::config::{Backend, Config};
use crate::output;
use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use ddc_hash::{build_inventory, FsProvider, HashInventory, InventorySnapshot};
use ddc_manifest::{to_json_value, Manifest, Value};
use ddc_prov::{check_integrity, IntegrityStatus, SignatureStatus};
use ddc_schema::{check_manifest, check_schema_uri};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Args)]
pub struct ValidateAllArgs {
    /// Manifest to check (default: `manifest.path` from ddc.toml)
    #[arg(long)]
    pub manifest: Option<PathBuf>,

    /// Public key for signature verification
    #[arg(short = 'p', long)]
    pub pubkey: Option<PathBuf>,

    #[arg(long, value_enum)]
    pub backend: Option<Backend>,

    /// Accept an absent or placeholder signature (development builds)
    #[arg(long)]
    pub allow_unsigned: bool,
}

struct Checked {
    manifest_path: PathBuf,
    manifest: Manifest,
    inventory: HashInventory,
}

pub fn cmd_validate_all(args: ValidateAllArgs, config: &Config) -> Result<ExitCode> {
    output::heading("DDC Core - Comprehensive Validation");

    let manifest_path = config.manifest_path(args.manifest.clone());
    let ctx = Checked {
        manifest: load_manifest(&manifest_path)?,
        inventory: build_inventory(&FsProvider::new(&config.integrity.root), &config.scope()?)
            .context("failed to build file inventory")?,
        manifest_path,
    };

    let checks: [(&str, fn(&Checked, &ValidateAllArgs, &Config) -> Result<String>); 5] = [
        ("1. File tracking", check_files_tracked),
        ("2. Hash consistency", check_hash_consistency),
        ("3. Manifest schema", check_schema),
        ("4. Schema URI", check_uri),
        ("5. Manifest signature", check_signature),
    ];

    let mut passed = 0;
    for (name, check) in checks {
        println!();
        println!("{}", name.bold());
        match check(&ctx, &args, config) {
            Ok(message) => {
                output::pass(format!("PASS: {message}"));
                passed += 1;
            }
            Err(err) => output::fail(format!("FAIL: {err:#}")),
        }
    }

    println!();
    let summary = format!("{passed}/{} checks passed", checks.len());
    if passed == checks.len() {
        output::pass(summary);
        Ok(ExitCode::SUCCESS)
    } else {
        output::fail(summary);
        Ok(ExitCode::FAILURE)
    }
}

fn check_files_tracked(ctx: &Checked, _: &ValidateAllArgs, config: &Config) -> Result<String> {
    let missing: Vec<&str> = config
        .integrity
        .required
        .iter()
        .filter(|path| ctx.inventory.get(path).is_none())
        .map(String::as_str)
        .collect();

    if !missing.is_empty() {
        bail!("missing files: {}", missing.join(", "));
    }
    Ok(format!("all {} files tracked in inventory", ctx.inventory.len()))
}

fn check_hash_consistency(ctx: &Checked, _: &ValidateAllArgs, config: &Config) -> Result<String> {
    match check_integrity(&ctx.manifest, &ctx.inventory, &config.layout()?)? {
        IntegrityStatus::Match => Ok(format!(
            "merkle root matches: {}...",
            &ctx.inventory.merkle_root()[..16]
        )),
        IntegrityStatus::Missing => bail!("manifest records no integrity.merkle_root"),
        IntegrityStatus::Mismatch { expected, actual } => {
            // Explain which paths moved when an earlier snapshot is around.
            if let Ok(snapshot) = InventorySnapshot::load(&config.integrity.snapshot) {
                if let Ok(before) = snapshot.to_inventory() {
                    print_diff(&before.diff(&ctx.inventory));
                }
            }
            bail!(
                "merkle root mismatch: manifest {}..., computed {}...",
                prefix(&expected),
                prefix(&actual)
            )
        }
    }
}

fn prefix(hex: &str) -> &str {
    hex.get(..16).unwrap_or(hex)
}

fn check_schema(ctx: &Checked, _: &ValidateAllArgs, config: &Config) -> Result<String> {
    let contract = load_contract(config, None)?;
    let document = config.layout()?.signed_document(&ctx.manifest)?;
    let violations = check_manifest(&contract, &document)?;
    if !violations.is_empty() {
        let details: Vec<String> = violations.iter().map(ToString::to_string).collect();
        bail!("{}", details.join("; "));
    }
    Ok(format!("manifest conforms to {}", contract.name))
}

fn check_uri(ctx: &Checked, _: &ValidateAllArgs, config: &Config) -> Result<String> {
    let document = config.layout()?.signed_document(&ctx.manifest)?;
    let json = to_json_value(&Value::Mapping(document.into_mapping()))?;
    match check_schema_uri(&json, &config.manifest.schema_uri) {
        None => Ok(format!("schema_uri is {}", config.manifest.schema_uri)),
        Some(violation) => bail!("{violation}"),
    }
}

fn check_signature(ctx: &Checked, args: &ValidateAllArgs, config: &Config) -> Result<String> {
    let layout = config.layout()?;
    let backend = resolve_backend(args.backend, &ctx.manifest, &layout, config);
    let report = verify_with(backend, config, &ctx.manifest, args.pubkey.as_deref(), &layout)
        .with_context(|| format!("cannot verify {}", ctx.manifest_path.display()))?;

    match report.status {
        SignatureStatus::Valid => Ok("signature valid".to_string()),
        SignatureStatus::Present if args.pubkey.is_none() => Ok(report.status.to_string()),
        ref status if status.is_unsigned() && args.allow_unsigned => {
            Ok(format!("{status} (accepted for development)"))
        }
        status => bail!("{status}"),
    }
}
