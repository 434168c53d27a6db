//! `ddc hash`: build the file inventory and its Merkle root.

use super::load_manifest;
use crate::config::Config;
use crate::output;
use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use ddc_hash::{
    build_inventory, FsProvider, HashInventory, IntegrityScope, InventoryDiff, InventorySnapshot,
};
use ddc_prov::{embed_inventory, verify_manifest, Ed25519Primitive};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Debug, Args)]
pub struct HashArgs {
    /// Directory to inventory (default: `integrity.root` from ddc.toml)
    pub root: Option<PathBuf>,

    /// Include pattern; replaces the configured includes (repeatable)
    #[arg(long)]
    pub include: Vec<String>,

    /// Extra exclude pattern (repeatable)
    #[arg(long)]
    pub exclude: Vec<String>,

    /// Snapshot output path (default: `integrity.snapshot`)
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Record the root in this manifest's `integrity` section
    #[arg(long)]
    pub embed: Option<PathBuf>,

    /// Report which paths changed since this earlier snapshot
    #[arg(long)]
    pub diff: Option<PathBuf>,
}

pub fn cmd_hash(args: HashArgs, config: &Config) -> Result<ExitCode> {
    let root = args.root.unwrap_or_else(|| config.integrity.root.clone());
    let include = if args.include.is_empty() {
        config.integrity.include.clone()
    } else {
        args.include
    };
    let mut exclude = config.integrity.exclude.clone();
    exclude.extend(args.exclude);
    let scope = IntegrityScope::new(include.as_slice(), exclude.as_slice())
        .context("invalid integrity scope")?;

    let inventory = build_inventory(&FsProvider::new(&root), &scope)
        .with_context(|| format!("failed to hash files under {}", root.display()))?;

    if let Some(previous) = &args.diff {
        let snapshot = InventorySnapshot::load(previous)
            .with_context(|| format!("failed to load snapshot {}", previous.display()))?;
        let before = snapshot
            .to_inventory()
            .with_context(|| format!("snapshot {} is inconsistent", previous.display()))?;
        print_diff(&before.diff(&inventory));
    }

    let out = args.out.unwrap_or_else(|| config.integrity.snapshot.clone());
    InventorySnapshot::from_inventory(&inventory, Utc::now())
        .save(&out)
        .with_context(|| format!("failed to write snapshot {}", out.display()))?;

    let merkle_root = inventory.merkle_root();
    output::pass(format!(
        "Hashed {} file(s) under {}",
        inventory.len(),
        root.display()
    ));
    output::field("Merkle root", &merkle_root);
    output::field("Snapshot", out.display());

    if let Some(manifest_path) = &args.embed {
        embed(manifest_path, &inventory, config)?;
    }

    Ok(ExitCode::SUCCESS)
}

fn embed(path: &Path, inventory: &HashInventory, config: &Config) -> Result<()> {
    let mut manifest = load_manifest(path)?;
    let layout = config.layout()?;

    let signed_before = !verify_manifest(&manifest, &Ed25519Primitive, None, &layout)?
        .status
        .is_unsigned();

    embed_inventory(&mut manifest, inventory, &layout)?;
    manifest
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    output::pass(format!("Embedded merkle root in {}", path.display()));

    if signed_before {
        output::warn("manifest was already signed; re-sign it to cover the new root");
    }
    Ok(())
}

pub(crate) fn print_diff(diff: &InventoryDiff) {
    if diff.is_empty() {
        output::pass("No files changed since the snapshot");
        return;
    }
    for path in &diff.added {
        println!("  + {path}");
    }
    for path in &diff.removed {
        println!("  - {path}");
    }
    for path in &diff.modified {
        println!("  ~ {path}");
    }
}
