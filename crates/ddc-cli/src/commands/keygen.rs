//! `ddc keygen`: create a local Ed25519 key pair.

use crate::output;
use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use ddc_prov::Ed25519SecretKey;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Args)]
pub struct KeygenArgs {
    /// Write the key pair to this file (default: print to stdout)
    pub output: Option<PathBuf>,

    /// Overwrite an existing key file
    #[arg(long)]
    pub force: bool,
}

pub fn cmd_keygen(args: KeygenArgs) -> Result<ExitCode> {
    let key = Ed25519SecretKey::generate().context("failed to generate key")?;
    let file = key.to_key_file();

    match args.output {
        Some(path) => {
            if path.exists() && !args.force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            key.save(&path)
                .with_context(|| format!("failed to write key pair to {}", path.display()))?;
            output::pass(format!("Key pair written to {}", path.display()));
            output::field("Key ID", &file.key_id);
            output::field("Public Key", &file.public_key);
        }
        None => {
            output::heading("Generated Ed25519 Key Pair");
            output::field("Key ID", &file.key_id);
            println!(
                "  {}: {}",
                "Private Key".bold().red(),
                file.private_key.as_deref().unwrap_or_default()
            );
            println!("  {}: {}", "Public Key".bold().green(), file.public_key);
            println!();
            println!("{}", "WARNING: Keep the private key secret!".yellow().bold());
        }
    }

    Ok(ExitCode::SUCCESS)
}
