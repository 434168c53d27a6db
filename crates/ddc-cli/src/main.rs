use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use ddc_cli::commands::{
    hash::{cmd_hash, HashArgs},
    keygen::{cmd_keygen, KeygenArgs},
    payload::{cmd_payload, PayloadArgs},
    schema::{cmd_check_schema_uri, cmd_validate, CheckSchemaUriArgs, ValidateArgs},
    sign::{cmd_sign, SignArgs},
    tag_protect::{cmd_tag_protect, TagProtectArgs},
    validate_all::{cmd_validate_all, ValidateAllArgs},
    verify::{cmd_verify, VerifyArgs},
};
use ddc_cli::config::Config;
use ddc_cli::output;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Deterministic manifest signing and release validation.
#[derive(Parser, Debug)]
#[command(name = "ddc", version)]
struct Cli {
    /// Enable debug logging (overrides RUST_LOG)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file (default: ./ddc.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sign a manifest in place
    Sign(SignArgs),
    /// Verify a manifest's signature (exit 0 valid, 1 invalid, 2 unsigned)
    Verify(VerifyArgs),
    /// Hash the tracked files and compute the Merkle root
    Hash(HashArgs),
    /// Check a manifest against the schema contract
    Validate(ValidateArgs),
    /// Check the declared schema_uri of one or more manifests
    CheckSchemaUri(CheckSchemaUriArgs),
    /// Print the canonical payload that gets signed
    Payload(PayloadArgs),
    /// Generate an Ed25519 key pair
    Keygen(KeygenArgs),
    /// Require every manifest under a directory to be signed
    TagProtect(TagProtectArgs),
    /// Run every release check and summarise
    ValidateAll(ValidateAllArgs),
}

fn init_tracing(verbose: u8) {
    let filter = if verbose > 0 {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = || Config::load(cli.config.as_deref());
    match cli.command {
        Commands::Sign(args) => cmd_sign(args, &config()?),
        Commands::Verify(args) => cmd_verify(args, &config()?),
        Commands::Hash(args) => cmd_hash(args, &config()?),
        Commands::Validate(args) => cmd_validate(args, &config()?),
        Commands::CheckSchemaUri(args) => cmd_check_schema_uri(args, &config()?),
        Commands::Payload(args) => cmd_payload(args, &config()?),
        Commands::Keygen(args) => cmd_keygen(args),
        Commands::TagProtect(args) => cmd_tag_protect(args, &config()?),
        Commands::ValidateAll(args) => cmd_validate_all(args, &config()?),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    output::init_colors();

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}
