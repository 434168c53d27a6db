//! `ddc validate` and `ddc check-schema-uri`.

use super::{load_contract, load_manifest};
use crate::config::Config;
use crate::output;
use anyhow::Result;
use clap::Args;
use ddc_manifest::{to_json_value, Value};
use ddc_schema::{check_manifest, check_schema_uri};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Manifest to validate (default: `manifest.path` from ddc.toml)
    pub manifest: Option<PathBuf>,

    /// JSON-Schema file (default: `manifest.schema`, else the built-in contract)
    #[arg(long)]
    pub schema: Option<PathBuf>,
}

pub fn cmd_validate(args: ValidateArgs, config: &Config) -> Result<ExitCode> {
    let path = config.manifest_path(args.manifest);
    let manifest = load_manifest(&path)?;
    let contract = load_contract(config, args.schema.as_deref())?;
    let document = config.layout()?.signed_document(&manifest)?;

    let violations = check_manifest(&contract, &document)?;
    if violations.is_empty() {
        output::pass(format!(
            "{} conforms to {}",
            path.display(),
            contract.name
        ));
        Ok(ExitCode::SUCCESS)
    } else {
        output::violations(&path.display().to_string(), &violations);
        Ok(ExitCode::FAILURE)
    }
}

#[derive(Debug, Args)]
pub struct CheckSchemaUriArgs {
    /// Manifests to check (default: `manifest.path` from ddc.toml)
    pub manifests: Vec<PathBuf>,

    /// Expected `schema_uri` (default: `manifest.schema_uri`)
    #[arg(long)]
    pub expected: Option<String>,
}

pub fn cmd_check_schema_uri(args: CheckSchemaUriArgs, config: &Config) -> Result<ExitCode> {
    let expected = args
        .expected
        .unwrap_or_else(|| config.manifest.schema_uri.clone());
    let paths = if args.manifests.is_empty() {
        vec![config.manifest.path.clone()]
    } else {
        args.manifests
    };
    let layout = config.layout()?;

    let mut all_ok = true;
    for path in &paths {
        let manifest = load_manifest(path)?;
        let document = layout.signed_document(&manifest)?;
        let json = to_json_value(&Value::Mapping(document.into_mapping()))?;

        match check_schema_uri(&json, &expected) {
            None => output::pass(format!("Schema URI correct for {}", path.display())),
            Some(violation) => {
                output::fail(format!("{}: {violation}", path.display()));
                all_ok = false;
            }
        }
    }

    Ok(if all_ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
