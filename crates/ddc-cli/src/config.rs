//! `ddc.toml` project configuration.
//!
//! Every key is optional. A missing file yields the defaults; command-line
//! flags override whatever the file says.

use anyhow::{Context, Result};
use ddc_hash::{IntegrityScope, DEFAULT_INCLUDES};
use ddc_manifest::{FieldPath, SigningLayout};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File looked up in the working directory when `--config` is not given.
pub const CONFIG_FILE: &str = "ddc.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub manifest: ManifestConfig,
    pub integrity: IntegrityConfig,
    pub signing: SigningConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ManifestConfig {
    /// Manifest used when a command is not given one
    pub path: PathBuf,
    /// JSON-Schema file; the built-in contract is used when unset
    pub schema: Option<PathBuf>,
    /// Value every manifest's `schema_uri` must equal
    pub schema_uri: String,
    /// Key the signed document is nested under (e.g., "doc_index")
    pub signature_root: Option<String>,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("manifest/core-v1.manifest.yaml"),
            schema: None,
            schema_uri: "schema/manifest.schema.json".to_string(),
            signature_root: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IntegrityConfig {
    /// Directory the inventory is taken from
    pub root: PathBuf,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    /// Where `ddc hash` writes its snapshot
    pub snapshot: PathBuf,
    /// Files that must be tracked by the inventory
    pub required: Vec<String>,
}

impl Default for IntegrityConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            include: DEFAULT_INCLUDES.iter().map(|s| s.to_string()).collect(),
            exclude: Vec::new(),
            snapshot: PathBuf::from("manifest/hash-inventory.json"),
            required: ["LICENSE", "Makefile", "README.md", "core/__init__.py", "core/main.py"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Signature backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Ed25519,
    Minisign,
}

impl Backend {
    /// The backend matching a manifest's declared `scheme`.
    pub fn from_scheme(scheme: &str) -> Option<Self> {
        match scheme {
            "ed25519" => Some(Backend::Ed25519),
            "minisign" => Some(Backend::Minisign),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SigningConfig {
    pub backend: Backend,
    /// Path or name of the minisign executable
    pub minisign: PathBuf,
    pub timeout_secs: u64,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Ed25519,
            minisign: PathBuf::from("minisign"),
            timeout_secs: ddc_prov::DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

impl SigningConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load `explicit`, or `ddc.toml` from the working directory if present.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None if Path::new(CONFIG_FILE).is_file() => Self::from_file(Path::new(CONFIG_FILE)),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn layout(&self) -> Result<SigningLayout> {
        Ok(match &self.manifest.signature_root {
            Some(root) => SigningLayout::rooted(
                FieldPath::parse(root).context("invalid manifest.signature_root")?,
            ),
            None => SigningLayout::default(),
        })
    }

    pub fn scope(&self) -> Result<IntegrityScope> {
        IntegrityScope::new(
            self.integrity.include.as_slice(),
            self.integrity.exclude.as_slice(),
        )
        .context("invalid integrity scope")
    }

    /// The manifest to operate on: `arg` if given, else the configured path.
    pub fn manifest_path(&self, arg: Option<PathBuf>) -> PathBuf {
        arg.unwrap_or_else(|| self.manifest.path.clone())
    }
}
