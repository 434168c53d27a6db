//! Signatures produced by an external `minisign` binary.
//!
//! The payload and signature are exchanged through files in a private
//! temporary directory. Each invocation is bounded by a timeout; a child that
//! overruns it is killed.

use crate::primitive::{PrimitiveError, SignaturePrimitive};
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;
use tracing::debug;
use wait_timeout::ChildExt;

/// Default bound on a single `minisign` invocation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A minisign secret key file, with its password if it is encrypted.
#[derive(Clone)]
pub struct MinisignSecretKey {
    pub path: PathBuf,
    pub password: Option<String>,
}

impl std::fmt::Debug for MinisignSecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MinisignSecretKey")
            .field("path", &self.path)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl MinisignSecretKey {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            password: None,
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }
}

/// A minisign public key file.
#[derive(Debug, Clone)]
pub struct MinisignPublicKey {
    pub path: PathBuf,
}

impl MinisignPublicKey {
    /// Reference a public key file, checking that it exists.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, PrimitiveError> {
        let path = path.into();
        if !path.is_file() {
            return Err(PrimitiveError::KeyFormat(format!(
                "public key not found: {}",
                path.display()
            )));
        }
        Ok(Self { path })
    }
}

/// Runs the `minisign` program to sign and verify.
#[derive(Debug, Clone)]
pub struct MinisignCommand {
    program: PathBuf,
    timeout: Duration,
}

impl Default for MinisignCommand {
    fn default() -> Self {
        Self::new("minisign")
    }
}

impl MinisignCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run the program with `args` inside `workdir`, feeding `stdin` if given.
    ///
    /// Returns whether it exited successfully, along with its stderr.
    fn run(
        &self,
        workdir: &Path,
        args: &[&OsStr],
        stdin: Option<&str>,
    ) -> Result<(bool, String), PrimitiveError> {
        // stderr goes to a file so a chatty child can never block on a full pipe.
        let stderr_path = workdir.join("stderr.log");
        let stderr = File::create(&stderr_path).map_err(tool_failure)?;

        let mut child = Command::new(&self.program)
            .args(args)
            .current_dir(workdir)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::null())
            .stderr(Stdio::from(stderr))
            .spawn()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => PrimitiveError::KeyUnavailable(format!(
                    "{} not found; install minisign",
                    self.program.display()
                )),
                _ => PrimitiveError::KeyUnavailable(format!(
                    "cannot start {}: {e}",
                    self.program.display()
                )),
            })?;

        if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
            // A child that exits without reading its input is not an error here.
            if let Err(e) = writeln!(pipe, "{input}") {
                debug!(program = %self.program.display(), error = %e, "could not write to stdin");
            }
        }

        let status = match child.wait_timeout(self.timeout).map_err(tool_failure)? {
            Some(status) => status,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(PrimitiveError::Timeout(self.timeout));
            }
        };

        let stderr = fs::read_to_string(&stderr_path).unwrap_or_default();
        debug!(program = %self.program.display(), code = ?status.code(), "minisign finished");
        Ok((status.success(), stderr.trim().to_string()))
    }
}

fn tool_failure(e: io::Error) -> PrimitiveError {
    PrimitiveError::Failed(e.to_string())
}

impl SignaturePrimitive for MinisignCommand {
    type SecretKey = MinisignSecretKey;
    type PublicKey = MinisignPublicKey;

    fn scheme(&self) -> &str {
        "minisign"
    }

    // The key id is embedded in the minisign signature itself.
    fn key_id(&self, _key: &MinisignSecretKey) -> Option<String> {
        None
    }

    fn public_key_id(&self, _key: &MinisignPublicKey) -> Option<String> {
        None
    }

    fn sign(&self, payload: &[u8], key: &MinisignSecretKey) -> Result<String, PrimitiveError> {
        if !key.path.is_file() {
            return Err(PrimitiveError::KeyUnavailable(format!(
                "secret key not found: {}",
                key.path.display()
            )));
        }
        let secret = fs::canonicalize(&key.path).map_err(tool_failure)?;

        let dir = tempfile::tempdir().map_err(tool_failure)?;
        let payload_path = dir.path().join("payload.json");
        let sig_path = dir.path().join("payload.json.minisig");
        fs::write(&payload_path, payload).map_err(tool_failure)?;

        let (ok, stderr) = self.run(
            dir.path(),
            &[
                OsStr::new("-S"),
                OsStr::new("-s"),
                secret.as_os_str(),
                OsStr::new("-m"),
                payload_path.as_os_str(),
                OsStr::new("-x"),
                sig_path.as_os_str(),
            ],
            key.password.as_deref(),
        )?;
        if !ok {
            return Err(PrimitiveError::KeyUnavailable(format!(
                "minisign could not sign: {stderr}"
            )));
        }

        let signature = fs::read_to_string(&sig_path).map_err(|e| {
            PrimitiveError::Failed(format!("minisign produced no signature: {e}"))
        })?;
        Ok(signature.trim_end().to_string())
    }

    fn verify(
        &self,
        payload: &[u8],
        signature: &str,
        key: &MinisignPublicKey,
    ) -> Result<bool, PrimitiveError> {
        if !signature.trim_start().starts_with("untrusted comment:") {
            return Err(PrimitiveError::MalformedSignature(
                "expected a minisign signature block".to_string(),
            ));
        }
        let public = fs::canonicalize(&key.path).map_err(|e| {
            PrimitiveError::KeyFormat(format!("public key {}: {e}", key.path.display()))
        })?;

        let dir = tempfile::tempdir().map_err(tool_failure)?;
        let payload_path = dir.path().join("payload.json");
        let sig_path = dir.path().join("payload.json.minisig");
        fs::write(&payload_path, payload).map_err(tool_failure)?;
        fs::write(&sig_path, format!("{}\n", signature.trim_end())).map_err(tool_failure)?;

        let (ok, stderr) = self.run(
            dir.path(),
            &[
                OsStr::new("-V"),
                OsStr::new("-q"),
                OsStr::new("-p"),
                public.as_os_str(),
                OsStr::new("-m"),
                payload_path.as_os_str(),
                OsStr::new("-x"),
                sig_path.as_os_str(),
            ],
            None,
        )?;
        if !ok {
            debug!(%stderr, "minisign rejected signature");
        }
        Ok(ok)
    }
}
