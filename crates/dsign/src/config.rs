//! Engine configuration.
//!
//! Resolution order: [`EngineConfig::default`], then an optional JSON file,
//! then `DSIGN_*` environment variables.

use dsign_core::Algorithm;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable overriding [`EngineConfig::key_dir`].
pub const ENV_KEY_DIR: &str = "DSIGN_KEY_DIR";
/// Environment variable overriding [`EngineConfig::signature_extension`].
pub const ENV_SIGNATURE_EXT: &str = "DSIGN_SIGNATURE_EXT";
/// Environment variable overriding [`EngineConfig::algorithm`].
pub const ENV_ALGORITHM: &str = "DSIGN_ALGORITHM";

/// File extension of per-file signature sidecars.
///
/// A deployment picks one; an engine never reads or writes the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureExtension {
    /// `<path>.sig`
    #[default]
    Sig,
    /// `<path>.signed`
    Signed,
}

impl SignatureExtension {
    pub const fn as_str(&self) -> &'static str {
        match self {
            SignatureExtension::Sig => "sig",
            SignatureExtension::Signed => "signed",
        }
    }

    fn parse(s: &str) -> Result<Self> {
        match s.trim_start_matches('.') {
            "sig" => Ok(SignatureExtension::Sig),
            "signed" => Ok(SignatureExtension::Signed),
            other => Err(Error::Config(format!(
                "signature extension must be \"sig\" or \"signed\", got {other:?}"
            ))),
        }
    }
}

/// Configuration for the [`crate::Engine`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory holding key pairs.
    pub key_dir: PathBuf,
    /// Extension of per-file signature sidecars.
    pub signature_extension: SignatureExtension,
    /// Algorithm for newly generated key pairs.
    pub algorithm: Algorithm,
    /// When set, signing refuses keys of any other algorithm.
    pub pinned_algorithm: Option<Algorithm>,
    /// Write a `<path>.sha256` digest sidecar next to each signed file.
    pub write_digest_sidecar: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            key_dir: PathBuf::from("keys"),
            signature_extension: SignatureExtension::Sig,
            algorithm: Algorithm::Rsa2048,
            pinned_algorithm: None,
            write_digest_sidecar: true,
        }
    }
}

impl EngineConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::unreadable(path, e))?;
        serde_json::from_str(&text)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    /// Apply `DSIGN_*` overrides from the process environment.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup. Empty values are ignored.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(dir) = get(ENV_KEY_DIR) {
            self.key_dir = PathBuf::from(dir);
        }
        if let Some(ext) = get(ENV_SIGNATURE_EXT) {
            self.signature_extension = SignatureExtension::parse(ext.trim())?;
        }
        if let Some(alg) = get(ENV_ALGORITHM) {
            self.algorithm = alg
                .trim()
                .parse()
                .map_err(|e| Error::Config(format!("{ENV_ALGORITHM}: {e}")))?;
        }
        Ok(self)
    }

    /// Set the key directory.
    pub fn key_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.key_dir = dir.into();
        self
    }

    /// Set the signature sidecar extension.
    pub fn signature_extension(mut self, ext: SignatureExtension) -> Self {
        self.signature_extension = ext;
        self
    }

    /// Set the algorithm for generated keys.
    pub fn algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Refuse to sign with keys of any other algorithm.
    pub fn pin_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.pinned_algorithm = Some(algorithm);
        self
    }
}
