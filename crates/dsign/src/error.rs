//! Error types for dsign operations.

use dsign_core::CoreError;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that abort a sign or verify operation.
///
/// Verification that *runs* but fails (drift, bad signature) is not an error;
/// it is reported through [`crate::Verification`]. These variants mean the
/// operation could not be carried out at all.
#[derive(Debug, Error)]
pub enum Error {
    /// Source file or directory is missing or unreadable.
    #[error("cannot read {path}: {source}")]
    IoUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Key path does not exist.
    #[error("key not found: {0}")]
    KeyNotFound(PathBuf),

    /// Key file exists but could not be parsed.
    #[error("malformed key {path}: {reason}")]
    KeyMalformed { path: PathBuf, reason: String },

    /// Key parsed but cannot be used for this operation.
    #[error("key unusable: {0}")]
    KeyUnusable(String),

    /// Signature bytes cannot be parsed for verification.
    #[error("malformed signature: {0}")]
    SignatureMalformed(String),

    /// Persisted digest could not be parsed.
    #[error("malformed digest: {0}")]
    DigestMalformed(String),

    /// Required sidecar artifacts are absent: the target cannot be verified.
    #[error("cannot verify {target}: missing {}", display_paths(.missing))]
    ArtifactsMissing {
        target: PathBuf,
        missing: Vec<PathBuf>,
    },

    /// A directory entry name cannot be represented in a snapshot.
    #[error("unsupported entry name: {0}")]
    UnsupportedName(String),

    /// Key pair name would escape the key directory.
    #[error("invalid key name: {0:?}")]
    InvalidKeyName(String),

    /// Failure writing an artifact or key file.
    #[error("cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Other failures from the signing primitives.
    #[error(transparent)]
    Core(CoreError),
}

impl Error {
    pub(crate) fn unreadable(path: &Path, source: io::Error) -> Self {
        Error::IoUnreadable {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn write(path: &Path, source: io::Error) -> Self {
        Error::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl From<CoreError> for Error {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::KeyUnusable(reason) => Error::KeyUnusable(reason),
            e @ CoreError::AlgorithmMismatch { .. } => Error::KeyUnusable(e.to_string()),
            CoreError::SignatureMalformed(reason) => Error::SignatureMalformed(reason),
            CoreError::DigestMalformed(reason) => Error::DigestMalformed(reason),
            CoreError::UnsupportedName(name) => Error::UnsupportedName(name),
            other => Error::Core(other),
        }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for dsign operations.
pub type Result<T> = std::result::Result<T, Error>;
