//! Error types for dsign core primitives.

use thiserror::Error;

use crate::keys::Algorithm;

/// Errors raised by the pure signing primitives.
///
/// Note that a signature which parses but does not verify is *not* an error:
/// [`crate::signature::verify`] reports it as `Ok(false)`.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("malformed key: {0}")]
    KeyMalformed(String),

    #[error("key unusable: {0}")]
    KeyUnusable(String),

    #[error("expected a {expected} key, found {found}")]
    AlgorithmMismatch { expected: Algorithm, found: Algorithm },

    #[error("malformed signature: {0}")]
    SignatureMalformed(String),

    #[error("malformed digest: {0}")]
    DigestMalformed(String),

    #[error("malformed snapshot at line {line}: {reason}")]
    SnapshotMalformed { line: usize, reason: String },

    #[error("unsupported entry name: {0}")]
    UnsupportedName(String),

    #[error("unknown algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    #[error("signing failed: {0}")]
    SigningFailed(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
