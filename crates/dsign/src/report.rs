//! Results of sign and verify operations.
//!
//! Everything here is serializable so callers can emit JSON reports.

use dsign_core::{Digest, SnapshotDiff};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How a verification that ran to completion turned out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// Signature verifies under the public key.
    Valid,
    /// Digest matches but the signature does not verify: wrong key or a
    /// tampered signature.
    SignatureInvalid,
    /// File content no longer matches the digest recorded at signing.
    ContentDrift { expected: Digest, actual: Digest },
    /// Directory structure no longer matches the snapshot recorded at signing.
    StructuralDrift {
        expected: Digest,
        actual: Digest,
        /// Entries added and removed, when the persisted snapshot was readable.
        diff: Option<SnapshotDiff>,
    },
}

/// The result of verifying one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verification {
    pub target: PathBuf,
    pub outcome: Outcome,
}

impl Verification {
    pub(crate) fn new(target: impl Into<PathBuf>, outcome: Outcome) -> Self {
        Self {
            target: target.into(),
            outcome,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.outcome == Outcome::Valid
    }

    /// Human-readable explanation of the outcome.
    pub fn reason(&self) -> String {
        match &self.outcome {
            Outcome::Valid => "signature valid".to_string(),
            Outcome::SignatureInvalid => {
                "signature does not match: wrong public key or tampered signature".to_string()
            }
            Outcome::ContentDrift { expected, actual } => format!(
                "file content changed since signing (signed {expected}, now {actual})"
            ),
            Outcome::StructuralDrift { diff: Some(diff), .. } => format!(
                "directory structure changed since signing (added: {}; removed: {})",
                list_or_none(&diff.added),
                list_or_none(&diff.removed)
            ),
            Outcome::StructuralDrift { diff: None, .. } => {
                "directory structure changed since signing".to_string()
            }
        }
    }
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

/// Artifacts produced by signing a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSignature {
    pub target: PathBuf,
    pub digest: Digest,
    /// `None` when digest sidecars are disabled.
    pub digest_path: Option<PathBuf>,
    pub signature_path: PathBuf,
}

/// Artifacts produced by signing a directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectorySignature {
    pub target: PathBuf,
    /// Digest of the canonical snapshot bytes.
    pub digest: Digest,
    /// Number of entries in the snapshot.
    pub entries: usize,
    pub snapshot_path: PathBuf,
    pub digest_path: PathBuf,
    pub signature_path: PathBuf,
}

/// Artifacts produced by signing every file of a directory individually.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryFilesSignature {
    pub target: PathBuf,
    pub files: Vec<FileSignature>,
}

/// Per-file status in a [`DirectoryFilesReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FileStatus {
    Verified(Verification),
    /// No signature sidecar exists for this file.
    Unsigned { path: PathBuf },
}

impl FileStatus {
    pub fn is_valid(&self) -> bool {
        matches!(self, FileStatus::Verified(v) if v.is_valid())
    }
}

/// Result of verifying every file of a directory individually.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryFilesReport {
    pub target: PathBuf,
    pub files: Vec<FileStatus>,
    /// Signature sidecars whose file is gone.
    pub orphaned_signatures: Vec<PathBuf>,
}

impl DirectoryFilesReport {
    /// Every file is signed and valid, and no signature is orphaned.
    pub fn all_valid(&self) -> bool {
        self.orphaned_signatures.is_empty() && self.files.iter().all(FileStatus::is_valid)
    }

    /// Files that did not verify, with the reason.
    pub fn failures(&self) -> Vec<(PathBuf, String)> {
        self.files
            .iter()
            .filter(|s| !s.is_valid())
            .map(|s| match s {
                FileStatus::Verified(v) => (v.target.clone(), v.reason()),
                FileStatus::Unsigned { path } => (path.clone(), "not signed".to_string()),
            })
            .collect()
    }
}
