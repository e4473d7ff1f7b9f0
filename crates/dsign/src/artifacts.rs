//! Sidecar artifact locations and I/O.
//!
//! Per file:
//! - `<path>.sha256`: hex digest followed by a newline
//! - `<path>.sig` (or `.signed`): raw signature bytes
//!
//! Per directory, inside the directory:
//! - `.dsign-tree`: canonical snapshot text
//! - `.dsign-tree.sha256`: hex digest of the snapshot followed by a newline
//! - `.dsign-tree.sig`: raw signature over that digest
//!
//! Signatures are always written last, so an interrupted sign operation never
//! leaves a signature without the digest it covers.

use dsign_core::{Digest, Signature};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::config::SignatureExtension;
use crate::error::{Error, Result};
use crate::fsutil;

/// Extension of digest sidecars.
pub const DIGEST_EXTENSION: &str = "sha256";

/// Snapshot text written inside a signed directory.
pub const TREE_SNAPSHOT_FILE: &str = ".dsign-tree";
/// Hex digest of the snapshot.
pub const TREE_DIGEST_FILE: &str = ".dsign-tree.sha256";
/// Signature over the snapshot digest.
pub const TREE_SIGNATURE_FILE: &str = ".dsign-tree.sig";

/// Whether a top-level directory entry is one of the directory artifacts.
pub fn is_tree_artifact(name: &OsStr) -> bool {
    name == TREE_SNAPSHOT_FILE || name == TREE_DIGEST_FILE || name == TREE_SIGNATURE_FILE
}

/// Sidecar paths for a single signed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileArtifacts {
    pub digest: PathBuf,
    pub signature: PathBuf,
}

impl FileArtifacts {
    pub fn for_file(path: &Path, ext: SignatureExtension) -> Self {
        Self {
            digest: append_extension(path, DIGEST_EXTENSION),
            signature: append_extension(path, ext.as_str()),
        }
    }
}

/// Artifact paths for a signed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryArtifacts {
    pub snapshot: PathBuf,
    pub digest: PathBuf,
    pub signature: PathBuf,
}

impl DirectoryArtifacts {
    pub fn for_directory(dir: &Path) -> Self {
        Self {
            snapshot: dir.join(TREE_SNAPSHOT_FILE),
            digest: dir.join(TREE_DIGEST_FILE),
            signature: dir.join(TREE_SIGNATURE_FILE),
        }
    }

    /// Artifacts that do not exist on disk.
    pub fn missing(&self) -> Vec<PathBuf> {
        [&self.snapshot, &self.digest, &self.signature]
            .into_iter()
            .filter(|p| !p.is_file())
            .cloned()
            .collect()
    }
}

/// `report.txt` + `sig` → `report.txt.sig`.
pub fn append_extension(path: &Path, ext: &str) -> PathBuf {
    let mut s = path.as_os_str().to_owned();
    s.push(".");
    s.push(ext);
    PathBuf::from(s)
}

pub(crate) fn write_digest(path: &Path, digest: &Digest) -> Result<()> {
    let mut text = digest.to_hex();
    text.push('\n');
    fsutil::write_atomic(path, text.as_bytes(), false)
}

pub(crate) fn write_signature(path: &Path, signature: &Signature) -> Result<()> {
    fsutil::write_atomic(path, signature.as_bytes(), false)
}

/// Read a digest sidecar. `None` if absent.
pub(crate) fn read_digest(path: &Path) -> Result<Option<Digest>> {
    let Some(bytes) = fsutil::read_optional(path)? else {
        return Ok(None);
    };
    let text = std::str::from_utf8(&bytes)
        .map_err(|_| Error::DigestMalformed(format!("{} is not UTF-8", path.display())))?;
    Digest::from_hex(text)
        .map(Some)
        .map_err(|e| Error::DigestMalformed(format!("{}: {e}", path.display())))
}

/// Read a signature sidecar. `None` if absent.
pub(crate) fn read_signature(path: &Path) -> Result<Option<Signature>> {
    Ok(fsutil::read_optional(path)?.map(Signature::from_bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_artifact_names() {
        let a = FileArtifacts::for_file(Path::new("docs/report.txt"), SignatureExtension::Sig);
        assert_eq!(a.digest, PathBuf::from("docs/report.txt.sha256"));
        assert_eq!(a.signature, PathBuf::from("docs/report.txt.sig"));

        let b = FileArtifacts::for_file(Path::new("report"), SignatureExtension::Signed);
        assert_eq!(b.signature, PathBuf::from("report.signed"));
    }

    #[test]
    fn test_directory_artifacts_missing() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = DirectoryArtifacts::for_directory(dir.path());
        assert_eq!(artifacts.missing().len(), 3);

        std::fs::write(&artifacts.snapshot, "dsign-tree v1\n").unwrap();
        std::fs::write(&artifacts.digest, "00\n").unwrap();
        assert_eq!(artifacts.missing(), vec![artifacts.signature.clone()]);
    }

    #[test]
    fn test_digest_sidecar_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.sha256");
        assert!(read_digest(&path).unwrap().is_none());

        let digest = Digest::hash(b"content");
        write_digest(&path, &digest).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            format!("{}\n", digest.to_hex())
        );
        assert_eq!(read_digest(&path).unwrap(), Some(digest));

        std::fs::write(&path, "not hex").unwrap();
        assert!(matches!(read_digest(&path), Err(Error::DigestMalformed(_))));
    }

    #[test]
    fn test_tree_artifact_names() {
        assert!(is_tree_artifact(OsStr::new(".dsign-tree")));
        assert!(is_tree_artifact(OsStr::new(".dsign-tree.sig")));
        assert!(!is_tree_artifact(OsStr::new("a.txt.sig")));
    }
}
