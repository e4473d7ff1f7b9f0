//! The engine: signs and verifies files and directory trees.
//!
//! The engine holds only configuration. Every operation is a transformation
//! from paths and keys to digests, signatures and reports, plus the sidecar
//! files described in [`crate::artifacts`].

use dsign_core::{signature, Digest, PrivateKey, PublicKey, TreeSnapshot};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::Path;
use tracing::{debug, info, instrument, warn};

use crate::artifacts::{self, DirectoryArtifacts, FileArtifacts};
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::fsutil;
use crate::keystore::{self, GeneratedKeys, KeyPaths, KeyStore};
use crate::progress::{NoProgress, ProgressSink};
use crate::report::{
    DirectoryFilesReport, DirectoryFilesSignature, DirectorySignature, FileSignature, FileStatus,
    Outcome, Verification,
};
use crate::tree;

/// What [`Engine::sign_path`] signed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Signed {
    File(FileSignature),
    Directory(DirectorySignature),
}

/// Signs and verifies files and directories.
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
    keys: KeyStore,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let keys = KeyStore::new(config.key_dir.clone());
        Self { config, keys }
    }

    /// Engine configured from defaults plus `DSIGN_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(EngineConfig::default().with_env_overrides()?))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn key_store(&self) -> &KeyStore {
        &self.keys
    }

    /// Ensure the default key pair exists, using the configured algorithm.
    pub fn generate_keys(&self) -> Result<GeneratedKeys> {
        self.keys.generate_default(self.config.algorithm)
    }

    /// Generate the named key pair `name`, using the configured algorithm.
    pub fn generate_named_keys(&self, name: &str) -> Result<KeyPaths> {
        self.keys.generate_named(name, self.config.algorithm)
    }

    /// Sidecar locations for `path` under this engine's configuration.
    pub fn file_artifacts(&self, path: &Path) -> FileArtifacts {
        FileArtifacts::for_file(path, self.config.signature_extension)
    }

    /// Sign one file, writing its digest and signature sidecars.
    pub fn sign_file(&self, path: &Path, key: &PrivateKey) -> Result<FileSignature> {
        self.sign_file_with_progress(path, key, &mut NoProgress)
    }

    /// [`Engine::sign_file`], reporting bytes hashed to `progress`.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn sign_file_with_progress(
        &self,
        path: &Path,
        key: &PrivateKey,
        progress: &mut dyn ProgressSink,
    ) -> Result<FileSignature> {
        let digest = digest_file(path, progress)?;
        let sig = signature::sign_with(&digest, key, self.config.pinned_algorithm)?;
        let artifacts = self.file_artifacts(path);

        // A crash between these steps leaves no signature rather than a
        // signature over an outdated digest.
        if fsutil::remove_if_exists(&artifacts.signature)? {
            debug!(signature = %artifacts.signature.display(), "removed previous signature");
        }
        let digest_path = if self.config.write_digest_sidecar {
            artifacts::write_digest(&artifacts.digest, &digest)?;
            Some(artifacts.digest.clone())
        } else {
            if fsutil::remove_if_exists(&artifacts.digest)? {
                warn!(digest = %artifacts.digest.display(), "removed stale digest sidecar");
            }
            None
        };
        artifacts::write_signature(&artifacts.signature, &sig)?;
        progress.file_done(path);

        info!(%digest, algorithm = %key.algorithm(), "signed file");
        Ok(FileSignature {
            target: path.to_path_buf(),
            digest,
            digest_path,
            signature_path: artifacts.signature,
        })
    }

    /// Verify one file against its signature sidecar.
    pub fn verify_file(&self, path: &Path, key: &PublicKey) -> Result<Verification> {
        let artifacts = self.file_artifacts(path);
        self.verify_file_inner(
            path,
            &artifacts.signature,
            &artifacts.digest,
            key,
            &mut NoProgress,
        )
    }

    /// Verify one file against an explicitly chosen signature file.
    ///
    /// The digest sidecar next to `path` is still consulted to explain a
    /// failed verification.
    pub fn verify_file_with(
        &self,
        path: &Path,
        signature_path: &Path,
        key: &PublicKey,
    ) -> Result<Verification> {
        let artifacts = self.file_artifacts(path);
        self.verify_file_inner(path, signature_path, &artifacts.digest, key, &mut NoProgress)
    }

    /// [`Engine::verify_file`], reporting bytes hashed to `progress`.
    pub fn verify_file_with_progress(
        &self,
        path: &Path,
        key: &PublicKey,
        progress: &mut dyn ProgressSink,
    ) -> Result<Verification> {
        let artifacts = self.file_artifacts(path);
        self.verify_file_inner(path, &artifacts.signature, &artifacts.digest, key, progress)
    }

    #[instrument(skip_all, fields(path = %path.display()))]
    fn verify_file_inner(
        &self,
        path: &Path,
        signature_path: &Path,
        digest_path: &Path,
        key: &PublicKey,
        progress: &mut dyn ProgressSink,
    ) -> Result<Verification> {
        let actual = digest_file(path, progress)?;

        let Some(sig) = artifacts::read_signature(signature_path)? else {
            return Err(Error::ArtifactsMissing {
                target: path.to_path_buf(),
                missing: vec![signature_path.to_path_buf()],
            });
        };

        let outcome = if signature::verify(&actual, &sig, key)? {
            Outcome::Valid
        } else {
            explain_failure(digest_path, actual)
        };
        progress.file_done(path);

        let verification = Verification::new(path, outcome);
        if verification.is_valid() {
            info!("file signature valid");
        } else {
            warn!(reason = %verification.reason(), "file verification failed");
        }
        Ok(verification)
    }

    /// Sign the structure of `dir`.
    ///
    /// Writes the snapshot, its digest and the signature inside `dir`. Only
    /// names and entry kinds are certified, not file contents.
    pub fn sign_directory(&self, dir: &Path, key: &PrivateKey) -> Result<DirectorySignature> {
        self.sign_directory_with_progress(dir, key, &mut NoProgress)
    }

    /// [`Engine::sign_directory`], reporting visited entries to `progress`.
    #[instrument(skip_all, fields(path = %dir.display()))]
    pub fn sign_directory_with_progress(
        &self,
        dir: &Path,
        key: &PrivateKey,
        progress: &mut dyn ProgressSink,
    ) -> Result<DirectorySignature> {
        let snapshot = tree::build_snapshot_with_progress(dir, progress)?;
        let bytes = snapshot.to_bytes();
        let digest = Digest::hash(&bytes);
        progress.bytes_hashed(bytes.len() as u64);
        let sig = signature::sign_with(&digest, key, self.config.pinned_algorithm)?;

        let artifacts = DirectoryArtifacts::for_directory(dir);
        if fsutil::remove_if_exists(&artifacts.signature)? {
            debug!(signature = %artifacts.signature.display(), "removed previous signature");
        }
        fsutil::write_atomic(&artifacts.snapshot, &bytes, false)?;
        artifacts::write_digest(&artifacts.digest, &digest)?;
        artifacts::write_signature(&artifacts.signature, &sig)?;

        info!(%digest, entries = snapshot.len(), "signed directory");
        Ok(DirectorySignature {
            target: dir.to_path_buf(),
            digest,
            entries: snapshot.len(),
            snapshot_path: artifacts.snapshot,
            digest_path: artifacts.digest,
            signature_path: artifacts.signature,
        })
    }

    /// Verify the structure of `dir` against the artifacts written by
    /// [`Engine::sign_directory`].
    #[instrument(skip_all, fields(path = %dir.display()))]
    pub fn verify_directory(&self, dir: &Path, key: &PublicKey) -> Result<Verification> {
        tree::ensure_directory(dir)?;

        let artifacts = DirectoryArtifacts::for_directory(dir);
        let missing = artifacts.missing();
        if !missing.is_empty() {
            return Err(Error::ArtifactsMissing {
                target: dir.to_path_buf(),
                missing,
            });
        }

        let expected = artifacts::read_digest(&artifacts.digest)?.ok_or_else(|| {
            Error::ArtifactsMissing {
                target: dir.to_path_buf(),
                missing: vec![artifacts.digest.clone()],
            }
        })?;
        let sig = artifacts::read_signature(&artifacts.signature)?.ok_or_else(|| {
            Error::ArtifactsMissing {
                target: dir.to_path_buf(),
                missing: vec![artifacts.signature.clone()],
            }
        })?;

        let current = tree::build_snapshot(dir)?;
        let actual = current.digest();
        if actual != expected {
            let diff = persisted_snapshot(&artifacts.snapshot).map(|signed| signed.diff(&current));
            let verification = Verification::new(
                dir,
                Outcome::StructuralDrift {
                    expected,
                    actual,
                    diff,
                },
            );
            warn!(reason = %verification.reason(), "directory structure drifted");
            return Ok(verification);
        }

        let outcome = if signature::verify(&expected, &sig, key)? {
            Outcome::Valid
        } else {
            Outcome::SignatureInvalid
        };
        let verification = Verification::new(dir, outcome);
        if verification.is_valid() {
            info!(entries = current.len(), "directory signature valid");
        } else {
            warn!(reason = %verification.reason(), "directory verification failed");
        }
        Ok(verification)
    }

    /// Sign every regular file under `dir` with its own sidecars.
    ///
    /// This mode is independent of [`Engine::sign_directory`]; the sidecars it
    /// writes become part of the tree's structure.
    #[instrument(skip_all, fields(path = %dir.display()))]
    pub fn sign_directory_files(
        &self,
        dir: &Path,
        key: &PrivateKey,
    ) -> Result<DirectoryFilesSignature> {
        let files = tree::signable_files(dir, self.config.signature_extension)?;
        let signed = files
            .iter()
            .map(|file| self.sign_file(file, key))
            .collect::<Result<Vec<_>>>()?;

        info!(files = signed.len(), "signed directory files");
        Ok(DirectoryFilesSignature {
            target: dir.to_path_buf(),
            files: signed,
        })
    }

    /// Verify every regular file under `dir` against its own sidecars.
    #[instrument(skip_all, fields(path = %dir.display()))]
    pub fn verify_directory_files(
        &self,
        dir: &Path,
        key: &PublicKey,
    ) -> Result<DirectoryFilesReport> {
        let ext = self.config.signature_extension;
        let mut files = Vec::new();
        for file in tree::signable_files(dir, ext)? {
            let artifacts = self.file_artifacts(&file);
            let status = if artifacts.signature.is_file() {
                FileStatus::Verified(self.verify_file(&file, key)?)
            } else {
                FileStatus::Unsigned { path: file }
            };
            files.push(status);
        }
        let orphaned_signatures = tree::orphaned_signatures(dir, ext)?;

        let report = DirectoryFilesReport {
            target: dir.to_path_buf(),
            files,
            orphaned_signatures,
        };
        if report.all_valid() {
            info!(files = report.files.len(), "all directory files valid");
        } else {
            warn!(
                failures = report.failures().len(),
                orphans = report.orphaned_signatures.len(),
                "directory files did not all verify"
            );
        }
        Ok(report)
    }

    /// Load the private key at `private_key_path`, then sign `target` as a
    /// file or a directory depending on what it is.
    pub fn sign_path(&self, target: &Path, private_key_path: &Path) -> Result<Signed> {
        let key = keystore::load_private_key(private_key_path)?;
        if is_directory(target)? {
            self.sign_directory(target, &key).map(Signed::Directory)
        } else {
            self.sign_file(target, &key).map(Signed::File)
        }
    }

    /// Load the public key at `public_key_path`, then verify `target` as a
    /// file or a directory depending on what it is.
    pub fn verify_path(&self, target: &Path, public_key_path: &Path) -> Result<Verification> {
        let key = keystore::load_public_key(public_key_path)?;
        if is_directory(target)? {
            self.verify_directory(target, &key)
        } else {
            self.verify_file(target, &key)
        }
    }
}

fn digest_file(path: &Path, progress: &mut dyn ProgressSink) -> Result<Digest> {
    let file = File::open(path).map_err(|e| Error::unreadable(path, e))?;
    Digest::of_reader_with_progress(file, |n| progress.bytes_hashed(n))
        .map_err(|e| Error::unreadable(path, e))
}

/// Outcome for a signature that did not verify over the current content.
///
/// The digest sidecar only refines the diagnosis: a recorded digest that
/// differs from the current one means the content changed. An unreadable
/// sidecar is ignored.
fn explain_failure(digest_path: &Path, actual: Digest) -> Outcome {
    match artifacts::read_digest(digest_path) {
        Ok(Some(expected)) if expected != actual => {
            warn!(%expected, %actual, "file content drifted");
            Outcome::ContentDrift { expected, actual }
        }
        Ok(_) => Outcome::SignatureInvalid,
        Err(e) => {
            warn!(digest = %digest_path.display(), error = %e, "ignoring unreadable digest sidecar");
            Outcome::SignatureInvalid
        }
    }
}

fn is_directory(path: &Path) -> Result<bool> {
    fs::metadata(path)
        .map(|m| m.is_dir())
        .map_err(|e| Error::unreadable(path, e))
}

/// The snapshot recorded at signing, if it is still readable. Used only for
/// drift diagnostics.
fn persisted_snapshot(path: &Path) -> Option<TreeSnapshot> {
    let text = fs::read_to_string(path).ok()?;
    match TreeSnapshot::parse(&text) {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "persisted snapshot unreadable");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SignatureExtension;
    use crate::progress::ProgressCounter;
    use dsign_core::{Algorithm, KeyPair};
    use std::path::PathBuf;

    fn setup() -> (tempfile::TempDir, Engine, KeyPair) {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::default()
            .key_dir(dir.path().join("keys"))
            .algorithm(Algorithm::EcP256);
        let pair = KeyPair::generate(Algorithm::EcP256).unwrap();
        (dir, Engine::new(config), pair)
    }

    fn make_tree(root: &Path) -> PathBuf {
        let proj = root.join("proj");
        fs::create_dir_all(proj.join("sub")).unwrap();
        fs::write(proj.join("a.txt"), "alpha").unwrap();
        fs::write(proj.join("sub/b.txt"), "beta").unwrap();
        proj
    }

    #[test]
    fn test_sign_and_verify_file() {
        let (dir, engine, pair) = setup();
        let file = dir.path().join("doc.txt");
        fs::write(&file, "hello").unwrap();

        let signed = engine.sign_file(&file, &pair.private_key).unwrap();
        assert_eq!(signed.digest, Digest::hash(b"hello"));
        assert_eq!(signed.signature_path, dir.path().join("doc.txt.sig"));
        assert_eq!(signed.digest_path, Some(dir.path().join("doc.txt.sha256")));

        let v = engine.verify_file(&file, &pair.public_key).unwrap();
        assert!(v.is_valid(), "{}", v.reason());
    }

    #[test]
    fn test_modified_file_is_content_drift() {
        let (dir, engine, pair) = setup();
        let file = dir.path().join("doc.txt");
        fs::write(&file, "hello").unwrap();
        engine.sign_file(&file, &pair.private_key).unwrap();

        fs::write(&file, "hello!").unwrap();
        let v = engine.verify_file(&file, &pair.public_key).unwrap();
        assert_eq!(
            v.outcome,
            Outcome::ContentDrift {
                expected: Digest::hash(b"hello"),
                actual: Digest::hash(b"hello!"),
            }
        );
    }

    #[test]
    fn test_modified_file_without_digest_sidecar() {
        let (dir, engine, pair) = setup();
        let file = dir.path().join("doc.txt");
        fs::write(&file, "hello").unwrap();
        engine.sign_file(&file, &pair.private_key).unwrap();
        fs::remove_file(dir.path().join("doc.txt.sha256")).unwrap();

        fs::write(&file, "hello!").unwrap();
        let v = engine.verify_file(&file, &pair.public_key).unwrap();
        assert_eq!(v.outcome, Outcome::SignatureInvalid);
    }

    #[test]
    fn test_wrong_key_is_signature_invalid() {
        let (dir, engine, pair) = setup();
        let other = KeyPair::generate(Algorithm::EcP256).unwrap();
        let file = dir.path().join("doc.txt");
        fs::write(&file, "hello").unwrap();
        engine.sign_file(&file, &pair.private_key).unwrap();

        let v = engine.verify_file(&file, &other.public_key).unwrap();
        assert_eq!(v.outcome, Outcome::SignatureInvalid);
    }

    #[test]
    fn test_missing_signature_cannot_verify() {
        let (dir, engine, pair) = setup();
        let file = dir.path().join("doc.txt");
        fs::write(&file, "hello").unwrap();

        let err = engine.verify_file(&file, &pair.public_key).unwrap_err();
        assert!(matches!(err, Error::ArtifactsMissing { ref missing, .. }
            if missing == &vec![dir.path().join("doc.txt.sig")]));
    }

    #[test]
    fn test_missing_source_is_unreadable() {
        let (dir, engine, pair) = setup();
        let err = engine
            .sign_file(&dir.path().join("nope.txt"), &pair.private_key)
            .unwrap_err();
        assert!(matches!(err, Error::IoUnreadable { .. }));
    }

    #[test]
    fn test_verify_file_with_explicit_signature() {
        let (dir, engine, pair) = setup();
        let file = dir.path().join("doc.txt");
        fs::write(&file, "hello").unwrap();
        let signed = engine.sign_file(&file, &pair.private_key).unwrap();

        let moved = dir.path().join("elsewhere.bin");
        fs::rename(&signed.signature_path, &moved).unwrap();
        assert!(engine.verify_file(&file, &pair.public_key).is_err());
        let v = engine
            .verify_file_with(&file, &moved, &pair.public_key)
            .unwrap();
        assert!(v.is_valid());
    }

    #[test]
    fn test_corrupt_digest_sidecar_is_ignored() {
        let (dir, engine, pair) = setup();
        let file = dir.path().join("report.txt");
        fs::write(&file, "hello").unwrap();
        let signed = engine.sign_file(&file, &pair.private_key).unwrap();
        let digest_path = signed.digest_path.unwrap();

        fs::write(&digest_path, "garbage\n").unwrap();
        let v = engine.verify_file(&file, &pair.public_key).unwrap();
        assert_eq!(v.outcome, Outcome::Valid);

        fs::write(&file, "hello!").unwrap();
        let v = engine.verify_file(&file, &pair.public_key).unwrap();
        assert_eq!(v.outcome, Outcome::SignatureInvalid);
    }

    #[test]
    fn test_stale_digest_sidecar_does_not_override_explicit_signature() {
        let (dir, engine, pair) = setup();
        let file = dir.path().join("doc.txt");
        fs::write(&file, "current").unwrap();
        let signed = engine.sign_file(&file, &pair.private_key).unwrap();

        let chosen = dir.path().join("doc.release.bin");
        fs::rename(&signed.signature_path, &chosen).unwrap();
        fs::write(
            dir.path().join("doc.txt.sha256"),
            format!("{}\n", Digest::hash(b"previous").to_hex()),
        )
        .unwrap();

        let v = engine
            .verify_file_with(&file, &chosen, &pair.public_key)
            .unwrap();
        assert_eq!(v.outcome, Outcome::Valid);
    }

    #[test]
    fn test_signed_extension_and_no_digest_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = EngineConfig::default().signature_extension(SignatureExtension::Signed);
        config.write_digest_sidecar = false;
        let engine = Engine::new(config);
        let pair = KeyPair::generate(Algorithm::EcP256).unwrap();

        let file = dir.path().join("doc.txt");
        fs::write(&file, "hello").unwrap();
        fs::write(dir.path().join("doc.txt.sha256"), "stale\n").unwrap();

        let signed = engine.sign_file(&file, &pair.private_key).unwrap();
        assert_eq!(signed.signature_path, dir.path().join("doc.txt.signed"));
        assert_eq!(signed.digest_path, None);
        assert!(!dir.path().join("doc.txt.sha256").exists());
        assert!(engine.verify_file(&file, &pair.public_key).unwrap().is_valid());
    }

    #[test]
    fn test_pinned_algorithm_refuses_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Engine::new(EngineConfig::default().pin_algorithm(Algorithm::Rsa2048));
        let pair = KeyPair::generate(Algorithm::EcP256).unwrap();
        let file = dir.path().join("doc.txt");
        fs::write(&file, "hello").unwrap();

        let err = engine.sign_file(&file, &pair.private_key).unwrap_err();
        assert!(matches!(err, Error::KeyUnusable(_)));
        assert!(!dir.path().join("doc.txt.sig").exists());
    }

    #[test]
    fn test_progress_reports_bytes() {
        let (dir, engine, pair) = setup();
        let file = dir.path().join("big.bin");
        fs::write(&file, vec![7u8; 20_000]).unwrap();

        let mut counter = ProgressCounter::default();
        engine
            .sign_file_with_progress(&file, &pair.private_key, &mut counter)
            .unwrap();
        assert_eq!(counter.bytes, 20_000);
        assert_eq!(counter.files, 1);
    }

    #[test]
    fn test_sign_and_verify_directory() {
        let (dir, engine, pair) = setup();
        let proj = make_tree(dir.path());

        let signed = engine.sign_directory(&proj, &pair.private_key).unwrap();
        assert_eq!(signed.entries, 3);
        assert_eq!(
            fs::read_to_string(&signed.snapshot_path).unwrap(),
            "dsign-tree v1\nf a.txt\nd sub\n  f b.txt\n"
        );

        let v = engine.verify_directory(&proj, &pair.public_key).unwrap();
        assert!(v.is_valid(), "{}", v.reason());

        // contents are not certified
        fs::write(proj.join("a.txt"), "changed").unwrap();
        assert!(engine.verify_directory(&proj, &pair.public_key).unwrap().is_valid());
    }

    #[test]
    fn test_directory_structural_drift() {
        let (dir, engine, pair) = setup();
        let proj = make_tree(dir.path());
        engine.sign_directory(&proj, &pair.private_key).unwrap();

        fs::write(proj.join("sub/c.txt"), "gamma").unwrap();
        fs::remove_file(proj.join("a.txt")).unwrap();
        let v = engine.verify_directory(&proj, &pair.public_key).unwrap();
        match v.outcome {
            Outcome::StructuralDrift { diff: Some(diff), .. } => {
                assert_eq!(diff.added, vec!["sub/c.txt".to_string()]);
                assert_eq!(diff.removed, vec!["a.txt".to_string()]);
            }
            other => panic!("expected structural drift, got {other:?}"),
        }
    }

    #[test]
    fn test_directory_tampered_signature() {
        let (dir, engine, pair) = setup();
        let proj = make_tree(dir.path());
        engine.sign_directory(&proj, &pair.private_key).unwrap();

        // a valid signature over a different digest
        let forged = signature::sign(&Digest::hash(b"other"), &pair.private_key).unwrap();
        fs::write(proj.join(artifacts::TREE_SIGNATURE_FILE), forged.as_bytes()).unwrap();

        let v = engine.verify_directory(&proj, &pair.public_key).unwrap();
        assert_eq!(v.outcome, Outcome::SignatureInvalid);
    }

    #[test]
    fn test_directory_missing_artifacts() {
        let (dir, engine, pair) = setup();
        let proj = make_tree(dir.path());
        engine.sign_directory(&proj, &pair.private_key).unwrap();
        fs::remove_file(proj.join(artifacts::TREE_SIGNATURE_FILE)).unwrap();

        let err = engine.verify_directory(&proj, &pair.public_key).unwrap_err();
        match err {
            Error::ArtifactsMissing { target, missing } => {
                assert_eq!(target, proj);
                assert_eq!(missing, vec![proj.join(artifacts::TREE_SIGNATURE_FILE)]);
            }
            other => panic!("expected ArtifactsMissing, got {other:?}"),
        }
    }

    #[test]
    fn test_verify_missing_directory() {
        let (dir, engine, pair) = setup();
        let err = engine
            .verify_directory(&dir.path().join("nope"), &pair.public_key)
            .unwrap_err();
        assert!(matches!(err, Error::IoUnreadable { .. }));
    }

    #[test]
    fn test_resigning_directory_is_stable() {
        let (dir, engine, pair) = setup();
        let proj = make_tree(dir.path());
        let first = engine.sign_directory(&proj, &pair.private_key).unwrap();
        let second = engine.sign_directory(&proj, &pair.private_key).unwrap();
        assert_eq!(first.digest, second.digest);
        assert!(engine.verify_directory(&proj, &pair.public_key).unwrap().is_valid());
    }

    #[test]
    fn test_directory_files_mode() {
        let (dir, engine, pair) = setup();
        let proj = make_tree(dir.path());

        let signed = engine.sign_directory_files(&proj, &pair.private_key).unwrap();
        assert_eq!(signed.files.len(), 2);

        let report = engine.verify_directory_files(&proj, &pair.public_key).unwrap();
        assert!(report.all_valid());

        fs::write(proj.join("sub/b.txt"), "tampered").unwrap();
        fs::write(proj.join("new.txt"), "unsigned").unwrap();
        fs::remove_file(proj.join("a.txt")).unwrap();
        let report = engine.verify_directory_files(&proj, &pair.public_key).unwrap();
        assert!(!report.all_valid());
        assert_eq!(report.orphaned_signatures, vec![proj.join("a.txt.sig")]);
        assert!(report
            .files
            .contains(&FileStatus::Unsigned { path: proj.join("new.txt") }));
        assert_eq!(report.failures().len(), 2);
    }

    #[test]
    fn test_directory_files_mode_signs_lookalike_user_files() {
        let (dir, engine, pair) = setup();
        let proj = dir.path().join("proj");
        fs::create_dir_all(&proj).unwrap();
        fs::write(proj.join("a.txt"), "alpha").unwrap();
        fs::write(proj.join("checksums.sha256"), "abc123  a.txt\n").unwrap();
        fs::write(proj.join("release.sig"), "detached signature bytes").unwrap();

        let signed = engine.sign_directory_files(&proj, &pair.private_key).unwrap();
        assert_eq!(signed.files.len(), 3);
        assert!(proj.join("checksums.sha256.sig").is_file());
        assert!(proj.join("release.sig.sig").is_file());

        let report = engine.verify_directory_files(&proj, &pair.public_key).unwrap();
        assert!(report.all_valid());

        fs::write(proj.join("checksums.sha256"), "TAMPERED").unwrap();
        let report = engine.verify_directory_files(&proj, &pair.public_key).unwrap();
        assert!(report.orphaned_signatures.is_empty());
        assert_eq!(report.files.len(), 3);
        let drifted: Vec<_> = report
            .files
            .iter()
            .filter_map(|status| match status {
                FileStatus::Verified(v) if matches!(v.outcome, Outcome::ContentDrift { .. }) => {
                    Some(v.target.clone())
                }
                _ => None,
            })
            .collect();
        assert_eq!(drifted, vec![proj.join("checksums.sha256")]);
    }

    #[test]
    fn test_sign_and_verify_paths() {
        let (dir, engine, _) = setup();
        let keys = engine.generate_keys().unwrap();
        let proj = make_tree(dir.path());
        let file = proj.join("a.txt");

        let signed = engine.sign_path(&proj, &keys.paths.private_key).unwrap();
        assert!(matches!(signed, Signed::Directory(_)));
        let signed = engine.sign_path(&file, &keys.paths.private_key).unwrap();
        assert!(matches!(signed, Signed::File(_)));

        // the file sidecars changed the tree's structure
        let v = engine.verify_path(&proj, &keys.paths.public_key).unwrap();
        assert!(matches!(v.outcome, Outcome::StructuralDrift { .. }));
        assert!(engine
            .verify_path(&file, &keys.paths.public_key)
            .unwrap()
            .is_valid());

        let err = engine
            .verify_path(&file, &dir.path().join("missing.pem"))
            .unwrap_err();
        assert!(matches!(err, Error::KeyNotFound(_)));
    }
}
