//! Key pairs on disk.
//!
//! Layout inside the key directory:
//! - default pair: `private_key.pem`, `public_key.pem`
//! - named pairs: `<name>_private.pem`, `<name>_public.pem`
//!
//! Private keys are unencrypted PKCS#8 PEM written with mode 0600; public keys
//! are SubjectPublicKeyInfo PEM.

use dsign_core::{Algorithm, KeyPair, PrivateKey, PublicKey};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

use crate::error::{Error, Result};
use crate::fsutil;

/// File name of the default private key.
pub const DEFAULT_PRIVATE_KEY: &str = "private_key.pem";
/// File name of the default public key.
pub const DEFAULT_PUBLIC_KEY: &str = "public_key.pem";

/// Where one key pair lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPaths {
    pub private_key: PathBuf,
    pub public_key: PathBuf,
}

/// What [`KeyStore::generate_default`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyStatus {
    /// A fresh pair was written.
    Created,
    /// Both files were already present; nothing was written.
    Existing,
    /// Only the private key was present; its public half was re-derived.
    PublicKeyRestored,
}

/// Outcome of default key generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedKeys {
    pub paths: KeyPaths,
    pub status: KeyStatus,
}

/// A directory of PEM key pairs.
#[derive(Debug, Clone)]
pub struct KeyStore {
    dir: PathBuf,
}

impl KeyStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn default_paths(&self) -> KeyPaths {
        KeyPaths {
            private_key: self.dir.join(DEFAULT_PRIVATE_KEY),
            public_key: self.dir.join(DEFAULT_PUBLIC_KEY),
        }
    }

    /// Paths of the pair called `name`.
    pub fn named_paths(&self, name: &str) -> Result<KeyPaths> {
        validate_name(name)?;
        Ok(KeyPaths {
            private_key: self.dir.join(format!("{name}_private.pem")),
            public_key: self.dir.join(format!("{name}_public.pem")),
        })
    }

    /// Ensure the default key pair exists.
    ///
    /// Idempotent: an existing private key is never overwritten. If the
    /// public key is missing it is derived from the private key. A lone
    /// public key cannot be used for signing, so a fresh pair replaces it.
    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    pub fn generate_default(&self, algorithm: Algorithm) -> Result<GeneratedKeys> {
        let paths = self.default_paths();
        let have_private = exists(&paths.private_key)?;
        let have_public = exists(&paths.public_key)?;

        let status = match (have_private, have_public) {
            (true, true) => KeyStatus::Existing,
            (true, false) => {
                let private_key = load_private_key(&paths.private_key)?;
                write_public(&paths.public_key, &private_key.public_key())?;
                info!(path = %paths.public_key.display(), "re-derived default public key");
                KeyStatus::PublicKeyRestored
            }
            (false, _) => {
                if have_public {
                    warn!(
                        path = %paths.public_key.display(),
                        "default public key has no private key, replacing pair"
                    );
                }
                let pair = KeyPair::generate(algorithm)?;
                write_pair(&self.dir, &paths, &pair)?;
                info!(%algorithm, "generated default key pair");
                KeyStatus::Created
            }
        };

        Ok(GeneratedKeys { paths, status })
    }

    /// Generate a pair called `name`, overwriting any pair of the same name.
    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    pub fn generate_named(&self, name: &str, algorithm: Algorithm) -> Result<KeyPaths> {
        let paths = self.named_paths(name)?;
        if exists(&paths.private_key)? || exists(&paths.public_key)? {
            warn!(name, "overwriting existing key pair");
        }

        let pair = KeyPair::generate(algorithm)?;
        write_pair(&self.dir, &paths, &pair)?;
        info!(name, %algorithm, "generated key pair");
        Ok(paths)
    }
}

/// Load a PEM private key of either algorithm.
pub fn load_private_key(path: &Path) -> Result<PrivateKey> {
    let pem = read_key(path)?;
    PrivateKey::from_pem(&pem).map_err(|e| malformed(path, e))
}

/// Load a PEM private key, requiring `algorithm`.
pub fn load_private_key_as(path: &Path, algorithm: Algorithm) -> Result<PrivateKey> {
    let pem = read_key(path)?;
    PrivateKey::from_pem_as(&pem, algorithm).map_err(|e| malformed(path, e))
}

/// Load a PEM public key of either algorithm.
pub fn load_public_key(path: &Path) -> Result<PublicKey> {
    let pem = read_key(path)?;
    PublicKey::from_pem(&pem).map_err(|e| malformed(path, e))
}

/// Load a PEM public key, requiring `algorithm`.
pub fn load_public_key_as(path: &Path, algorithm: Algorithm) -> Result<PublicKey> {
    let pem = read_key(path)?;
    PublicKey::from_pem_as(&pem, algorithm).map_err(|e| malformed(path, e))
}

fn read_key(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(pem) => Ok(pem),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(Error::KeyNotFound(path.to_path_buf())),
        Err(e) if e.kind() == io::ErrorKind::InvalidData => Err(Error::KeyMalformed {
            path: path.to_path_buf(),
            reason: "not UTF-8 text".into(),
        }),
        Err(e) => Err(Error::unreadable(path, e)),
    }
}

fn malformed(path: &Path, e: dsign_core::CoreError) -> Error {
    Error::KeyMalformed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

fn write_pair(dir: &Path, paths: &KeyPaths, pair: &KeyPair) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| Error::write(dir, e))?;
    let private_pem = pair.private_key.to_pem()?;
    fsutil::write_atomic(&paths.private_key, private_pem.as_bytes(), true)?;
    write_public(&paths.public_key, &pair.public_key)
}

fn write_public(path: &Path, key: &PublicKey) -> Result<()> {
    let pem = key.to_pem()?;
    fsutil::write_atomic(path, pem.as_bytes(), false)
}

fn exists(path: &Path) -> Result<bool> {
    path.try_exists().map_err(|e| Error::unreadable(path, e))
}

fn validate_name(name: &str) -> Result<()> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0'])
        || name.contains(std::path::MAIN_SEPARATOR);
    if bad {
        return Err(Error::InvalidKeyName(name.to_string()));
    }
    Ok(())
}
