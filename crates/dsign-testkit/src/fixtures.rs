//! Test fixtures and helpers.
//!
//! A [`TestWorkspace`] is a temporary directory with an [`Engine`] whose key
//! directory lives inside it. Everything is removed when the workspace drops.

use std::fs;
use std::path::{Path, PathBuf};

use dsign::{Engine, EngineConfig, KeyPaths};
use dsign_core::{Algorithm, PrivateKey, PublicKey};
use tempfile::TempDir;

use crate::generators::TreeLayout;

/// A named key pair written to the workspace key directory.
#[derive(Debug, Clone)]
pub struct TestKeys {
    pub paths: KeyPaths,
    pub private_key: PrivateKey,
    pub public_key: PublicKey,
}

/// A temporary workspace with an engine and key directory.
pub struct TestWorkspace {
    dir: TempDir,
    pub engine: Engine,
}

impl TestWorkspace {
    /// Workspace generating EC P-256 keys, which are fast to create.
    pub fn new() -> Self {
        Self::with_algorithm(Algorithm::EcP256)
    }

    pub fn with_algorithm(algorithm: Algorithm) -> Self {
        Self::with_config(|config| config.algorithm(algorithm))
    }

    /// Workspace whose config is adjusted by `configure`. The key directory
    /// is always `<workspace>/keys`.
    pub fn with_config(configure: impl FnOnce(EngineConfig) -> EngineConfig) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config = configure(EngineConfig::default()).key_dir(dir.path().join("keys"));
        Self {
            dir,
            engine: Engine::new(config),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Write a file, creating parent directories.
    pub fn write(&self, relative: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, contents).expect("write file");
        path
    }

    /// Append bytes to an existing file.
    pub fn append(&self, relative: &str, extra: &[u8]) {
        let path = self.path(relative);
        let mut contents = fs::read(&path).expect("read file");
        contents.extend_from_slice(extra);
        fs::write(&path, contents).expect("write file");
    }

    pub fn mkdir(&self, relative: &str) -> PathBuf {
        let path = self.path(relative);
        fs::create_dir_all(&path).expect("create dir");
        path
    }

    /// Create a tree under `relative`. Entries ending in `/` are directories;
    /// anything else is a file whose content is its own path.
    pub fn tree(&self, relative: &str, entries: &[&str]) -> PathBuf {
        let root = self.mkdir(relative);
        for entry in entries {
            match entry.strip_suffix('/') {
                Some(dir) => {
                    self.mkdir(&format!("{relative}/{dir}"));
                }
                None => {
                    self.write(&format!("{relative}/{entry}"), entry.as_bytes());
                }
            }
        }
        root
    }

    /// Materialize a generated layout under `relative`.
    pub fn materialize(&self, relative: &str, layout: &TreeLayout) -> PathBuf {
        let root = self.mkdir(relative);
        for file in &layout.files {
            self.write(&format!("{relative}/{file}"), file.as_bytes());
        }
        for dir in &layout.empty_dirs {
            self.mkdir(&format!("{relative}/{dir}"));
        }
        root
    }

    /// Generate the named key pair `name` and load both halves back.
    pub fn keys(&self, name: &str) -> TestKeys {
        let paths = self
            .engine
            .generate_named_keys(name)
            .expect("generate key pair");
        let private_key = dsign::load_private_key(&paths.private_key).expect("load private key");
        let public_key = dsign::load_public_key(&paths.public_key).expect("load public key");
        TestKeys {
            paths,
            private_key,
            public_key,
        }
    }
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

/// Named key pairs for several parties in one workspace.
pub fn parties(workspace: &TestWorkspace, names: &[&str]) -> Vec<TestKeys> {
    names.iter().map(|name| workspace.keys(name)).collect()
}
