//! # dsign
//!
//! Sign and verify files and directory trees with RSA-2048 or ECDSA P-256
//! keys.
//!
//! ## Overview
//!
//! - **Files**: the SHA-256 digest of the content is signed; the digest and
//!   signature are written next to the file as `<path>.sha256` and
//!   `<path>.sig`.
//! - **Directories**: a canonical snapshot of the tree's names and entry
//!   kinds is digested and signed; the snapshot, digest and signature are
//!   written inside the directory. File contents are not covered.
//! - **Keys**: PEM key pairs in a key directory, see [`KeyStore`].
//!
//! Verification that runs to completion returns a [`Verification`] whose
//! [`Outcome`] says whether the target is valid and, if not, why. An
//! [`Error`] means verification could not be carried out at all, for example
//! because the signature is missing.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use dsign::{Algorithm, Engine, EngineConfig};
//! use std::path::Path;
//!
//! fn example() -> dsign::Result<()> {
//!     let engine = Engine::new(EngineConfig::default().algorithm(Algorithm::EcP256));
//!     let keys = engine.generate_keys()?;
//!
//!     engine.sign_path(Path::new("release"), &keys.paths.private_key)?;
//!     let verification = engine.verify_path(Path::new("release"), &keys.paths.public_key)?;
//!     println!("{}", verification.reason());
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `dsign::core`: primitives (digests, keys, signatures, snapshots)

pub mod artifacts;
pub mod config;
pub mod engine;
pub mod error;
mod fsutil;
pub mod keystore;
pub mod progress;
pub mod report;
pub mod tree;

pub use dsign_core as core;

pub use config::{EngineConfig, SignatureExtension};
pub use engine::{Engine, Signed};
pub use error::{Error, Result};
pub use keystore::{
    load_private_key, load_private_key_as, load_public_key, load_public_key_as, GeneratedKeys,
    KeyPaths, KeyStatus, KeyStore,
};
pub use progress::{NoProgress, ProgressCounter, ProgressSink};
pub use report::{
    DirectoryFilesReport, DirectoryFilesSignature, DirectorySignature, FileSignature, FileStatus,
    Outcome, Verification,
};

pub use dsign_core::{Algorithm, Digest, KeyPair, PrivateKey, PublicKey, Signature, TreeSnapshot};
