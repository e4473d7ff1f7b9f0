//! # dsign Core
//!
//! Pure primitives for dsign: digests, keys, signatures, and canonical tree
//! snapshots.
//!
//! This crate does not touch the filesystem. Byte streams come in through
//! [`std::io::Read`], keys as PEM text, and directory structure as paths
//! inserted into a [`SnapshotBuilder`]. The `dsign` crate layers key storage,
//! sidecar artifacts, and directory walking on top.
//!
//! ## Key Types
//!
//! - [`Digest`] - 32-byte SHA-256 value, computed by streaming
//! - [`KeyPair`], [`PrivateKey`], [`PublicKey`] - RSA-2048 or ECDSA P-256
//! - [`Signature`] - raw signature bytes (RSA-PSS block or DER ECDSA)
//! - [`TreeSnapshot`] - canonical structural serialization of a directory
//!
//! ## Sign and verify
//!
//! ```rust
//! use dsign_core::{sign, verify, Algorithm, Digest, KeyPair};
//!
//! let pair = KeyPair::generate(Algorithm::EcP256).unwrap();
//! let digest = Digest::hash(b"quarterly report");
//! let signature = sign(&digest, &pair.private_key).unwrap();
//!
//! assert!(verify(&digest, &signature, &pair.public_key).unwrap());
//! assert!(!verify(&Digest::hash(b"tampered"), &signature, &pair.public_key).unwrap());
//! ```

pub mod digest;
pub mod error;
pub mod keys;
pub mod signature;
pub mod snapshot;

pub use digest::{Digest, CHUNK_SIZE, DIGEST_LEN};
pub use error::{CoreError, Result};
pub use keys::{Algorithm, KeyPair, PrivateKey, PublicKey, RSA_BITS};
pub use signature::{sign, sign_with, verify, verify_bytes, Signature};
pub use snapshot::{
    EntryKind, SnapshotBuilder, SnapshotDiff, SnapshotEntry, TreeSnapshot, SNAPSHOT_HEADER,
};
