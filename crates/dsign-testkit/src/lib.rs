//! # dsign testkit
//!
//! Testing utilities for dsign.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: SHA-256 known answers and canonical snapshot texts
//! - **Generators**: Proptest strategies for names, tree layouts and algorithms
//! - **Fixtures**: Temporary workspaces with an engine, key pairs and trees
//!
//! ## Golden Vectors
//!
//! ```rust
//! use dsign_testkit::vectors::verify_all_vectors;
//!
//! assert!(verify_all_vectors().is_empty());
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use dsign_testkit::{generators::tree_layout, TestWorkspace};
//!
//! proptest! {
//!     #[test]
//!     fn signed_trees_verify(layout in tree_layout(8)) {
//!         let ws = TestWorkspace::new();
//!         let keys = ws.keys("prop");
//!         let root = ws.materialize("tree", &layout);
//!         ws.engine.sign_directory(&root, &keys.private_key).unwrap();
//!         prop_assert!(ws.engine.verify_directory(&root, &keys.public_key).unwrap().is_valid());
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use dsign_testkit::TestWorkspace;
//!
//! let ws = TestWorkspace::new();
//! let keys = ws.keys("alice");
//! let file = ws.write("report.txt", "quarterly numbers");
//! ws.engine.sign_file(&file, &keys.private_key).unwrap();
//! assert!(ws.engine.verify_file(&file, &keys.public_key).unwrap().is_valid());
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{parties, TestKeys, TestWorkspace};
pub use generators::TreeLayout;
pub use vectors::{digest_vectors, snapshot_vectors, verify_all_vectors, DigestVector, SnapshotVector};
