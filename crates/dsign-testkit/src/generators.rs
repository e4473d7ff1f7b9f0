//! Proptest generators for property-based testing.

use proptest::prelude::*;
use std::collections::BTreeSet;

use dsign_core::{Algorithm, Digest, EntryKind};

/// Generate an algorithm.
pub fn algorithm() -> impl Strategy<Value = Algorithm> {
    prop_oneof![Just(Algorithm::Rsa2048), Just(Algorithm::EcP256)]
}

/// Generate a random digest.
pub fn digest() -> impl Strategy<Value = Digest> {
    any::<[u8; 32]>().prop_map(Digest)
}

/// Generate payload bytes of specified max length.
pub fn payload(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// A directory name. Never contains a dot, so it cannot collide with a
/// [`file_name`].
pub fn dir_name() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_-]{1,8}".prop_map(String::from)
}

/// A file name with a `.txt` extension.
pub fn file_name() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_-]{1,8}".prop_map(|stem| format!("{stem}.txt"))
}

/// A snapshot entry name that may need escaping.
pub fn tricky_name() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 .\\\\\n\r\u{e9}\u{1f600}-]{1,12}"
        .prop_filter("reserved name", |s| s != "." && s != "..")
}

/// A relative file path: up to three directories then a file.
pub fn relative_file() -> impl Strategy<Value = String> {
    (prop::collection::vec(dir_name(), 0..3), file_name()).prop_map(|(dirs, file)| {
        let mut parts = dirs;
        parts.push(file);
        parts.join("/")
    })
}

/// The shape of a directory tree: files (with parents implied) plus empty
/// directories. Paths are `/`-separated and relative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeLayout {
    pub files: BTreeSet<String>,
    pub empty_dirs: BTreeSet<String>,
}

impl TreeLayout {
    /// Entries as they would be inserted into a snapshot builder.
    pub fn entries(&self) -> Vec<(String, EntryKind)> {
        self.files
            .iter()
            .map(|f| (f.clone(), EntryKind::File))
            .chain(self.empty_dirs.iter().map(|d| (d.clone(), EntryKind::Directory)))
            .collect()
    }
}

/// Generate a tree layout with up to `max_files` files.
pub fn tree_layout(max_files: usize) -> impl Strategy<Value = TreeLayout> {
    (
        prop::collection::btree_set(relative_file(), 0..=max_files),
        prop::collection::btree_set(dir_name(), 0..3),
    )
        .prop_map(|(files, dirs)| {
            // an "empty" directory must not already be a parent of some file
            let empty_dirs = dirs
                .into_iter()
                .filter(|d| !files.iter().any(|f| f.starts_with(&format!("{d}/"))))
                .collect();
            TreeLayout { files, empty_dirs }
        })
}
