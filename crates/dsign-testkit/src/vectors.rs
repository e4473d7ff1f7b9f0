//! Golden test vectors.
//!
//! SHA-256 known answers and canonical snapshot texts. Any implementation of
//! the snapshot format must reproduce these bytes and digests exactly.

use dsign_core::{Digest, EntryKind, SnapshotBuilder, TreeSnapshot};

/// A SHA-256 known-answer test.
#[derive(Debug, Clone)]
pub struct DigestVector {
    pub name: &'static str,
    /// Input is `chunk` repeated `repeat` times.
    pub chunk: &'static [u8],
    pub repeat: usize,
    /// Expected digest (hex).
    pub sha256: &'static str,
}

impl DigestVector {
    pub fn input(&self) -> Vec<u8> {
        self.chunk.repeat(self.repeat)
    }
}

/// FIPS 180-2 examples plus the empty input.
pub fn digest_vectors() -> Vec<DigestVector> {
    vec![
        DigestVector {
            name: "empty",
            chunk: b"",
            repeat: 1,
            sha256: "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
        },
        DigestVector {
            name: "abc",
            chunk: b"abc",
            repeat: 1,
            sha256: "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad",
        },
        DigestVector {
            name: "two blocks",
            chunk: b"abcdbcdecdefdefgefghfghighijhijkijkljklmklmnlmnomnopnopq",
            repeat: 1,
            sha256: "248d6a61d20638b8e5c026930c3e6039a33ce45964ff2167f6ecedd419db06c1",
        },
        DigestVector {
            name: "one million a",
            chunk: b"a",
            repeat: 1_000_000,
            sha256: "cdc76e5c9914fb9281a1c7e284d73e67f1809a48a497200e046d39ccc7112cd0",
        },
    ]
}

/// A canonical snapshot for a known set of entries.
#[derive(Debug, Clone)]
pub struct SnapshotVector {
    pub name: &'static str,
    /// `/`-separated relative paths and their kinds, in no particular order.
    pub entries: &'static [(&'static str, EntryKind)],
    /// Expected canonical text.
    pub text: &'static str,
    /// Expected SHA-256 of `text` (hex).
    pub sha256: &'static str,
}

impl SnapshotVector {
    /// Build the snapshot from `entries`.
    pub fn build(&self) -> TreeSnapshot {
        let mut builder = SnapshotBuilder::new();
        for (path, kind) in self.entries {
            builder
                .insert_path(path, *kind)
                .unwrap_or_else(|e| panic!("vector {}: {e}", self.name));
        }
        builder.build()
    }
}

pub fn snapshot_vectors() -> Vec<SnapshotVector> {
    vec![
        SnapshotVector {
            name: "empty directory",
            entries: &[],
            text: "dsign-tree v1\n",
            sha256: "d9d527378b8f9085946d22e0ce703a8e77ddd22e144f670651b2b5c5482b3097",
        },
        SnapshotVector {
            name: "files and subdirectories",
            entries: &[
                ("sub/b.txt", EntryKind::File),
                ("empty", EntryKind::Directory),
                ("a.txt", EntryKind::File),
            ],
            text: "dsign-tree v1\nf a.txt\nd empty\nd sub\n  f b.txt\n",
            sha256: "d9c243b014129cdae41f7163438a416be0106033db05299e9b6f9ef56af86b6f",
        },
        SnapshotVector {
            name: "byte-wise case-sensitive order",
            entries: &[
                ("a", EntryKind::File),
                ("_x", EntryKind::File),
                ("B", EntryKind::File),
            ],
            text: "dsign-tree v1\nf B\nf _x\nf a\n",
            sha256: "3bdfdef8be91fbe5fcc770f515f01297ce186c5477d7d92b3eda622b7780f416",
        },
        SnapshotVector {
            name: "escaped names",
            entries: &[
                ("line\nbreak", EntryKind::File),
                ("back\\slash", EntryKind::File),
            ],
            text: "dsign-tree v1\nf back\\\\slash\nf line\\nbreak\n",
            sha256: "9019efc364762902487ae62bd037d1971aec0070e05c25e721b3f9f05995023e",
        },
        SnapshotVector {
            name: "implicit parents and symlink",
            entries: &[("link", EntryKind::Symlink), ("d/e/f.txt", EntryKind::File)],
            text: "dsign-tree v1\nd d\n  d e\n    f f.txt\nl link\n",
            sha256: "909803561cff0f020cff19122aa6d9898a71fd9e26ba47c934777efb2590a447",
        },
    ]
}

/// Check every vector, returning a description of each mismatch.
pub fn verify_all_vectors() -> Vec<String> {
    let mut failures = Vec::new();

    for v in digest_vectors() {
        let actual = Digest::hash(&v.input()).to_hex();
        if actual != v.sha256 {
            failures.push(format!("digest {}: expected {}, got {actual}", v.name, v.sha256));
        }
    }

    for v in snapshot_vectors() {
        let snapshot = v.build();
        let text = snapshot.to_text();
        if text != v.text {
            failures.push(format!("snapshot {}: expected {:?}, got {text:?}", v.name, v.text));
        }
        let digest = snapshot.digest().to_hex();
        if digest != v.sha256 {
            failures.push(format!("snapshot {}: expected digest {}, got {digest}", v.name, v.sha256));
        }
        match TreeSnapshot::parse(v.text) {
            Ok(parsed) if parsed == snapshot => {}
            Ok(_) => failures.push(format!("snapshot {}: parse disagrees with build", v.name)),
            Err(e) => failures.push(format!("snapshot {}: parse failed: {e}", v.name)),
        }
    }

    failures
}
