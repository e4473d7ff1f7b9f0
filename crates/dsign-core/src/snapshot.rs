//! Canonical tree snapshots for directory signing.
//!
//! A snapshot records the *structure* of a directory tree (entry names and
//! kinds), never file contents, sizes, timestamps or permissions. The same
//! logical tree always serializes to the same bytes, regardless of the order
//! in which entries were discovered.
//!
//! Canonical text:
//!
//! ```text
//! dsign-tree v1
//! d sub
//!   f b.txt
//! f a.txt
//! ```
//!
//! - The first line is [`SNAPSHOT_HEADER`].
//! - One line per entry, depth-first pre-order, parents before children.
//! - Two spaces of indentation per nesting level; top-level entries have none.
//! - Kind letter (`d`, `f`, `l`), one space, then the escaped name.
//! - Siblings are ordered by the bytes of their UTF-8 names. Ordering is
//!   case-sensitive: `B` sorts before `a`.
//! - `\` is escaped as `\\`, newline as `\n`, carriage return as `\r`.
//! - Every line, including the last, ends in `\n`.
//!
//! The root directory itself is not listed.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::digest::Digest;
use crate::error::{CoreError, Result};

/// Format header, first line of every snapshot.
pub const SNAPSHOT_HEADER: &str = "dsign-tree v1";

const INDENT: &str = "  ";

/// Kind of a tree entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Directory,
    File,
    /// A symbolic link, recorded without being followed.
    Symlink,
}

impl EntryKind {
    /// Single-letter code used in the canonical text.
    pub const fn letter(&self) -> char {
        match self {
            EntryKind::Directory => 'd',
            EntryKind::File => 'f',
            EntryKind::Symlink => 'l',
        }
    }

    /// Parse a single-letter code.
    pub fn from_letter(c: char) -> Option<Self> {
        match c {
            'd' => Some(EntryKind::Directory),
            'f' => Some(EntryKind::File),
            'l' => Some(EntryKind::Symlink),
            _ => None,
        }
    }
}

/// One line of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotEntry {
    /// Nesting level; 0 for entries directly inside the root.
    pub depth: usize,
    pub kind: EntryKind,
    pub name: String,
}

/// A canonical, order-stable representation of a directory's structure.
#[derive(Clone, PartialEq, Eq)]
pub struct TreeSnapshot {
    entries: Vec<SnapshotEntry>,
}

impl TreeSnapshot {
    /// Entries in canonical order.
    pub fn entries(&self) -> &[SnapshotEntry] {
        &self.entries
    }

    /// Number of entries (the header is not counted).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the tree has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render the canonical text.
    pub fn to_text(&self) -> String {
        let mut out = String::with_capacity(SNAPSHOT_HEADER.len() + 1 + self.entries.len() * 16);
        out.push_str(SNAPSHOT_HEADER);
        out.push('\n');
        for entry in &self.entries {
            for _ in 0..entry.depth {
                out.push_str(INDENT);
            }
            out.push(entry.kind.letter());
            out.push(' ');
            escape_into(&entry.name, &mut out);
            out.push('\n');
        }
        out
    }

    /// Canonical bytes: the UTF-8 encoding of [`TreeSnapshot::to_text`].
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_text().into_bytes()
    }

    /// Digest of the canonical bytes. This is what a directory signature covers.
    pub fn digest(&self) -> Digest {
        Digest::hash(&self.to_bytes())
    }

    /// Parse canonical text.
    ///
    /// Rejects anything that [`TreeSnapshot::to_text`] could not have
    /// produced: a missing header, bad indentation, children of a non-directory,
    /// unsorted or duplicate siblings.
    pub fn parse(text: &str) -> Result<Self> {
        let body = text.strip_suffix('\n').ok_or_else(|| malformed(0, "missing trailing newline"))?;
        let mut lines = body.split('\n');

        match lines.next() {
            Some(SNAPSHOT_HEADER) => {}
            _ => return Err(malformed(1, "missing header")),
        }

        let mut entries: Vec<SnapshotEntry> = Vec::new();
        // last sibling name and kind seen at each depth along the current path
        let mut path: Vec<(String, EntryKind)> = Vec::new();

        for (i, line) in lines.enumerate() {
            let line_no = i + 2;
            let trimmed = line.trim_start_matches(' ');
            let spaces = line.len() - trimmed.len();
            if spaces % INDENT.len() != 0 {
                return Err(malformed(line_no, "odd indentation"));
            }
            let depth = spaces / INDENT.len();
            if depth > path.len() {
                return Err(malformed(line_no, "indentation skips a level"));
            }
            if depth > 0 && path[depth - 1].1 != EntryKind::Directory {
                return Err(malformed(line_no, "entry nested under a non-directory"));
            }

            let mut chars = trimmed.chars();
            let kind = chars
                .next()
                .and_then(EntryKind::from_letter)
                .ok_or_else(|| malformed(line_no, "unknown entry kind"))?;
            if chars.next() != Some(' ') {
                return Err(malformed(line_no, "expected a space after the entry kind"));
            }
            let name = unescape(chars.as_str()).map_err(|reason| malformed(line_no, reason))?;
            validate_name(&name)?;

            if depth < path.len() {
                let previous = &path[depth].0;
                if name.as_bytes() <= previous.as_bytes() {
                    return Err(malformed(line_no, "siblings out of order"));
                }
                path.truncate(depth);
            }
            path.push((name.clone(), kind));
            entries.push(SnapshotEntry { depth, kind, name });
        }

        Ok(Self { entries })
    }

    /// Slash-joined relative paths of every entry, with directories suffixed
    /// by `/` and symlinks by `@`.
    pub fn paths(&self) -> Vec<String> {
        let mut stack: Vec<&str> = Vec::new();
        let mut out = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            stack.truncate(entry.depth);
            stack.push(&entry.name);
            let mut path = stack.join("/");
            match entry.kind {
                EntryKind::Directory => path.push('/'),
                EntryKind::Symlink => path.push('@'),
                EntryKind::File => {}
            }
            out.push(path);
        }
        out
    }

    /// Entries present in `newer` but not in `self` (added), and the reverse
    /// (removed). A renamed entry shows up in both lists.
    pub fn diff(&self, newer: &TreeSnapshot) -> SnapshotDiff {
        let old: BTreeSet<String> = self.paths().into_iter().collect();
        let new: BTreeSet<String> = newer.paths().into_iter().collect();
        SnapshotDiff {
            added: new.difference(&old).cloned().collect(),
            removed: old.difference(&new).cloned().collect(),
        }
    }
}

impl fmt::Debug for TreeSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TreeSnapshot({} entries, {:?})", self.entries.len(), self.digest())
    }
}

impl fmt::Display for TreeSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// Structural difference between two snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl SnapshotDiff {
    /// Whether the two snapshots describe the same tree.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

#[derive(Debug, Clone)]
struct Node {
    kind: EntryKind,
    children: BTreeMap<String, Node>,
}

/// Collects entries in any order and produces the canonical [`TreeSnapshot`].
///
/// Intermediate directories are created implicitly, so inserting `a/b/c.txt`
/// alone yields `d a`, `d b`, `f c.txt`.
#[derive(Debug, Clone, Default)]
pub struct SnapshotBuilder {
    root: BTreeMap<String, Node>,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one entry given its path components relative to the root.
    pub fn insert<I, S>(&mut self, components: I, kind: EntryKind) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let components: Vec<String> = components.into_iter().map(Into::into).collect();
        let Some((leaf, parents)) = components.split_last() else {
            return Err(CoreError::UnsupportedName("empty path".into()));
        };

        let mut level = &mut self.root;
        for parent in parents {
            validate_name(parent)?;
            let node = level.entry(parent.clone()).or_insert_with(|| Node {
                kind: EntryKind::Directory,
                children: BTreeMap::new(),
            });
            if node.kind != EntryKind::Directory {
                return Err(CoreError::UnsupportedName(format!(
                    "{parent} is both a {:?} and a directory",
                    node.kind
                )));
            }
            level = &mut node.children;
        }

        validate_name(leaf)?;
        let node = level.entry(leaf.clone()).or_insert_with(|| Node {
            kind,
            children: BTreeMap::new(),
        });
        if node.kind != kind {
            return Err(CoreError::UnsupportedName(format!(
                "{leaf} recorded as both {:?} and {kind:?}",
                node.kind
            )));
        }
        Ok(())
    }

    /// Insert one entry given a `/`-separated relative path.
    pub fn insert_path(&mut self, path: &str, kind: EntryKind) -> Result<()> {
        self.insert(path.split('/'), kind)
    }

    /// Produce the canonical snapshot.
    pub fn build(&self) -> TreeSnapshot {
        let mut entries = Vec::new();
        flatten(&self.root, 0, &mut entries);
        TreeSnapshot { entries }
    }
}

fn flatten(level: &BTreeMap<String, Node>, depth: usize, out: &mut Vec<SnapshotEntry>) {
    // BTreeMap<String, _> iterates in byte order of the UTF-8 keys
    for (name, node) in level {
        out.push(SnapshotEntry {
            depth,
            kind: node.kind,
            name: name.clone(),
        });
        flatten(&node.children, depth + 1, out);
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains('/') {
        return Err(CoreError::UnsupportedName(format!("{name:?}")));
    }
    Ok(())
}

fn escape_into(name: &str, out: &mut String) {
    for c in name.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
}

fn unescape(escaped: &str) -> std::result::Result<String, &'static str> {
    let mut out = String::with_capacity(escaped.len());
    let mut chars = escaped.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            _ => return Err("invalid escape sequence"),
        }
    }
    Ok(out)
}

fn malformed(line: usize, reason: &str) -> CoreError {
    CoreError::SnapshotMalformed {
        line,
        reason: reason.to_string(),
    }
}
