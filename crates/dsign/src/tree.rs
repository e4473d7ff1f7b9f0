//! Directory walking: builds canonical snapshots and lists signable files.

use dsign_core::{EntryKind, SnapshotBuilder, TreeSnapshot};
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::artifacts::{self, append_extension, DIGEST_EXTENSION};
use crate::config::SignatureExtension;
use crate::error::{Error, Result};
use crate::progress::{NoProgress, ProgressSink};

/// Build the structural snapshot of `dir`.
///
/// Symbolic links are recorded as links and not followed. The directory
/// artifacts at the top level are excluded so that signing a directory does
/// not change its own snapshot.
pub fn build_snapshot(dir: &Path) -> Result<TreeSnapshot> {
    build_snapshot_with_progress(dir, &mut NoProgress)
}

/// [`build_snapshot`], reporting each entry to `progress`.
pub fn build_snapshot_with_progress(
    dir: &Path,
    progress: &mut dyn ProgressSink,
) -> Result<TreeSnapshot> {
    ensure_directory(dir)?;

    let mut builder = SnapshotBuilder::new();
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| !(e.depth() == 1 && artifacts::is_tree_artifact(e.file_name())));

    for entry in walker {
        let entry = entry.map_err(|e| walk_error(dir, e))?;
        let relative = entry
            .path()
            .strip_prefix(dir)
            .map_err(|_| Error::UnsupportedName(entry.path().display().to_string()))?;

        let file_type = entry.file_type();
        let kind = if file_type.is_dir() {
            EntryKind::Directory
        } else if file_type.is_symlink() {
            EntryKind::Symlink
        } else {
            EntryKind::File
        };

        let components = relative
            .iter()
            .map(|c| {
                c.to_str()
                    .map(str::to_owned)
                    .ok_or_else(|| Error::UnsupportedName(relative.to_string_lossy().into_owned()))
            })
            .collect::<Result<Vec<String>>>()?;

        builder.insert(components, kind)?;
        progress.entry_visited(relative);
    }

    let snapshot = builder.build();
    debug!(dir = %dir.display(), entries = snapshot.len(), "built tree snapshot");
    Ok(snapshot)
}

/// Regular files under `dir` eligible for per-file signing, in a stable order.
///
/// Skips symlinks, the directory artifacts, and sidecars. A `*.sha256` or
/// `*.<signature extension>` file only counts as a sidecar when it pairs with
/// a signed file (see [`is_sidecar`]); any other file with those extensions
/// is user content and is signed like the rest.
pub fn signable_files(dir: &Path, ext: SignatureExtension) -> Result<Vec<PathBuf>> {
    ensure_directory(dir)?;

    let mut files = Vec::new();
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !(e.depth() == 1 && artifacts::is_tree_artifact(e.file_name())));

    for entry in walker {
        let entry = entry.map_err(|e| walk_error(dir, e))?;
        if entry.file_type().is_file() && !is_sidecar(entry.path(), ext) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Signature sidecars under `dir` whose signed file no longer exists.
///
/// A signature is orphaned when its file is gone but the digest sidecar
/// written alongside it is still present. A lone `*.sig` with neither is user
/// content, not an orphan.
pub fn orphaned_signatures(dir: &Path, ext: SignatureExtension) -> Result<Vec<PathBuf>> {
    ensure_directory(dir)?;

    let mut orphans = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| walk_error(dir, e))?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension() != Some(OsStr::new(ext.as_str())) {
            continue;
        }
        if entry.depth() == 1 && artifacts::is_tree_artifact(entry.file_name()) {
            continue;
        }
        let target = path.with_extension("");
        let digest = append_extension(&target, DIGEST_EXTENSION);
        if !is_regular_file(&target) && is_regular_file(&digest) {
            orphans.push(path.to_path_buf());
        }
    }
    Ok(orphans)
}

/// Whether `path` is a sidecar written by per-file signing.
///
/// `X.sha256` and `X.<ext>` are sidecars when `X` is a regular file, or when
/// the other sidecar of the pair also exists (the signed file was removed).
fn is_sidecar(path: &Path, ext: SignatureExtension) -> bool {
    let partner = match path.extension().and_then(|e| e.to_str()) {
        Some(e) if e == DIGEST_EXTENSION => ext.as_str(),
        Some(e) if e == ext.as_str() => DIGEST_EXTENSION,
        _ => return false,
    };
    let target = path.with_extension("");
    is_regular_file(&target) || is_regular_file(&append_extension(&target, partner))
}

fn is_regular_file(path: &Path) -> bool {
    fs::symlink_metadata(path).map(|m| m.is_file()).unwrap_or(false)
}

pub(crate) fn ensure_directory(dir: &Path) -> Result<()> {
    let meta = fs::metadata(dir).map_err(|e| Error::unreadable(dir, e))?;
    if !meta.is_dir() {
        return Err(Error::unreadable(
            dir,
            io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
        ));
    }
    Ok(())
}

fn walk_error(root: &Path, e: walkdir::Error) -> Error {
    let path = e.path().unwrap_or(root).to_path_buf();
    Error::IoUnreadable {
        path,
        source: e.into(),
    }
}
