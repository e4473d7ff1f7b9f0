//! Progress side channel.
//!
//! Front-ends running an operation on a worker can observe coarse progress.
//! Sinks only observe: they never influence which bytes are hashed or in what
//! order.

use std::path::Path;

/// Receives progress notifications from engine operations.
///
/// All methods default to no-ops so implementors pick what they need.
pub trait ProgressSink {
    /// A chunk of `bytes` was fed into a digest.
    fn bytes_hashed(&mut self, _bytes: u64) {}

    /// A directory entry was recorded in a snapshot.
    fn entry_visited(&mut self, _relative: &Path) {}

    /// A file finished signing or verification.
    fn file_done(&mut self, _path: &Path) {}
}

/// Discards all progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {}

/// Accumulates totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressCounter {
    pub bytes: u64,
    pub entries: u64,
    pub files: u64,
}

impl ProgressSink for ProgressCounter {
    fn bytes_hashed(&mut self, bytes: u64) {
        self.bytes += bytes;
    }

    fn entry_visited(&mut self, _relative: &Path) {
        self.entries += 1;
    }

    fn file_done(&mut self, _path: &Path) {
        self.files += 1;
    }
}
