//! Per-export counters and the report built from them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;

/// Counters shared by every branch of one export
#[derive(Debug)]
pub(crate) struct ExportStats {
    started: Instant,
    directories: AtomicUsize,
    files_written: AtomicUsize,
    files_skipped: AtomicUsize,
    dangling_symlinks: AtomicUsize,
    bytes_written: AtomicU64,
}

impl ExportStats {
    pub(crate) fn new() -> Self {
        Self {
            started: Instant::now(),
            directories: AtomicUsize::new(0),
            files_written: AtomicUsize::new(0),
            files_skipped: AtomicUsize::new(0),
            dangling_symlinks: AtomicUsize::new(0),
            bytes_written: AtomicU64::new(0),
        }
    }

    pub(crate) fn directory(&self) {
        self.directories.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn written(&self, bytes: u64) {
        self.files_written.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn skipped(&self) {
        self.files_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn dangling(&self) {
        self.dangling_symlinks.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn finish(&self) -> ExportReport {
        ExportReport {
            directories: self.directories.load(Ordering::Relaxed),
            files_written: self.files_written.load(Ordering::Relaxed),
            files_skipped: self.files_skipped.load(Ordering::Relaxed),
            dangling_symlinks: self.dangling_symlinks.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            elapsed_ms: self.started.elapsed().as_millis() as u64,
            finished_at: Utc::now(),
        }
    }
}

/// Outcome of one successful export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportReport {
    pub directories: usize,
    pub files_written: usize,
    pub files_skipped: usize,
    pub dangling_symlinks: usize,
    pub bytes_written: u64,
    pub elapsed_ms: u64,
    pub finished_at: DateTime<Utc>,
}

impl ExportReport {
    /// Nothing was written: every file matched the change-memory
    pub fn is_noop(&self) -> bool {
        self.files_written == 0
    }
}
