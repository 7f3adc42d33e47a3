//! Export engine
//!
//! Mirrors a resolved source subtree into a destination directory. Trees fan out
//! over their children concurrently on the calling task, files are written then
//! truncated, symlinks are copied as their resolved target, and files whose hash
//! is already recorded in the change-memory are skipped.

pub mod engine;
pub mod report;

pub use engine::{Exporter, FailurePolicy, DEFAULT_MAX_SYMLINK_DEPTH};
pub use report::ExportReport;
