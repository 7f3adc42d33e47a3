//! Error types for the tree export system.

use crate::tree::mode::EntryMode;
use thiserror::Error;

/// Object database and path resolution errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    #[error("Invalid mode 0{0:o}")]
    InvalidMode(u32),

    #[error("Corrupt object {hash}: {reason}")]
    CorruptObject { hash: String, reason: String },

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<sled::Error> for StorageError {
    fn from(err: sled::Error) -> Self {
        StorageError::IoError(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("sled: {}", err),
        ))
    }
}

/// Stage of a single file export at which a destination operation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStage {
    OpeningFile,
    Writing,
    Truncating,
}

impl std::fmt::Display for FileStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FileStage::OpeningFile => "opening-file",
            FileStage::Writing => "writing",
            FileStage::Truncating => "truncating",
        };
        f.write_str(name)
    }
}

/// Export errors surfaced to the hook and the progress target
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to restore entry: {0}")]
    RestoreFailed(String),

    #[error("Can't find source: {0}")]
    SourceNotFound(String),

    #[error("Expected {expected} at {path}, found {found:?}")]
    UnexpectedEntry {
        path: String,
        expected: &'static str,
        found: EntryMode,
    },

    #[error("Destination error at {path}: {message}")]
    Destination { path: String, message: String },

    #[error("Write failed for {path} while {stage}: {message}")]
    WriteFailed {
        path: String,
        stage: FileStage,
        message: String,
    },

    /// Work stopped because another branch of the same export failed first
    #[error("Export abandoned after an earlier failure")]
    Abandoned,

    #[error("Too many levels of symbolic links at {path} (limit {limit})")]
    SymlinkLoop { path: String, limit: usize },

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ExportError {
    pub(crate) fn destination(path: &str, err: std::io::Error) -> Self {
        ExportError::Destination {
            path: path.to_string(),
            message: err.to_string(),
        }
    }

    pub(crate) fn write_failed(path: &str, stage: FileStage, err: std::io::Error) -> Self {
        ExportError::WriteFailed {
            path: path.to_string(),
            stage,
            message: err.to_string(),
        }
    }
}

impl From<config::ConfigError> for ExportError {
    fn from(err: config::ConfigError) -> Self {
        ExportError::ConfigError(err.to_string())
    }
}
