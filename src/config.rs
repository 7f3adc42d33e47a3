//! Configuration System
//!
//! Hierarchical configuration with environment variable overrides and
//! validation. Tests included.

use crate::export::{FailurePolicy, DEFAULT_MAX_SYMLINK_DEPTH};
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod facade;
mod merge;
mod sources;

pub use sources::workspace_file::{state_path, STATE_DIR};
use sources::workspace_file;

pub use facade::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Logical path of the subtree to export, `<root>/<path>`
    #[serde(default)]
    pub source: Option<String>,

    /// Destination directory (the restore token of the local filesystem)
    #[serde(default)]
    pub destination: Option<PathBuf>,

    /// Name of the exported subtree under the destination
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub export: ExportOptions,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Engine tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportOptions {
    #[serde(default)]
    pub failure_policy: FailurePolicy,

    #[serde(default = "default_max_symlink_depth")]
    pub max_symlink_depth: usize,
}

fn default_max_symlink_depth() -> usize {
    DEFAULT_MAX_SYMLINK_DEPTH
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::default(),
            max_symlink_depth: default_max_symlink_depth(),
        }
    }
}

/// Where the change-memory lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeMemoryBackend {
    /// Forgotten when the process exits
    #[default]
    Memory,
    /// Persisted next to the object database
    Sled,
}

/// Storage paths
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_object_db")]
    pub object_db: PathBuf,

    #[serde(default)]
    pub change_memory: ChangeMemoryBackend,

    #[serde(default = "default_change_memory_path")]
    pub change_memory_path: PathBuf,
}

fn default_object_db() -> PathBuf {
    workspace_file::state_path("objects")
}

fn default_change_memory_path() -> PathBuf {
    workspace_file::state_path("memory")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            object_db: default_object_db(),
            change_memory: ChangeMemoryBackend::default(),
            change_memory_path: default_change_memory_path(),
        }
    }
}

impl StorageConfig {
    /// Anchor relative paths at the workspace root
    pub fn resolve_paths(&self, workspace_root: &Path) -> StorageConfig {
        let anchor = |path: &Path| {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                workspace_root.join(path)
            }
        };
        StorageConfig {
            object_db: anchor(&self.object_db),
            change_memory: self.change_memory,
            change_memory_path: anchor(&self.change_memory_path),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Export(String),
    Storage(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Export(msg) => write!(f, "Export: {}", msg),
            ValidationError::Storage(msg) => write!(f, "Storage: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl ExportConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Some(source) = &self.source {
            if source.trim().is_empty() {
                errors.push(ValidationError::Export("Source cannot be empty".to_string()));
            }
        }
        if let Some(name) = &self.name {
            if crate::dest::validate_name(name).is_err() {
                errors.push(ValidationError::Export(format!(
                    "Name '{}' must be a single path component",
                    name
                )));
            }
        }
        if self.export.max_symlink_depth == 0 {
            errors.push(ValidationError::Export(
                "max_symlink_depth must be at least 1".to_string(),
            ));
        }

        if self.storage.object_db.as_os_str().is_empty() {
            errors.push(ValidationError::Storage(
                "Object database path cannot be empty".to_string(),
            ));
        }
        if self.storage.change_memory == ChangeMemoryBackend::Sled
            && self.storage.change_memory_path.as_os_str().is_empty()
        {
            errors.push(ValidationError::Storage(
                "Change-memory path cannot be empty".to_string(),
            ));
        }

        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
