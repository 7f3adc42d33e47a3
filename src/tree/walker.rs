//! Filesystem walker for snapshot import

use crate::config::STATE_DIR;
use crate::error::StorageError;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Filesystem entry types
#[derive(Debug, Clone)]
pub enum Entry {
    /// A regular file with its size and whether any execute bit is set
    File {
        path: PathBuf,
        size: u64,
        executable: bool,
    },
    /// A directory entry with its path
    Directory { path: PathBuf },
    /// A symbolic link and its raw target text
    Symlink { path: PathBuf, target: String },
}

impl Entry {
    pub fn path(&self) -> &Path {
        match self {
            Entry::File { path, .. } | Entry::Directory { path } | Entry::Symlink { path, .. } => {
                path
            }
        }
    }
}

/// Filesystem walker configuration
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// Component names to skip entirely (e.g., ".git")
    pub ignore_patterns: Vec<String>,
    /// Maximum depth to traverse (None = unlimited)
    pub max_depth: Option<usize>,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            ignore_patterns: vec![".git".to_string(), STATE_DIR.to_string()],
            max_depth: None,
        }
    }
}

/// Filesystem walker. Symbolic links are reported, never followed.
pub struct Walker {
    root: PathBuf,
    config: WalkerConfig,
}

impl Walker {
    /// Create a new walker for the given root path
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            config: WalkerConfig::default(),
        }
    }

    /// Create a walker with custom configuration
    pub fn with_config(root: PathBuf, config: WalkerConfig) -> Self {
        Self { root, config }
    }

    /// Walk the filesystem and collect all entries below the root
    ///
    /// Returns entries sorted by path for determinism.
    pub fn walk(&self) -> Result<Vec<Entry>, StorageError> {
        let mut entries = Vec::new();

        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .max_depth(self.config.max_depth.unwrap_or(usize::MAX))
            .into_iter()
            .filter_entry(|entry| !self.should_ignore(entry));

        for entry in walker {
            let entry = entry.map_err(|e| {
                StorageError::IoError(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    format!("Failed to walk directory: {}", e),
                ))
            })?;

            let path = entry.path().to_path_buf();
            if path == self.root {
                continue;
            }

            let file_type = entry.file_type();
            if file_type.is_symlink() {
                let target = std::fs::read_link(&path)?;
                entries.push(Entry::Symlink {
                    path,
                    target: target.to_string_lossy().into_owned(),
                });
            } else if file_type.is_dir() {
                entries.push(Entry::Directory { path });
            } else if file_type.is_file() {
                let metadata = entry.metadata().map_err(|e| {
                    StorageError::IoError(std::io::Error::new(
                        std::io::ErrorKind::Other,
                        format!("Failed to read metadata for {:?}: {}", path, e),
                    ))
                })?;
                entries.push(Entry::File {
                    path,
                    size: metadata.len(),
                    executable: is_executable(&metadata),
                });
            }
            // Sockets, fifos and devices have no tree representation
        }

        entries.sort_by(|a, b| a.path().cmp(b.path()));
        Ok(entries)
    }

    fn should_ignore(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 {
            return false;
        }
        let name = entry.file_name().to_string_lossy();
        self.config
            .ignore_patterns
            .iter()
            .any(|pattern| pattern.as_str() == name)
    }
}

#[cfg(unix)]
fn is_executable(metadata: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &std::fs::Metadata) -> bool {
    false
}
