//! Snapshot builder: imports a local directory into the object database

use crate::error::StorageError;
use crate::store::{ObjectDb, TreeItem};
use crate::tree::walker::{Entry as WalkEntry, Walker, WalkerConfig};
use crate::tree::{Entry, EntryMode};
use crate::types::short_hex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, instrument, trace};

/// Builds stored trees bottom-up from a directory on disk
pub struct SnapshotBuilder {
    root: PathBuf,
    walker_config: Option<WalkerConfig>,
}

impl SnapshotBuilder {
    /// Create a new builder for the given directory
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            walker_config: None,
        }
    }

    /// Set walker config (ignore patterns, depth)
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = Some(config);
        self
    }

    /// Store every file, symlink and directory and register the result as
    /// root `root_name`. Returns the root tree entry.
    #[instrument(skip(self, db), fields(source = %self.root.display()))]
    pub fn import(&self, db: &ObjectDb, root_name: &str) -> Result<Entry, StorageError> {
        let start = Instant::now();
        info!(root = root_name, "Starting snapshot import");

        let walker = match &self.walker_config {
            Some(config) => Walker::with_config(self.root.clone(), config.clone()),
            None => Walker::new(self.root.clone()),
        };
        let entries = walker.walk()?;
        debug!(entry_count = entries.len(), "Walked filesystem");

        // Items accumulated per directory, filled bottom-up
        let mut pending: HashMap<PathBuf, Vec<TreeItem>> = HashMap::new();
        let mut directories = Vec::new();
        let mut blob_count = 0usize;

        for entry in entries {
            match entry {
                WalkEntry::File {
                    path, executable, ..
                } => {
                    let content = std::fs::read(&path).map_err(|e| {
                        StorageError::IoError(std::io::Error::new(
                            e.kind(),
                            format!("Failed to read file {:?}: {}", path, e),
                        ))
                    })?;
                    let hash = db.put_blob(&content)?;
                    let mode = if executable {
                        EntryMode::ExecutableFile
                    } else {
                        EntryMode::File
                    };
                    trace!(path = %path.display(), hash = %short_hex(&hash), "Stored blob");
                    blob_count += 1;
                    push_item(&mut pending, &path, mode, hash)?;
                }
                WalkEntry::Symlink { path, target } => {
                    let hash = db.put_symlink(&target)?;
                    push_item(&mut pending, &path, EntryMode::Symlink, hash)?;
                }
                WalkEntry::Directory { path } => directories.push(path),
            }
        }

        // Deepest first so every child tree exists before its parent
        directories.sort_by(|a, b| b.components().count().cmp(&a.components().count()));
        for dir in &directories {
            let items = pending.remove(dir).unwrap_or_default();
            let hash = db.put_tree(items)?;
            push_item(&mut pending, dir, EntryMode::Tree, hash)?;
        }

        let root_items = pending.remove(&self.root).unwrap_or_default();
        let root_hash = db.put_tree(root_items)?;
        let root = Entry::new(EntryMode::Tree, root_hash);
        db.set_root(root_name, root)?;
        db.flush()?;

        info!(
            root = root_name,
            hash = %short_hex(&root_hash),
            blobs = blob_count,
            trees = directories.len() + 1,
            duration_ms = start.elapsed().as_millis(),
            "Snapshot import completed"
        );
        Ok(root)
    }
}

fn push_item(
    pending: &mut HashMap<PathBuf, Vec<TreeItem>>,
    path: &Path,
    mode: EntryMode,
    hash: crate::types::Hash,
) -> Result<(), StorageError> {
    let parent = path
        .parent()
        .ok_or_else(|| StorageError::InvalidPath(format!("No parent for {:?}", path)))?;
    let name = path
        .file_name()
        .ok_or_else(|| StorageError::InvalidPath(format!("No file name for {:?}", path)))?
        .to_string_lossy()
        .into_owned();
    pending
        .entry(parent.to_path_buf())
        .or_default()
        .push(TreeItem::new(name, mode, hash));
    Ok(())
}
