//! Change-memory
//!
//! Remembers, per destination file location, the hash last written there
//! successfully. A file whose current hash matches is assumed byte-identical at
//! the destination and skipped. This holds only while nothing else modifies the
//! destination.

use crate::error::StorageError;
use crate::types::{short_hex, Hash};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{trace, warn};

const MEMORY_TREE: &str = "change_memory";

/// Location to last-written-hash store, injected into each exporter.
pub trait ChangeMemory: Send + Sync {
    fn get(&self, path: &str) -> Option<Hash>;
    fn set(&self, path: &str, hash: Hash);
}

/// Process-lifetime change-memory
#[derive(Debug, Default)]
pub struct InMemoryChangeMemory {
    entries: RwLock<HashMap<String, Hash>>,
}

impl InMemoryChangeMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seeded memory, mostly useful to simulate an earlier export
    pub fn with_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, Hash)>,
    {
        Self {
            entries: RwLock::new(entries.into_iter().collect()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl ChangeMemory for InMemoryChangeMemory {
    fn get(&self, path: &str) -> Option<Hash> {
        self.entries.read().get(path).copied()
    }

    fn set(&self, path: &str, hash: Hash) {
        trace!(path, hash = %short_hex(&hash), "Remembering exported hash");
        self.entries.write().insert(path.to_string(), hash);
    }
}

/// Change-memory persisted in sled so separate processes share it.
///
/// Storage failures degrade to a cache miss: the file is exported again.
pub struct SledChangeMemory {
    tree: sled::Tree,
}

impl SledChangeMemory {
    pub fn new(db: &sled::Db) -> Result<Self, StorageError> {
        Ok(Self {
            tree: db.open_tree(MEMORY_TREE)?,
        })
    }

    /// Forget everything, forcing the next export to rewrite every file
    pub fn clear(&self) -> Result<(), StorageError> {
        self.tree.clear()?;
        Ok(())
    }
}

impl ChangeMemory for SledChangeMemory {
    fn get(&self, path: &str) -> Option<Hash> {
        match self.tree.get(path.as_bytes()) {
            Ok(Some(bytes)) => <Hash>::try_from(&bytes[..]).ok(),
            Ok(None) => None,
            Err(e) => {
                warn!(path, error = %e, "Change-memory read failed");
                None
            }
        }
    }

    fn set(&self, path: &str, hash: Hash) {
        if let Err(e) = self.tree.insert(path.as_bytes(), &hash[..]) {
            warn!(path, error = %e, "Change-memory write failed");
        }
    }
}
