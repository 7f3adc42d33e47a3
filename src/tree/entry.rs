//! Entries and resolved views of the source tree

use crate::error::StorageError;
use crate::store::ObjectStore;
use crate::tree::mode::EntryMode;
use crate::types::{short_hex, Hash};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A content-addressed node: what a tree lists for each child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub mode: EntryMode,
    pub hash: Hash,
}

impl Entry {
    pub fn new(mode: EntryMode, hash: Hash) -> Self {
        Self { mode, hash }
    }
}

/// A child as listed by its tree. The mode stays raw until the child is
/// looked up or exported, so one unreadable child fails only its own branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Child {
    pub raw_mode: u32,
    pub hash: Hash,
}

impl Child {
    pub fn new(raw_mode: u32, hash: Hash) -> Self {
        Self { raw_mode, hash }
    }

    pub fn entry(&self) -> Result<Entry, StorageError> {
        Ok(Entry::new(EntryMode::from_raw(self.raw_mode)?, self.hash))
    }
}

impl From<Entry> for Child {
    fn from(entry: Entry) -> Self {
        Self::new(entry.mode.as_raw(), entry.hash)
    }
}

/// What a resolved path holds beyond its entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// Children of a tree, or of the root tree of a commit
    Tree(BTreeMap<String, Child>),
    /// Raw link text of a symlink
    Link(String),
    /// File contents are loaded lazily through the owning store
    Blob,
}

/// Read-only snapshot of one path, fetched per operation.
#[derive(Clone)]
pub struct Resolved {
    pub entry: Entry,
    pub content: Content,
    /// Repository that owns the entry; blobs are loaded from here
    pub store: Arc<dyn ObjectStore>,
}

impl Resolved {
    pub fn children(&self) -> Option<&BTreeMap<String, Child>> {
        match &self.content {
            Content::Tree(children) => Some(children),
            _ => None,
        }
    }

    pub fn link(&self) -> Option<&str> {
        match &self.content {
            Content::Link(target) => Some(target),
            _ => None,
        }
    }
}

impl std::fmt::Debug for Resolved {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolved")
            .field("mode", &self.entry.mode)
            .field("hash", &short_hex(&self.entry.hash))
            .field("content", &self.content)
            .finish()
    }
}
