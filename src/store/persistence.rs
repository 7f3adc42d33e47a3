//! Persistence layer for the object database

use crate::error::StorageError;
use crate::store::{ObjectStore, PathResolver};
use crate::tree::hasher;
use crate::tree::path;
use crate::tree::{Child, Content, Entry, EntryMode, Resolved};
use crate::types::{hash_hex, Hash};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::trace;

const OBJECTS_TREE: &str = "objects";
const ROOTS_TREE: &str = "roots";

/// One named child of a stored tree.
///
/// The mode is kept raw so trees imported from elsewhere round-trip exactly;
/// it is decoded into an [`EntryMode`] only when that child is used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeItem {
    pub name: String,
    pub mode: u32,
    pub hash: Hash,
}

impl TreeItem {
    pub fn new(name: impl Into<String>, mode: EntryMode, hash: Hash) -> Self {
        Self::raw(name, mode.as_raw(), hash)
    }

    pub fn raw(name: impl Into<String>, mode: u32, hash: Hash) -> Self {
        Self {
            name: name.into(),
            mode,
            hash,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum StoredObject {
    Blob(Vec<u8>),
    Tree(Vec<TreeItem>),
    Commit { tree: Hash, message: String },
}

impl StoredObject {
    fn kind(&self) -> &'static str {
        match self {
            StoredObject::Blob(_) => "blob",
            StoredObject::Tree(_) => "tree",
            StoredObject::Commit { .. } => "commit",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct RootRecord {
    mode: u32,
    hash: Hash,
}

/// Sled-backed content-addressed repository with named roots.
///
/// Logical paths start with a root name: `site/docs/index.html` walks the tree
/// registered as `site`. Cloning is cheap and shares the database.
#[derive(Clone)]
pub struct ObjectDb {
    db: sled::Db,
    objects: sled::Tree,
    roots: sled::Tree,
}

impl ObjectDb {
    /// Open (or create) an object database at the given directory
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path).map_err(|e| {
            StorageError::IoError(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Failed to open sled database: {}", e),
            ))
        })?;
        Self::from_db(db)
    }

    /// In-memory database removed on drop
    pub fn temporary() -> Result<Self, StorageError> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    pub fn from_db(db: sled::Db) -> Result<Self, StorageError> {
        let objects = db.open_tree(OBJECTS_TREE)?;
        let roots = db.open_tree(ROOTS_TREE)?;
        Ok(Self { db, objects, roots })
    }

    /// Get the underlying sled database (shared with the change-memory)
    pub fn db(&self) -> &sled::Db {
        &self.db
    }

    pub fn put_blob(&self, content: &[u8]) -> Result<Hash, StorageError> {
        let hash = hasher::compute_blob_id(content);
        self.put_object(&hash, &StoredObject::Blob(content.to_vec()))?;
        Ok(hash)
    }

    /// Symlinks are blobs holding the link text.
    pub fn put_symlink(&self, target: &str) -> Result<Hash, StorageError> {
        self.put_blob(target.as_bytes())
    }

    /// Store a tree. Items are sorted by name; names must be unique single
    /// path components.
    pub fn put_tree(&self, mut items: Vec<TreeItem>) -> Result<Hash, StorageError> {
        for item in &items {
            validate_name(&item.name)?;
        }
        items.sort_by(|a, b| a.name.cmp(&b.name));
        if let Some(pair) = items.windows(2).find(|pair| pair[0].name == pair[1].name) {
            return Err(StorageError::InvalidPath(format!(
                "Duplicate tree entry: {}",
                pair[0].name
            )));
        }

        let ids: Vec<(String, u32, Hash)> = items
            .iter()
            .map(|item| (item.name.clone(), item.mode, item.hash))
            .collect();
        let hash = hasher::compute_tree_id(&ids);
        self.put_object(&hash, &StoredObject::Tree(items))?;
        Ok(hash)
    }

    pub fn put_commit(&self, tree: Hash, message: &str) -> Result<Hash, StorageError> {
        let hash = hasher::compute_commit_id(&tree, message);
        self.put_object(
            &hash,
            &StoredObject::Commit {
                tree,
                message: message.to_string(),
            },
        )?;
        Ok(hash)
    }

    /// Register (or move) a named root. Roots must be trees or commits.
    pub fn set_root(&self, name: &str, entry: Entry) -> Result<(), StorageError> {
        validate_name(name)?;
        if !entry.mode.is_tree_like() {
            return Err(StorageError::InvalidPath(format!(
                "Root {} must be a tree or commit, got {}",
                name,
                entry.mode.as_str()
            )));
        }
        let record = RootRecord {
            mode: entry.mode.as_raw(),
            hash: entry.hash,
        };
        self.roots.insert(name.as_bytes(), encode(&record)?)?;
        Ok(())
    }

    pub fn root(&self, name: &str) -> Result<Option<Entry>, StorageError> {
        match self.roots.get(name.as_bytes())? {
            Some(bytes) => {
                let record: RootRecord = decode(&bytes, name)?;
                Ok(Some(Entry::new(EntryMode::from_raw(record.mode)?, record.hash)))
            }
            None => Ok(None),
        }
    }

    /// All named roots, sorted by name
    pub fn roots(&self) -> Result<Vec<(String, Entry)>, StorageError> {
        let mut roots = Vec::new();
        for item in self.roots.iter() {
            let (key, value) = item?;
            let name = String::from_utf8_lossy(&key).into_owned();
            let record: RootRecord = decode(&value, &name)?;
            roots.push((name, Entry::new(EntryMode::from_raw(record.mode)?, record.hash)));
        }
        Ok(roots)
    }

    pub fn contains(&self, hash: &Hash) -> Result<bool, StorageError> {
        Ok(self.objects.contains_key(hash)?)
    }

    pub fn read_blob(&self, hash: &Hash) -> Result<Vec<u8>, StorageError> {
        match self.get_object(hash)? {
            StoredObject::Blob(content) => Ok(content),
            other => Err(StorageError::CorruptObject {
                hash: hash_hex(hash),
                reason: format!("expected blob, found {}", other.kind()),
            }),
        }
    }

    /// Children of a tree entry, following a commit to its root tree.
    pub fn tree_children(&self, entry: &Entry) -> Result<BTreeMap<String, Child>, StorageError> {
        let tree_hash = match entry.mode {
            EntryMode::Tree => entry.hash,
            EntryMode::Commit => match self.get_object(&entry.hash)? {
                StoredObject::Commit { tree, .. } => tree,
                other => {
                    return Err(StorageError::CorruptObject {
                        hash: hash_hex(&entry.hash),
                        reason: format!("expected commit, found {}", other.kind()),
                    })
                }
            },
            other => {
                return Err(StorageError::InvalidPath(format!(
                    "{} entry {} has no children",
                    other.as_str(),
                    hash_hex(&entry.hash)
                )))
            }
        };

        match self.get_object(&tree_hash)? {
            StoredObject::Tree(items) => Ok(items
                .into_iter()
                .map(|item| (item.name, Child::new(item.mode, item.hash)))
                .collect()),
            other => Err(StorageError::CorruptObject {
                hash: hash_hex(&tree_hash),
                reason: format!("expected tree, found {}", other.kind()),
            }),
        }
    }

    /// Resolve a logical path without going through the async interface.
    pub fn resolve_path(&self, logical_path: &str) -> Result<Option<Resolved>, StorageError> {
        let parts = path::components(logical_path);
        let Some((root_name, rest)) = parts.split_first() else {
            return Ok(None);
        };
        if root_name == ".." {
            return Ok(None);
        }
        let Some(mut entry) = self.root(root_name)? else {
            return Ok(None);
        };

        for name in rest {
            if !entry.mode.is_tree_like() {
                return Ok(None);
            }
            match self.tree_children(&entry)?.get(name) {
                Some(child) => entry = child.entry()?,
                None => return Ok(None),
            }
        }

        let content = match entry.mode {
            EntryMode::Tree | EntryMode::Commit => Content::Tree(self.tree_children(&entry)?),
            EntryMode::Symlink => {
                Content::Link(String::from_utf8_lossy(&self.read_blob(&entry.hash)?).into_owned())
            }
            EntryMode::File | EntryMode::ExecutableFile => Content::Blob,
        };
        trace!(path = logical_path, mode = entry.mode.as_str(), "Resolved path");

        Ok(Some(Resolved {
            entry,
            content,
            store: Arc::new(self.clone()),
        }))
    }

    /// Flush all pending writes to disk
    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }

    fn put_object(&self, hash: &Hash, object: &StoredObject) -> Result<(), StorageError> {
        if self.objects.contains_key(hash)? {
            return Ok(());
        }
        self.objects.insert(hash, encode(object)?)?;
        Ok(())
    }

    fn get_object(&self, hash: &Hash) -> Result<StoredObject, StorageError> {
        match self.objects.get(hash)? {
            Some(bytes) => decode(&bytes, &hash_hex(hash)),
            None => Err(StorageError::ObjectNotFound(hash_hex(hash))),
        }
    }
}

#[async_trait]
impl PathResolver for ObjectDb {
    async fn resolve(&self, path: &str) -> Result<Option<Resolved>, StorageError> {
        self.resolve_path(path)
    }
}

#[async_trait]
impl ObjectStore for ObjectDb {
    async fn load_blob(&self, hash: &Hash) -> Result<Vec<u8>, StorageError> {
        self.read_blob(hash)
    }
}

fn validate_name(name: &str) -> Result<(), StorageError> {
    if name.is_empty() || name == "." || name == ".." || name.contains('/') {
        return Err(StorageError::InvalidPath(format!(
            "Invalid entry name: {:?}",
            name
        )));
    }
    Ok(())
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StorageError> {
    bincode::serialize(value).map_err(|e| {
        StorageError::IoError(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("Failed to serialize object: {}", e),
        ))
    })
}

fn decode<T: for<'de> Deserialize<'de>>(bytes: &[u8], key: &str) -> Result<T, StorageError> {
    bincode::deserialize(bytes).map_err(|e| StorageError::CorruptObject {
        hash: key.to_string(),
        reason: e.to_string(),
    })
}
