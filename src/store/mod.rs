//! Source repository interfaces
//!
//! The export engine sees the source tree only through [`PathResolver`] (path to
//! entry plus owning store) and [`ObjectStore`] (blob contents by hash).
//! [`ObjectDb`] is the sled-backed repository that implements both.

pub mod persistence;

pub use persistence::{ObjectDb, TreeItem};

use crate::error::StorageError;
use crate::tree::Resolved;
use crate::types::Hash;
use async_trait::async_trait;

/// Maps a logical tree path to its entry and the repository that owns it.
///
/// Implementations must tolerate repeated re-resolution of the same path: the
/// tree may change between calls and callers re-fetch rather than trust an
/// entry they were handed earlier.
#[async_trait]
pub trait PathResolver: Send + Sync {
    /// Returns `Ok(None)` when nothing exists at `path`.
    async fn resolve(&self, path: &str) -> Result<Option<Resolved>, StorageError>;
}

/// Loads blob contents by hash.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn load_blob(&self, hash: &Hash) -> Result<Vec<u8>, StorageError>;
}
