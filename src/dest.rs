//! Destination filesystem interfaces
//!
//! A destination is reached only through a root directory handle restored from
//! an opaque token. Directories and files below it are obtained with
//! create-or-get semantics keyed by (parent handle, child name), so a handle can
//! never reach outside the root it was derived from.

pub mod local;

pub use local::LocalFs;

use crate::error::ExportError;
use async_trait::async_trait;
use std::io;
use std::sync::Arc;

/// Restores persisted destination root handles.
#[async_trait]
pub trait DestinationFs: Send + Sync {
    async fn restore(&self, token: &str) -> Result<Arc<dyn DestDir>, ExportError>;
}

/// Directory handle on the destination.
#[async_trait]
pub trait DestDir: Send + Sync {
    /// Human-readable location, reported to the progress target
    fn full_path(&self) -> String;

    /// Get the child directory `name`, creating it if missing
    async fn get_directory(&self, name: &str) -> io::Result<Arc<dyn DestDir>>;

    /// Get the child file `name`, creating it empty if missing
    async fn get_file(&self, name: &str) -> io::Result<Box<dyn DestFile>>;
}

/// File handle on the destination.
#[async_trait]
pub trait DestFile: Send + Sync {
    fn full_path(&self) -> String;

    /// Open a writer positioned at the start of the existing contents
    async fn create_writer(&self) -> io::Result<Box<dyn FileWriter>>;
}

/// Overwrites a file in place.
///
/// Writing does not shorten the file: bytes past the written range survive
/// from earlier, longer contents until [`FileWriter::truncate`] cuts them.
#[async_trait]
pub trait FileWriter: Send {
    /// Write all of `bytes`, returning the position after the write
    async fn write(&mut self, bytes: &[u8]) -> io::Result<u64>;

    async fn truncate(&mut self, len: u64) -> io::Result<()>;
}

/// Reject names that are not exactly one path component.
pub fn validate_name(name: &str) -> io::Result<()> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0');
    if invalid {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("invalid destination name {:?}", name),
        ));
    }
    Ok(())
}
