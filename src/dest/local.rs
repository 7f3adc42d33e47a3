//! Local filesystem destination backed by `tokio::fs`

use crate::dest::{validate_name, DestDir, DestFile, DestinationFs, FileWriter};
use crate::error::ExportError;
use crate::tree::path::canonicalize_path;
use async_trait::async_trait;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Destination whose tokens are directory paths on the local disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFs;

#[async_trait]
impl DestinationFs for LocalFs {
    async fn restore(&self, token: &str) -> Result<Arc<dyn DestDir>, ExportError> {
        let path = canonicalize_path(PathBuf::from(token).as_path())
            .map_err(|e| ExportError::RestoreFailed(e.to_string()))?;
        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|e| ExportError::RestoreFailed(format!("{}: {}", path.display(), e)))?;
        if !metadata.is_dir() {
            return Err(ExportError::RestoreFailed(format!(
                "{} is not a directory",
                path.display()
            )));
        }
        debug!(root = %path.display(), "Restored destination root");
        Ok(Arc::new(LocalDir::new(path)))
    }
}

/// Directory on the local disk
#[derive(Debug, Clone)]
pub struct LocalDir {
    path: PathBuf,
}

impl LocalDir {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl DestDir for LocalDir {
    fn full_path(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }

    async fn get_directory(&self, name: &str) -> io::Result<Arc<dyn DestDir>> {
        validate_name(name)?;
        let path = self.path.join(name);
        match tokio::fs::create_dir(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                if !tokio::fs::metadata(&path).await?.is_dir() {
                    return Err(io::Error::new(
                        io::ErrorKind::AlreadyExists,
                        format!("{} exists and is not a directory", path.display()),
                    ));
                }
            }
            Err(e) => return Err(e),
        }
        Ok(Arc::new(LocalDir::new(path)))
    }

    async fn get_file(&self, name: &str) -> io::Result<Box<dyn DestFile>> {
        validate_name(name)?;
        let path = self.path.join(name);
        // Create without truncating; existing contents are overwritten in place
        tokio::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .await?;
        Ok(Box::new(LocalFile { path }))
    }
}

/// File on the local disk
#[derive(Debug, Clone)]
pub struct LocalFile {
    path: PathBuf,
}

#[async_trait]
impl DestFile for LocalFile {
    fn full_path(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }

    async fn create_writer(&self) -> io::Result<Box<dyn FileWriter>> {
        let file = tokio::fs::OpenOptions::new()
            .write(true)
            .truncate(false)
            .open(&self.path)
            .await?;
        Ok(Box::new(LocalWriter { file, position: 0 }))
    }
}

struct LocalWriter {
    file: tokio::fs::File,
    position: u64,
}

#[async_trait]
impl FileWriter for LocalWriter {
    async fn write(&mut self, bytes: &[u8]) -> io::Result<u64> {
        self.file.write_all(bytes).await?;
        self.file.flush().await?;
        self.position += bytes.len() as u64;
        Ok(self.position)
    }

    async fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.file.set_len(len).await?;
        self.file.sync_data().await
    }
}
