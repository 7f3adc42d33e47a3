//! Entry modes as a closed set

use crate::error::StorageError;
use serde::{Deserialize, Serialize};

/// Kind of a tree entry.
///
/// Raw Git-style octal modes are decoded once, where they enter the crate, so
/// every later dispatch is an exhaustive match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryMode {
    Tree,
    Commit,
    File,
    ExecutableFile,
    Symlink,
}

impl EntryMode {
    pub const RAW_TREE: u32 = 0o040000;
    pub const RAW_COMMIT: u32 = 0o160000;
    pub const RAW_SYMLINK: u32 = 0o120000;
    pub const RAW_FILE: u32 = 0o100644;
    pub const RAW_EXECUTABLE: u32 = 0o100755;

    /// Decode a raw octal mode, rejecting anything outside the known kinds.
    pub fn from_raw(raw: u32) -> Result<Self, StorageError> {
        match raw {
            Self::RAW_TREE => Ok(EntryMode::Tree),
            Self::RAW_COMMIT => Ok(EntryMode::Commit),
            Self::RAW_SYMLINK => Ok(EntryMode::Symlink),
            _ if raw & 0o140000 == 0o100000 => {
                if raw & 0o111 != 0 {
                    Ok(EntryMode::ExecutableFile)
                } else {
                    Ok(EntryMode::File)
                }
            }
            _ => Err(StorageError::InvalidMode(raw)),
        }
    }

    /// Canonical raw mode for this kind.
    pub fn as_raw(self) -> u32 {
        match self {
            EntryMode::Tree => Self::RAW_TREE,
            EntryMode::Commit => Self::RAW_COMMIT,
            EntryMode::File => Self::RAW_FILE,
            EntryMode::ExecutableFile => Self::RAW_EXECUTABLE,
            EntryMode::Symlink => Self::RAW_SYMLINK,
        }
    }

    pub fn is_file(self) -> bool {
        matches!(self, EntryMode::File | EntryMode::ExecutableFile)
    }

    /// Trees and commits both export as directories.
    pub fn is_tree_like(self) -> bool {
        matches!(self, EntryMode::Tree | EntryMode::Commit)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntryMode::Tree => "tree",
            EntryMode::Commit => "commit",
            EntryMode::File => "file",
            EntryMode::ExecutableFile => "exec",
            EntryMode::Symlink => "symlink",
        }
    }
}

impl TryFrom<u32> for EntryMode {
    type Error = StorageError;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        EntryMode::from_raw(raw)
    }
}

impl std::fmt::Display for EntryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:06o}", self.as_raw())
    }
}
