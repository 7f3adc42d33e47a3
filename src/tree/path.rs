//! Path canonicalization and normalization utilities
//!
//! Logical source paths are `/`-separated strings whose first component names a
//! root in the object database, e.g. `site/docs/index.html`. Destination paths
//! are real filesystem paths and go through [`canonicalize_path`].

use std::path::{Path, PathBuf};
use unicode_normalization::UnicodeNormalization;

/// Canonicalize and normalize a filesystem path
///
/// This function:
/// 1. Canonicalizes the path (resolves symlinks, `..`, `.`)
/// 2. Normalizes Unicode to NFC
/// 3. Removes trailing slashes (except root)
pub fn canonicalize_path(path: &Path) -> Result<PathBuf, crate::error::StorageError> {
    let canonical = dunce::canonicalize(path).map_err(|e| {
        crate::error::StorageError::InvalidPath(format!(
            "Failed to canonicalize path {}: {}",
            path.display(),
            e
        ))
    })?;

    let normalized: String = canonical.to_string_lossy().nfc().collect();
    let mut normalized_path = PathBuf::from(normalized);

    if normalized_path.as_os_str().len() > 1 {
        let mut path_str = normalized_path.to_string_lossy().to_string();
        while path_str.ends_with('/') || path_str.ends_with('\\') {
            path_str.pop();
        }
        normalized_path = PathBuf::from(path_str);
    }

    Ok(normalized_path)
}

/// Join logical path segments and normalize the result.
///
/// Empty and `.` components are dropped and `..` removes the previous
/// component. A `..` with nothing left to remove is kept, so a link that climbs
/// above its root never lands on another root. Segments are concatenated, so
/// an absolute link text is still taken relative to the base. A leading `/` on
/// the first segment is preserved; an empty result is `.`.
pub fn join_all(segments: &[&str]) -> String {
    let absolute = segments.first().is_some_and(|first| first.starts_with('/'));
    let mut parts: Vec<String> = Vec::new();

    for segment in segments {
        let segment: String = segment.nfc().collect();
        for part in segment.split('/') {
            match part {
                "" | "." => {}
                ".." => match parts.last().map(String::as_str) {
                    Some(last) if last != ".." => {
                        parts.pop();
                    }
                    _ if absolute => {}
                    _ => parts.push("..".to_string()),
                },
                other => parts.push(other.to_string()),
            }
        }
    }

    let joined = parts.join("/");
    match (absolute, joined.is_empty()) {
        (true, _) => format!("/{}", joined),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// Join a child or relative path onto a base path.
pub fn join(base: &str, rel: &str) -> String {
    join_all(&[base, rel])
}

/// Normalize a single logical path.
pub fn normalize_path_string(path: &str) -> String {
    join_all(&[path])
}

/// Directory containing `path`.
pub fn parent(path: &str) -> String {
    join(path, "..")
}

/// Non-empty components of a normalized path, ignoring a leading `/`.
pub fn components(path: &str) -> Vec<String> {
    normalize_path_string(path)
        .split('/')
        .filter(|part| !part.is_empty() && *part != ".")
        .map(str::to_string)
        .collect()
}
