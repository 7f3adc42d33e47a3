//! Object identity computation using BLAKE3

use crate::types::Hash;
use blake3::Hasher;

/// Compute the id of a blob object
///
/// ObjectID = hash("blob" || len || content)
pub fn compute_blob_id(content: &[u8]) -> Hash {
    let mut hasher = Hasher::new();

    // Hash type discriminator
    hasher.update(b"blob");

    // Hash content length (8 bytes, big-endian for determinism)
    hasher.update(&(content.len() as u64).to_be_bytes());

    hasher.update(content);

    *hasher.finalize().as_bytes()
}

/// Compute the id of a tree object
///
/// ObjectID = hash("tree" || children_count || (name_len || name || mode || hash)*)
///
/// Children must be sorted by name for determinism.
pub fn compute_tree_id(children: &[(String, u32, Hash)]) -> Hash {
    let mut hasher = Hasher::new();

    hasher.update(b"tree");
    hasher.update(&(children.len() as u64).to_be_bytes());

    for (name, mode, hash) in children {
        hasher.update(&(name.len() as u64).to_be_bytes());
        hasher.update(name.as_bytes());
        hasher.update(&mode.to_be_bytes());
        hasher.update(hash);
    }

    *hasher.finalize().as_bytes()
}

/// Compute the id of a commit object
///
/// ObjectID = hash("commit" || tree || message_len || message)
pub fn compute_commit_id(tree: &Hash, message: &str) -> Hash {
    let mut hasher = Hasher::new();

    hasher.update(b"commit");
    hasher.update(tree);
    hasher.update(&(message.len() as u64).to_be_bytes());
    hasher.update(message.as_bytes());

    *hasher.finalize().as_bytes()
}
