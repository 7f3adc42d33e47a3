//! Shared primitive types.

/// BLAKE3 content identity of a stored object.
pub type Hash = [u8; 32];

/// Render a hash as lowercase hex.
pub fn hash_hex(hash: &Hash) -> String {
    hex::encode(hash)
}

/// Abbreviated hex form used in log lines and CLI listings.
pub fn short_hex(hash: &Hash) -> String {
    hex::encode(&hash[..6])
}

/// Parse a 64-character hex string back into a hash.
pub fn parse_hash(text: &str) -> Option<Hash> {
    let bytes = hex::decode(text.trim()).ok()?;
    bytes.try_into().ok()
}
