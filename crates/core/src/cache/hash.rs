//! Cache key derivation.
//!
//! Keys are `favicon_prefixer_` followed by the hex SHA-256 of the input, so
//! raw domains and article bodies never end up in key space.

use sha2::{Digest, Sha256};

/// Namespace prefix shared by every key this crate writes.
pub const NAMESPACE: &str = "favicon_prefixer_";

/// Object-cache group for rewritten fragments.
pub const CACHE_GROUP: &str = "favicon_prefixer";

fn sha256_hex(input: &[u8]) -> String {
    hex::encode(Sha256::digest(input))
}

/// Index key for a domain's favicon record.
pub fn favicon_key(domain: &str) -> String {
    format!("{NAMESPACE}{}", sha256_hex(domain.as_bytes()))
}

/// Content-addressed key for a rewritten fragment.
pub fn content_key(content: &str) -> String {
    format!("{NAMESPACE}{}", sha256_hex(content.as_bytes()))
}
