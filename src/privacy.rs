use sha2::{Digest, Sha256};

/// Hex characters kept from the SHA-256 digest.
pub const USER_HASH_LEN: usize = 16;

/// Stand-in for messages that carry no sender. Matches the rows the
/// earlier Python job wrote (`str(None)`), so their hashes line up.
const UNKNOWN_SENDER: &str = "None";

/// Pseudonymize a sender identifier: SHA-256, lowercase hex, truncated.
/// Unsalted, so the same sender maps to the same hash in every channel and run.
#[must_use]
pub fn hash_sender(sender_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(sender_id.as_bytes());
    let mut hex = format!("{:x}", hasher.finalize());
    hex.truncate(USER_HASH_LEN);
    hex
}

#[must_use]
pub fn hash_optional_sender(sender_id: Option<&str>) -> String {
    hash_sender(sender_id.unwrap_or(UNKNOWN_SENDER))
}
