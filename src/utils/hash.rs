//! String hashing and temporary photo keys.

use chrono::{SecondsFormat, Utc};

/// 32-bit string hash: `h = (h << 5) - h + c` over UTF-16 code units,
/// wrapping on overflow.
#[must_use]
pub fn hash_code(value: &str) -> i32 {
    value
        .encode_utf16()
        .fold(0i32, |hash, unit| (hash << 5).wrapping_sub(hash).wrapping_add(i32::from(unit)))
}

/// Temporary key for a photo not yet stored on the server: `hash-<n>` where
/// `n` hashes the current UTC timestamp.
#[must_use]
pub fn temporary_hash() -> String {
    let stamp = Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true);
    temporary_hash_for(&stamp)
}

pub(crate) fn temporary_hash_for(stamp: &str) -> String {
    format!("hash-{}", hash_code(stamp))
}

/// `true` when `key` has the temporary `hash-<n>` shape.
#[must_use]
pub fn is_temporary_key(key: &str) -> bool {
    key.strip_prefix("hash-")
        .is_some_and(|rest| rest.parse::<i32>().is_ok())
}

#[cfg(test)]
#[path = "hash_test.rs"]
mod tests;
