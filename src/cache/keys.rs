//! Cache key derivation
//!
//! The cache backend cannot overwrite an existing key, so every save gets
//! a fresh `{key}-{timestamp}` key and restores go through the `{key}-`
//! restore prefix, which the backend resolves to the newest match.

use chrono::{DateTime, Utc};

/// Timestamp layout appended to saved keys (UTC, second resolution)
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Suffix of the primary key used on restore; it never matches anything
const UNMATCHED_SUFFIX: &str = "FAKE-KEY";

/// Prefix every entry belonging to `key` starts with
pub fn restore_prefix(key: &str) -> String {
    format!("{}-", key)
}

/// Primary key for restore lookups
pub fn primary_key(key: &str) -> String {
    format!("{}-{}", key, UNMATCHED_SUFFIX)
}

/// Key for a cache saved at `now`
pub fn save_key(key: &str, now: DateTime<Utc>) -> String {
    format!("{}-{}", key, now.format(TIMESTAMP_FORMAT))
}

/// Whether `candidate` belongs to the cache family of `key`
pub fn matches_prefix(candidate: &str, key: &str) -> bool {
    candidate
        .strip_prefix(key)
        .is_some_and(|rest| rest.starts_with('-'))
}
