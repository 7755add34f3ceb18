//! Cache backend abstraction
//!
//! Two seams: `CacheStorage` moves archives in and out of the runner's
//! cache service, `CacheRegistry` lists and deletes entries through the
//! REST API. Both are implemented for production in this crate and
//! faked in tests.

use crate::error::ActionResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// One stored cache entry as reported by the registry
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CacheEntry {
    #[serde(default)]
    pub id: Option<u64>,

    pub key: String,

    #[serde(default, rename = "ref")]
    pub git_ref: Option<String>,

    #[serde(default)]
    pub size_in_bytes: Option<u64>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl CacheEntry {
    /// Entry with only a key, as far as pruning is concerned
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            id: None,
            key: key.into(),
            git_ref: None,
            size_in_bytes: None,
            created_at: None,
        }
    }
}

/// Archive storage
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Restore `paths`; returns the key that matched, if any.
    ///
    /// `primary_key` is tried first, then each of `restore_keys` as a
    /// prefix, newest entry winning.
    async fn restore(
        &self,
        paths: &[String],
        primary_key: &str,
        restore_keys: &[String],
    ) -> ActionResult<Option<String>>;

    /// Save `paths` under `key`; `None` means the backend declined silently
    async fn save(&self, paths: &[String], key: &str) -> ActionResult<Option<i64>>;
}

/// Entry management
#[async_trait]
pub trait CacheRegistry: Send + Sync {
    /// List entries; `prefix` narrows the listing server side, callers
    /// still filter the result themselves
    async fn list(&self, prefix: &str) -> ActionResult<Vec<CacheEntry>>;

    /// Delete every entry stored under exactly `key`
    async fn delete(&self, key: &str) -> ActionResult<()>;
}
