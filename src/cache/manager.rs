//! Cache lifecycle: restore, prune and save
//!
//! Every operation is a no-op when caching is disabled for the run.

use crate::cache::backend::{CacheRegistry, CacheStorage};
use crate::cache::keys;
use crate::config::CacheConfig;
use crate::error::{ActionError, ActionResult};
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info};

/// A cache entry written by `save`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedCache {
    pub key: String,
    pub id: i64,
}

/// Applies the key policy on top of a storage and a registry
pub struct CacheManager {
    settings: Option<CacheConfig>,
    storage: Arc<dyn CacheStorage>,
    registry: Arc<dyn CacheRegistry>,
}

impl CacheManager {
    /// Create a manager; `settings` of `None` disables every operation
    pub fn new(
        settings: Option<CacheConfig>,
        storage: Arc<dyn CacheStorage>,
        registry: Arc<dyn CacheRegistry>,
    ) -> Self {
        Self {
            settings,
            storage,
            registry,
        }
    }

    /// Whether caching is configured for the run
    pub fn is_enabled(&self) -> bool {
        self.settings.is_some()
    }

    /// Restore the newest entry of the cache family.
    ///
    /// Never looks up an exact key: the primary key is one that cannot
    /// exist, so the `{key}-` restore prefix always decides.
    pub async fn restore(&self) -> ActionResult<Option<String>> {
        let Some(cache) = &self.settings else {
            return Ok(None);
        };

        let restore_keys = vec![keys::restore_prefix(&cache.key)];
        let matched = self
            .storage
            .restore(&cache.paths, &keys::primary_key(&cache.key), &restore_keys)
            .await
            .map_err(|e| ActionError::CacheRestore(e.to_string()))?;

        match &matched {
            Some(key) => info!("Cache restored: {}", key),
            None => info!("Cache not found"),
        }

        Ok(matched)
    }

    /// Save the configured paths under a fresh timestamped key
    pub async fn save(&self) -> ActionResult<Option<SavedCache>> {
        self.save_at(Utc::now()).await
    }

    /// Save with an explicit timestamp
    pub async fn save_at(&self, now: DateTime<Utc>) -> ActionResult<Option<SavedCache>> {
        let Some(cache) = &self.settings else {
            return Ok(None);
        };

        let key = keys::save_key(&cache.key, now);
        let saved = self
            .storage
            .save(&cache.paths, &key)
            .await
            .map_err(|e| ActionError::CacheSave(e.to_string()))?;

        // A silent refusal is as bad as an error: the next run would
        // restore whatever stale entry is left.
        let Some(id) = saved else {
            return Err(ActionError::CacheNotSaved { key });
        };

        info!("Cache saved. Key: {}, ID: {}", key, id);
        Ok(Some(SavedCache { key, id }))
    }

    /// Delete every entry of the cache family, concurrently.
    ///
    /// Any failed delete fails the whole prune; partially pruned caches
    /// would be restored by the next run.
    pub async fn prune(&self) -> ActionResult<usize> {
        let Some(cache) = &self.settings else {
            return Ok(0);
        };

        let prefix = keys::restore_prefix(&cache.key);
        let entries = self
            .registry
            .list(&prefix)
            .await
            .map_err(|e| ActionError::CachePrune(e.to_string()))?;

        // Delete-by-key removes all refs at once, so each key goes out once.
        let doomed: BTreeSet<String> = entries
            .into_iter()
            .map(|entry| entry.key)
            .filter(|key| keys::matches_prefix(key, &cache.key))
            .collect();

        if doomed.is_empty() {
            debug!("No caches matching {} to delete", prefix);
            return Ok(0);
        }

        let tasks: Vec<_> = doomed
            .iter()
            .map(|key| {
                info!("Deleting cache {}", key);
                let registry = Arc::clone(&self.registry);
                let key = key.clone();
                tokio::spawn(async move {
                    let result = registry.delete(&key).await;
                    (key, result)
                })
            })
            .collect();

        let mut failures = Vec::new();
        for joined in join_all(tasks).await {
            match joined {
                Ok((_, Ok(()))) => {}
                Ok((key, Err(e))) => failures.push(format!("{}: {}", key, e)),
                Err(e) => failures.push(format!("delete task failed: {}", e)),
            }
        }

        if !failures.is_empty() {
            return Err(ActionError::CachePrune(failures.join("; ")));
        }

        debug!("Deleted {} cache(s)", doomed.len());
        Ok(doomed.len())
    }
}
