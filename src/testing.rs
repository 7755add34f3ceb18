//! In-memory test doubles shared by unit tests

use crate::cache::backend::{CacheEntry, CacheRegistry, CacheStorage};
use crate::error::{ActionError, ActionResult};
use crate::notify::{NotifyError, Notifier, WorkflowStatus};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Ordered log of every call made to the fakes
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn record(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

pub struct FakeStorage {
    journal: Journal,
    hit: Option<String>,
    saved_id: Option<i64>,
    fail_restore: bool,
    fail_save: bool,
}

impl FakeStorage {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            hit: None,
            saved_id: None,
            fail_restore: false,
            fail_save: false,
        }
    }

    pub fn with_hit(mut self, key: &str) -> Self {
        self.hit = Some(key.to_string());
        self
    }

    pub fn with_saved_id(mut self, id: i64) -> Self {
        self.saved_id = Some(id);
        self
    }

    pub fn failing_restore(mut self) -> Self {
        self.fail_restore = true;
        self
    }

    pub fn failing_save(mut self) -> Self {
        self.fail_save = true;
        self
    }
}

#[async_trait]
impl CacheStorage for FakeStorage {
    async fn restore(
        &self,
        paths: &[String],
        primary_key: &str,
        restore_keys: &[String],
    ) -> ActionResult<Option<String>> {
        self.journal.record(format!(
            "restore {} {} [{}]",
            paths.join(","),
            primary_key,
            restore_keys.join(",")
        ));
        if self.fail_restore {
            return Err(ActionError::CacheService("restore unavailable".to_string()));
        }
        Ok(self.hit.clone())
    }

    async fn save(&self, paths: &[String], key: &str) -> ActionResult<Option<i64>> {
        self.journal
            .record(format!("save {} {}", paths.join(","), key));
        if self.fail_save {
            return Err(ActionError::CacheService("upload rejected".to_string()));
        }
        Ok(self.saved_id)
    }
}

pub struct FakeRegistry {
    journal: Journal,
    pub entries: Vec<CacheEntry>,
    fail_list: bool,
    fail_delete: HashSet<String>,
}

impl FakeRegistry {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            entries: Vec::new(),
            fail_list: false,
            fail_delete: HashSet::new(),
        }
    }

    pub fn with_keys<I: IntoIterator<Item = &'static str>>(mut self, keys: I) -> Self {
        self.entries = keys.into_iter().map(CacheEntry::new).collect();
        self
    }

    pub fn failing_list(mut self) -> Self {
        self.fail_list = true;
        self
    }

    pub fn failing_delete(mut self, key: &str) -> Self {
        self.fail_delete.insert(key.to_string());
        self
    }
}

#[async_trait]
impl CacheRegistry for FakeRegistry {
    async fn list(&self, prefix: &str) -> ActionResult<Vec<CacheEntry>> {
        self.journal.record(format!("list {}", prefix));
        if self.fail_list {
            return Err(ActionError::Http("403 Resource not accessible".to_string()));
        }
        Ok(self.entries.clone())
    }

    async fn delete(&self, key: &str) -> ActionResult<()> {
        self.journal.record(format!("delete {}", key));
        if self.fail_delete.contains(key) {
            return Err(ActionError::Http("404 Not Found".to_string()));
        }
        Ok(())
    }
}

pub struct RecordingNotifier {
    journal: Journal,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            fail: false,
        }
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, status: WorkflowStatus) -> Result<(), NotifyError> {
        self.journal.record(format!("notify {}", status));
        if self.fail {
            return Err(NotifyError::Transport("connection refused".to_string()));
        }
        Ok(())
    }
}

/// Header of a request received by a mock server
pub fn header<'a>(request: &'a wiremock::Request, name: &str) -> Option<&'a str> {
    request.headers.get(name).and_then(|v| v.to_str().ok())
}

/// Every request the mock server has seen, in arrival order
pub async fn received(server: &wiremock::MockServer) -> Vec<wiremock::Request> {
    server.received_requests().await.unwrap_or_default()
}
