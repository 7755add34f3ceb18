//! GitHub REST client for Actions cache management

use crate::cache::backend::{CacheEntry, CacheRegistry};
use crate::context::Repo;
use crate::error::ActionResult;
use crate::http;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use ureq::Agent;

const API_VERSION: &str = "2022-11-28";
const PAGE_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
struct CacheList {
    total_count: usize,
    #[serde(default)]
    actions_caches: Vec<CacheEntry>,
}

/// `CacheRegistry` over `/repos/{owner}/{repo}/actions/caches`
#[derive(Clone)]
pub struct GithubCacheRegistry {
    caches_url: String,
    token: String,
    agent: Agent,
}

impl GithubCacheRegistry {
    pub fn new(api_url: &str, repo: &Repo, token: impl Into<String>) -> Self {
        Self {
            caches_url: format!(
                "{}/repos/{}/{}/actions/caches",
                api_url.trim_end_matches('/'),
                repo.owner,
                repo.repo
            ),
            token: token.into(),
            agent: http::agent(),
        }
    }

    fn list_page(&self, prefix: &str, page: usize) -> ActionResult<CacheList> {
        debug!("GET {} key={} page={}", self.caches_url, prefix, page);

        let mut response = self
            .agent
            .get(&self.caches_url)
            .query("key", prefix)
            .query("per_page", &PAGE_SIZE.to_string())
            .query("page", &page.to_string())
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .header("User-Agent", http::USER_AGENT)
            .call()?;

        http::ensure_success("GET", &self.caches_url, &mut response)?;
        Ok(response.body_mut().read_json()?)
    }

    fn list_all(&self, prefix: &str) -> ActionResult<Vec<CacheEntry>> {
        let mut entries = Vec::new();
        let mut page = 1;

        loop {
            let list = self.list_page(prefix, page)?;
            let fetched = list.actions_caches.len();
            entries.extend(list.actions_caches);

            if fetched == 0 || entries.len() >= list.total_count {
                break;
            }
            page += 1;
        }

        Ok(entries)
    }

    fn delete_key(&self, key: &str) -> ActionResult<()> {
        debug!("DELETE {} key={}", self.caches_url, key);

        let mut response = self
            .agent
            .delete(&self.caches_url)
            .query("key", key)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .header("User-Agent", http::USER_AGENT)
            .call()?;

        http::ensure_success("DELETE", &self.caches_url, &mut response)
    }
}

#[async_trait]
impl CacheRegistry for GithubCacheRegistry {
    async fn list(&self, prefix: &str) -> ActionResult<Vec<CacheEntry>> {
        let client = self.clone();
        let prefix = prefix.to_string();
        http::blocking(move || client.list_all(&prefix)).await
    }

    async fn delete(&self, key: &str) -> ActionResult<()> {
        let client = self.clone();
        let key = key.to_string();
        http::blocking(move || client.delete_key(&key)).await
    }
}
