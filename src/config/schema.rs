//! Configuration schema
//!
//! `WorkflowPublisherPayload` is the job descriptor Publisher embeds in the
//! `publisher_payload` workflow input. `Config` is the validated, immutable
//! result of merging it with the action inputs.

use crate::error::{ActionError, ActionResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

/// Job descriptor sent by Publisher when dispatching the workflow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowPublisherPayload {
    /// Where status notifications are POSTed
    pub callback_url: String,

    /// Purge caches instead of restoring them
    pub clear_cache: bool,

    /// Variables to export before the build runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_variables: Option<BTreeMap<String, String>>,
}

impl WorkflowPublisherPayload {
    /// Structural checks serde can't express
    pub fn validate(&self) -> ActionResult<()> {
        validate_callback_url(&self.callback_url)?;

        if let Some(vars) = &self.environment_variables {
            for name in vars.keys() {
                if !is_env_var_name(name) {
                    return Err(ActionError::payload(
                        format!("environmentVariables.{}", name),
                        "not a valid environment variable name",
                    ));
                }
            }
        }

        Ok(())
    }
}

fn validate_callback_url(value: &str) -> ActionResult<()> {
    if value.trim().is_empty() {
        return Err(ActionError::payload("callbackUrl", "must not be empty"));
    }

    let url = Url::parse(value)
        .map_err(|e| ActionError::payload("callbackUrl", format!("invalid URL: {}", e)))?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ActionError::payload(
            "callbackUrl",
            format!("unsupported scheme {:?}", other),
        )),
    }
}

/// Whether `name` can be used as an environment variable name
pub fn is_env_var_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Cache settings; only present when both a key and paths were given
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Paths to archive, in input order
    pub paths: Vec<String>,

    /// Key prefix; every saved entry is `{key}-{timestamp}`
    pub key: String,
}

impl CacheConfig {
    /// Derive cache settings from the raw `cache_paths` / `cache_key` inputs
    pub fn from_inputs(cache_paths: &str, cache_key: &str) -> Option<Self> {
        let paths: Vec<String> = cache_paths
            .split('\n')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(String::from)
            .collect();

        if cache_key.is_empty() || paths.is_empty() {
            return None;
        }

        Some(Self {
            paths,
            key: cache_key.to_string(),
        })
    }
}

/// Validated configuration shared by all phases
#[derive(Debug, Clone)]
pub struct Config {
    /// Variable whose presence marks the build as successful
    pub success_env_var_name: String,

    /// `None` disables caching for the run
    pub cache: Option<CacheConfig>,

    /// Token for listing and deleting caches
    pub github_token: String,

    pub publisher_payload: WorkflowPublisherPayload,
}
