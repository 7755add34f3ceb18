//! Workflow run context
//!
//! Everything the runner tells us about the current run: repository,
//! run id, URLs, the triggering event and the action's `INPUT_*` values.

use crate::cli::args::RunContextArgs;
use crate::error::{ActionError, ActionResult};
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Owner and name of the repository the run belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repo {
    pub owner: String,
    pub repo: String,
}

impl Repo {
    /// Parse `owner/repo`
    pub fn parse(value: &str) -> ActionResult<Self> {
        match value.split_once('/') {
            Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
                Ok(Self {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                })
            }
            _ => Err(ActionError::RunContext(format!(
                "GITHUB_REPOSITORY must look like owner/repo, got {:?}",
                value
            ))),
        }
    }
}

/// Immutable view of the current workflow run
#[derive(Debug, Clone)]
pub struct RunContext {
    pub server_url: String,
    pub api_url: String,
    pub repo: Repo,
    pub run_id: u64,
    pub workspace: PathBuf,
    pub temp_dir: PathBuf,
    pub env_file: Option<PathBuf>,
    pub results_url: Option<String>,
    pub runtime_token: Option<String>,
    event_inputs: serde_json::Map<String, serde_json::Value>,
}

impl RunContext {
    /// Build the context from CLI arguments (which fall back to runner env vars)
    pub fn from_args(args: &RunContextArgs) -> ActionResult<Self> {
        let repository = args.repository.as_deref().ok_or_else(|| {
            ActionError::RunContext("GITHUB_REPOSITORY is not set".to_string())
        })?;
        let repo = Repo::parse(repository)?;

        let run_id = args
            .run_id
            .ok_or_else(|| ActionError::RunContext("GITHUB_RUN_ID is not set".to_string()))?;

        let event_inputs = match &args.event_path {
            Some(path) => Self::read_event_inputs(path)?,
            None => {
                debug!("GITHUB_EVENT_PATH not set, no event inputs available");
                serde_json::Map::new()
            }
        };

        let workspace = match &args.workspace {
            Some(path) => path.clone(),
            None => std::env::current_dir()
                .map_err(|e| ActionError::io("getting current directory", e))?,
        };

        Ok(Self {
            server_url: args.server_url.trim_end_matches('/').to_string(),
            api_url: args.api_url.trim_end_matches('/').to_string(),
            repo,
            run_id,
            workspace,
            temp_dir: args.temp_dir.clone().unwrap_or_else(std::env::temp_dir),
            env_file: args.env_file.clone(),
            results_url: args.results_url.clone().filter(|s| !s.is_empty()),
            runtime_token: args.runtime_token.clone().filter(|s| !s.is_empty()),
            event_inputs,
        })
    }

    /// Extract the `inputs` object of the triggering event
    fn read_event_inputs(path: &Path) -> ActionResult<serde_json::Map<String, serde_json::Value>> {
        let content = std::fs::read_to_string(path).map_err(|e| ActionError::EventRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        let event: serde_json::Value = serde_json::from_str(&content).map_err(|e| {
            ActionError::RunContext(format!("event payload {} is not JSON: {}", path.display(), e))
        })?;

        Ok(event
            .get("inputs")
            .and_then(|inputs| inputs.as_object())
            .cloned()
            .unwrap_or_default())
    }

    /// A string-typed field of the event's `inputs` object
    pub fn event_input(&self, name: &str) -> Option<&str> {
        self.event_inputs.get(name).and_then(|v| v.as_str())
    }

    /// Link to the workflow run; there is no cheap way to get the job ID,
    /// so this points at the run rather than at a specific log.
    pub fn workflow_run_url(&self) -> String {
        format!(
            "{}/{}/{}/actions/runs/{}",
            self.server_url, self.repo.owner, self.repo.repo, self.run_id
        )
    }
}

/// Snapshot of the action's declared inputs (`INPUT_*` variables)
#[derive(Debug, Clone, Default)]
pub struct ActionInputs {
    values: HashMap<String, String>,
}

impl ActionInputs {
    /// Capture all `INPUT_*` variables of the current process
    pub fn from_env() -> Self {
        Self::from_os_vars(std::env::vars_os())
    }

    /// Capture inputs from raw OS pairs. Variables that are not valid
    /// UTF-8 cannot be inputs and are skipped.
    pub fn from_os_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        Self::from_vars(vars.into_iter().filter_map(|(k, v)| {
            match (k.into_string(), v.into_string()) {
                (Ok(k), Ok(v)) => Some((k, v)),
                (Ok(k), Err(_)) if k.starts_with("INPUT_") => {
                    warn!("Ignoring input {}: value is not valid UTF-8", k);
                    None
                }
                _ => None,
            }
        }))
    }

    /// Capture inputs from an arbitrary set of environment-style pairs
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let values = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(k, _)| k.starts_with("INPUT_"))
            .collect();
        Self { values }
    }

    /// Environment variable name the runner uses for an input
    pub fn env_name(name: &str) -> String {
        format!("INPUT_{}", name.replace(' ', "_").to_uppercase())
    }

    /// Trimmed input value; missing inputs read as empty
    pub fn get(&self, name: &str) -> String {
        self.values
            .get(&Self::env_name(name))
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    }
}
