//! Error types for the Publisher action
//!
//! All modules use `ActionResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for action operations
pub type ActionResult<T> = Result<T, ActionError>;

/// Shown whenever pruning old caches fails
const TOKEN_PERMISSIONS_HINT: &str = "It can be that you need to give both \"read\" and \"write\" \
permissions to the GITHUB_TOKEN. The easiest way to do this is to update Actions settings of the repository.";

/// All errors that can occur while running a phase
#[derive(Error, Debug)]
pub enum ActionError {
    // Configuration errors
    #[error("Missing \"publisher_payload\" input. It should be defined in the workflow file.")]
    MissingPayload,

    #[error("Failed to parse \"publisher_payload\" input: {0}")]
    PayloadParse(#[source] serde_json::Error),

    #[error("Invalid publisher payload: {field}: {reason}")]
    PayloadInvalid { field: String, reason: String },

    #[error("Invalid inputs: {name}: {reason}")]
    InputInvalid { name: String, reason: String },

    #[error("Invalid run context: {0}")]
    RunContext(String),

    #[error("Failed to read event payload {path}: {source}")]
    EventRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Environment errors
    #[error("Failed to set environment variable {name}: {reason}")]
    EnvExport { name: String, reason: String },

    // Cache errors
    #[error("Failed to restore cache: {0}")]
    CacheRestore(String),

    #[error("Cache not saved. Key: {key}")]
    CacheNotSaved { key: String },

    #[error("Failed to save cache: {0}")]
    CacheSave(String),

    #[error("Failed to delete cache: {0}")]
    CachePrune(String),

    #[error("Cache service error: {0}")]
    CacheService(String),

    #[error("GitHub API request failed: {method} {url}: {status} {body}")]
    GithubApi {
        method: String,
        url: String,
        status: u16,
        body: String,
    },

    #[error("HTTP error: {0}")]
    Http(String),

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command execution error: {command}, stderr: {stderr}")]
    CommandExecution { command: String, stderr: String },

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ActionError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a command execution error
    pub fn command_exec(command: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::CommandExecution {
            command: command.into(),
            stderr: stderr.into(),
        }
    }

    /// Create a payload validation error for a field
    pub fn payload(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PayloadInvalid {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create an input validation error
    pub fn input(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InputInvalid {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error happened before the callback URL could be trusted
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::MissingPayload
                | Self::PayloadParse(_)
                | Self::PayloadInvalid { .. }
                | Self::InputInvalid { .. }
                | Self::RunContext(_)
                | Self::EventRead { .. }
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::CachePrune(_) => Some(TOKEN_PERMISSIONS_HINT),
            Self::MissingPayload => {
                Some("Declare a \"publisher_payload\" input under workflow_dispatch")
            }
            _ => None,
        }
    }
}

impl From<ureq::Error> for ActionError {
    fn from(err: ureq::Error) -> Self {
        Self::Http(err.to_string())
    }
}
