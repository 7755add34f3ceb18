//! Status notifications to Publisher
//!
//! Delivery problems are returned, never raised: callers log them and move
//! on, because a lost notification must not change the outcome of the run.

use crate::http;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::debug;
use ureq::Agent;

/// Status reported to the callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    Started,
    Success,
    Failure,
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started => write!(f, "started"),
            Self::Success => write!(f, "success"),
            Self::Failure => write!(f, "failure"),
        }
    }
}

/// Wire payload POSTed to the callback URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStatusNotification {
    pub status: WorkflowStatus,
    pub workflow_run_url: String,
}

/// Why a notification did not arrive
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("{status} {body}")]
    Rejected { status: u16, body: String },

    #[error("{0}")]
    Transport(String),
}

/// Something that can tell Publisher about the run status
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, status: WorkflowStatus) -> Result<(), NotifyError>;
}

/// Notifier POSTing JSON to the payload's callback URL
pub struct HttpNotifier {
    callback_url: String,
    workflow_run_url: String,
    agent: Agent,
}

impl HttpNotifier {
    pub fn new(callback_url: impl Into<String>, workflow_run_url: impl Into<String>) -> Self {
        Self {
            callback_url: callback_url.into(),
            workflow_run_url: workflow_run_url.into(),
            agent: http::agent(),
        }
    }

    /// The notification sent for `status`
    pub fn notification(&self, status: WorkflowStatus) -> WorkflowStatusNotification {
        WorkflowStatusNotification {
            status,
            workflow_run_url: self.workflow_run_url.clone(),
        }
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn notify(&self, status: WorkflowStatus) -> Result<(), NotifyError> {
        let body = serde_json::to_vec(&self.notification(status))
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        let agent = self.agent.clone();
        let url = self.callback_url.clone();

        debug!("POST {} status={}", url, status);

        let outcome = tokio::task::spawn_blocking(move || {
            let mut response = agent
                .post(&url)
                .header("Content-Type", "application/json")
                .header("User-Agent", http::USER_AGENT)
                .send(&body[..])
                .map_err(|e| NotifyError::Transport(e.to_string()))?;

            if response.status().is_success() {
                Ok(())
            } else {
                Err(NotifyError::Rejected {
                    status: response.status().as_u16(),
                    body: http::body_text(&mut response),
                })
            }
        })
        .await;

        match outcome {
            Ok(result) => result,
            Err(e) => Err(NotifyError::Transport(format!("notification task failed: {}", e))),
        }
    }
}
