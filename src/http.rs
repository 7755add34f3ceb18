//! Shared HTTP plumbing
//!
//! `ureq` is blocking, so every request runs on tokio's blocking pool.

use crate::error::{ActionError, ActionResult};
use ureq::http::Response;
use ureq::{Agent, Body};

/// User agent sent with every request
pub const USER_AGENT: &str = concat!("publisher-action/", env!("CARGO_PKG_VERSION"));

/// Agent that hands non-2xx responses back instead of turning them into errors
pub fn agent() -> Agent {
    Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .into()
}

/// Run a blocking closure without stalling the async runtime
pub async fn blocking<F, T>(f: F) -> ActionResult<T>
where
    F: FnOnce() -> ActionResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ActionError::Internal(format!("blocking task failed: {}", e)))?
}

/// Read the body of a response, falling back to an empty string
pub fn body_text(response: &mut Response<Body>) -> String {
    response
        .body_mut()
        .read_to_string()
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Turn a non-2xx GitHub API response into an error
pub fn ensure_success(method: &str, url: &str, response: &mut Response<Body>) -> ActionResult<()> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }

    Err(ActionError::GithubApi {
        method: method.to_string(),
        url: url.to_string(),
        status: status.as_u16(),
        body: body_text(response),
    })
}
