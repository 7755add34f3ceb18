//! Configuration resolution
//!
//! Runs once at the start of every phase, before any side effect, and
//! produces the immutable `Config` the phase works with.

pub mod schema;

pub use schema::{CacheConfig, Config, WorkflowPublisherPayload};

use crate::context::{ActionInputs, RunContext};
use crate::error::{ActionError, ActionResult};
use schema::is_env_var_name;
use tracing::debug;

/// Name of the event input carrying the JSON payload
pub const PAYLOAD_INPUT: &str = "publisher_payload";

/// Validate the event payload and action inputs into a `Config`
pub fn resolve(context: &RunContext, inputs: &ActionInputs) -> ActionResult<Config> {
    let publisher_payload = parse_payload(context.event_input(PAYLOAD_INPUT))?;

    let success_env_var_name = inputs.get("success_env_var_name");
    if !is_env_var_name(&success_env_var_name) {
        return Err(ActionError::input(
            "success_env_var_name",
            format!("{:?} is not a valid environment variable name", success_env_var_name),
        ));
    }

    let github_token = inputs.get("github_token");
    if github_token.is_empty() {
        return Err(ActionError::input("github_token", "must not be empty"));
    }

    let cache = CacheConfig::from_inputs(&inputs.get("cache_paths"), &inputs.get("cache_key"));
    match &cache {
        Some(c) => debug!("Caching enabled, key prefix {} for {} path(s)", c.key, c.paths.len()),
        None => debug!("Caching disabled"),
    }

    Ok(Config {
        success_env_var_name,
        cache,
        github_token,
        publisher_payload,
    })
}

/// Decode and validate the raw `publisher_payload` string
pub fn parse_payload(raw: Option<&str>) -> ActionResult<WorkflowPublisherPayload> {
    let raw = raw
        .filter(|s| !s.trim().is_empty())
        .ok_or(ActionError::MissingPayload)?;

    let value: serde_json::Value = serde_json::from_str(raw).map_err(ActionError::PayloadParse)?;

    let payload: WorkflowPublisherPayload = serde_json::from_value(value)
        .map_err(|e| ActionError::payload(PAYLOAD_INPUT, e.to_string()))?;
    payload.validate()?;

    Ok(payload)
}
