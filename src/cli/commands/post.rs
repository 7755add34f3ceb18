//! Post phase - persist the cache of a successful build, report the outcome

use super::{notify_publisher, Services};
use crate::config::Config;
use crate::environment::marker_present;
use crate::error::ActionResult;
use crate::notify::WorkflowStatus;
use tracing::info;

/// Execute the post phase
pub async fn execute(config: &Config, services: &Services) -> ActionResult<()> {
    let is_success = marker_present(&config.success_env_var_name);

    if is_success && config.cache.is_some() {
        info!("Deleting previous caches");
        services.cache.prune().await?;

        info!("Saving cache");
        services.cache.save().await?;
    }

    let status = if is_success {
        WorkflowStatus::Success
    } else {
        WorkflowStatus::Failure
    };
    notify_publisher(services, status).await;

    Ok(())
}
