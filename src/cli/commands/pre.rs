//! Pre phase - announce the run, clear caches on request

use super::{notify_publisher, Services};
use crate::config::Config;
use crate::error::ActionResult;
use crate::notify::WorkflowStatus;
use tracing::info;

/// Execute the pre phase
pub async fn execute(config: &Config, services: &Services) -> ActionResult<()> {
    notify_publisher(services, WorkflowStatus::Started).await;

    if config.cache.is_some() && config.publisher_payload.clear_cache {
        info!("Clearing caches");
        services.cache.prune().await?;
    }

    Ok(())
}
