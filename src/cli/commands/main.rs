//! Main phase - export payload variables, restore the cache

use super::Services;
use crate::config::Config;
use crate::error::ActionResult;
use tracing::{info, warn};

/// Execute the main phase
pub async fn execute(config: &Config, services: &Services) -> ActionResult<()> {
    if let Some(vars) = &config.publisher_payload.environment_variables {
        info!("Setting environment variables");
        for (name, value) in vars {
            services.env.export(name, value).await?;
        }
    }

    if config.cache.is_some() && !config.publisher_payload.clear_cache {
        info!("Restoring cache");
        // A cold cache only makes the build slower
        if let Err(e) = services.cache.restore().await {
            warn!("{}", e);
        }
    }

    Ok(())
}
