//! Phase implementations
//!
//! Each phase runs in its own process. They share nothing but the
//! `Config` resolved at startup and the process environment.

pub mod main;
pub mod post;
pub mod pre;

pub use main::execute as main;
pub use post::execute as post;
pub use pre::execute as pre;

use crate::cache::{ActionsCacheService, CacheManager};
use crate::cli::args::Phase;
use crate::config::Config;
use crate::context::RunContext;
use crate::environment::EnvExporter;
use crate::error::ActionResult;
use crate::github::GithubCacheRegistry;
use crate::notify::{HttpNotifier, Notifier, WorkflowStatus};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Collaborators a phase works with
pub struct Services {
    pub cache: CacheManager,
    pub notifier: Box<dyn Notifier>,
    pub env: EnvExporter,
}

impl Services {
    /// Wire up the production implementations
    pub fn from_context(config: &Config, context: &RunContext) -> Self {
        let storage = ActionsCacheService::new(
            context.results_url.clone(),
            context.runtime_token.clone(),
            context.workspace.clone(),
            context.temp_dir.clone(),
        );
        let registry = GithubCacheRegistry::new(&context.api_url, &context.repo, &config.github_token);

        Self {
            cache: CacheManager::new(config.cache.clone(), Arc::new(storage), Arc::new(registry)),
            notifier: Box::new(HttpNotifier::new(
                config.publisher_payload.callback_url.clone(),
                context.workflow_run_url(),
            )),
            env: EnvExporter::new(context.env_file.clone()),
        }
    }
}

/// Report `status` to Publisher; delivery failures are only logged
pub async fn notify_publisher(services: &Services, status: WorkflowStatus) {
    info!("Notifying Publisher");
    if let Err(e) = services.notifier.notify(status).await {
        warn!("Failed to notify Publisher: {}", e);
    }
}

/// Run `phase`; a failed phase reports `failure` before returning the error
pub async fn dispatch(phase: Phase, config: &Config, services: &Services) -> ActionResult<()> {
    let result = match phase {
        Phase::Pre => pre(config, services).await,
        Phase::Main => main(config, services).await,
        Phase::Post => post(config, services).await,
    };

    if let Err(e) = &result {
        debug!("Phase {:?} failed: {}", phase, e);
        notify_publisher(services, WorkflowStatus::Failure).await;
    }

    result
}
