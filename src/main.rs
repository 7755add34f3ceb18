//! Publisher action - entry point
//!
//! Resolves the run context and configuration, then runs one phase.

use clap::Parser;
use publisher_action::cli::commands::{self, Services};
use publisher_action::cli::Cli;
use publisher_action::config;
use publisher_action::context::{ActionInputs, RunContext};
use publisher_action::error::ActionResult;
use publisher_action::logging;
use std::process::ExitCode;
use tracing::{debug, error};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if e.is_config_error() {
                error!("Failed to get config: {}", e);
            } else {
                error!("{}", e);
            }
            if let Some(hint) = e.hint() {
                error!("Hint: {}", hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ActionResult<()> {
    // Nothing may touch the cache or the callback before this succeeds
    let context = RunContext::from_args(&cli.context)?;
    let config = config::resolve(&context, &ActionInputs::from_env())?;
    debug!("Running {:?} phase for {}", cli.phase, context.workflow_run_url());

    let services = Services::from_context(&config, &context);
    commands::dispatch(cli.phase, &config, &services).await
}
