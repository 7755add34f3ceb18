//! CLI argument definitions using clap derive

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// Publisher action - cache lifecycle and status notification
///
/// Runs one phase of a Publisher workflow job: `pre` reports the start,
/// `main` prepares environment and cache, `post` saves the cache and
/// reports the outcome.
#[derive(Parser, Debug)]
#[command(name = "publisher-action")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Phase to execute
    #[command(subcommand)]
    pub phase: Phase,

    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(flatten)]
    pub context: RunContextArgs,
}

/// Lifecycle phases, invoked by the runner in this order
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Notify the callback that the run started, clear caches if requested
    Pre,

    /// Export payload environment variables and restore the cache
    Main,

    /// Save the cache on success and report the final status
    Post,
}

/// Run context, normally provided by the runner through environment variables
#[derive(Args, Debug, Clone)]
pub struct RunContextArgs {
    /// Path to the JSON payload of the triggering event
    #[arg(long, env = "GITHUB_EVENT_PATH")]
    pub event_path: Option<PathBuf>,

    /// GitHub server URL
    #[arg(long, env = "GITHUB_SERVER_URL", default_value = "https://github.com")]
    pub server_url: String,

    /// GitHub REST API URL
    #[arg(long, env = "GITHUB_API_URL", default_value = "https://api.github.com")]
    pub api_url: String,

    /// Repository as owner/repo
    #[arg(long, env = "GITHUB_REPOSITORY")]
    pub repository: Option<String>,

    /// Workflow run ID
    #[arg(long, env = "GITHUB_RUN_ID")]
    pub run_id: Option<u64>,

    /// Workspace directory cache paths are relative to
    #[arg(long, env = "GITHUB_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// Scratch directory for cache archives
    #[arg(long, env = "RUNNER_TEMP")]
    pub temp_dir: Option<PathBuf>,

    /// File that exported environment variables are appended to
    #[arg(long, env = "GITHUB_ENV")]
    pub env_file: Option<PathBuf>,

    /// Cache service base URL
    #[arg(long, env = "ACTIONS_RESULTS_URL", hide = true)]
    pub results_url: Option<String>,

    /// Cache service token
    #[arg(long, env = "ACTIONS_RUNTIME_TOKEN", hide = true, hide_env_values = true)]
    pub runtime_token: Option<String>,
}
