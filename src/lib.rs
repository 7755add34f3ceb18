//! Publisher action
//!
//! Coordinates the build cache and reports run status back to Publisher
//! for workflow runs it dispatches.

pub mod cache;
pub mod cli;
pub mod config;
pub mod context;
pub mod environment;
pub mod error;
pub mod github;
pub mod http;
pub mod logging;
pub mod notify;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{ActionError, ActionResult};
