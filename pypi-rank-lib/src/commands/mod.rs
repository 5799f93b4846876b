//! Command-line interface and orchestration for pypi-rank
//!
//! This module implements the CLI commands and wires the data collection, scoring, and
//! reporting layers together. It handles argument parsing, configuration management, and the
//! high-level workflows.
//!
//! # Commands
//!
//! - **search**: Find packages whose name (and optionally description) matches a query,
//!   enrich them with popularity signals, rank them, and print a table or JSON lines
//! - **auth-github**: Run the GitHub device flow and store the resulting token
//! - **clear-cache**: Remove every cached upstream response
//!
//! # Execution Flow
//!
//! The `run` function parses command-line arguments using clap and routes to the
//! appropriate command handler. A search follows these steps:
//!
//! 1. Parse arguments and load configuration
//! 2. Open the response cache, clearing it first if requested
//! 3. Collect and score package records using [`crate::facts::Collector`]
//! 4. Render the ranked records using [`crate::reports`]
//!
//! The `common` module provides shared functionality like logging setup, color mode
//! handling, and cache directory resolution.

mod auth;
mod clear_cache;
mod common;
mod config;
mod host;
mod progress_reporter;
mod run;
mod search;

#[cfg(debug_assertions)]
pub use config::Config;

pub use auth::{AuthArgs, auth_github};
pub use clear_cache::{ClearCacheArgs, clear_cache};
pub use host::Host;
pub use progress_reporter::ProgressReporter;
pub use run::run;
pub use search::{SearchArgs, search};
