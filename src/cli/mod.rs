//! CLI module
//!
//! Command-line interface for the sync job.
//!
//! # Commands
//!
//! - `sync` - Fetch the feed and reload the table (default)
//! - `check` - Validate configuration, probe the database and the feed
//! - `schema` - Print the table DDL for an engine

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::{report_message, Runner};
