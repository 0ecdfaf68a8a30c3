//! CLI commands and argument parsing

use crate::types::DbType;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Election Guide feed → SQL table sync
#[derive(Parser, Debug)]
#[command(name = "election-guide-sync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML); defaults to ./config.yaml when present
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Subcommand to run; `sync` when none is given
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Sync)
    }
}

/// CLI subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Fetch the feed and reload the table (default)
    Sync,

    /// Validate configuration and test database and feed access
    Check,

    /// Print the CREATE TABLE statement
    Schema {
        /// Target engine (mssql or mysql); defaults to the configured DB_TYPE
        #[arg(long)]
        db_type: Option<DbType>,
    },
}
