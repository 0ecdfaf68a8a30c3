// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Election Guide Sync
//!
//! Keeps the `ElectionGuide` SQL table current with the Election Guide
//! feed. Every run is a full truncate-and-reload into SQL Server or MySQL.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use election_guide_sync::{database, FeedClient, Settings, SyncConfig, SyncJob};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> election_guide_sync::Result<()> {
//!     let settings = Settings::load(None)?;
//!     let loader = database::connect(&settings.database_settings()?, &settings.sync.table).await?;
//!
//!     let job = SyncJob::new(FeedClient::new()?, settings.feed_settings()?)
//!         .with_config(SyncConfig::from(&settings.sync));
//!     let stats = job.run(loader, chrono::Local::now().naive_local()).await?;
//!
//!     println!("inserted {} of {}", stats.inserted, stats.selected);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────────┐   ┌────────────────────────┐
//! │  FeedClient  │──▶│ RecordTransformer│──▶│      TableLoader       │
//! │  GET + Token │   │ defaults, dates, │   │ MssqlLoader (tiberius) │
//! │              │   │ voting methods   │   │ MysqlLoader (sqlx)     │
//! └──────────────┘   └──────────────────┘   └────────────────────────┘
//!         ▲                                             ▲
//!         └──────────────── SyncJob ────────────────────┘
//!      ensure schema → fetch → filter → truncate → insert → commit
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Settings from YAML, `.env` and the environment
pub mod config;

/// Feed client
pub mod http;

/// Raw record → table row
pub mod transform;

/// Destination table loaders
pub mod database;

/// Run orchestration
pub mod engine;

/// Snapshot files
pub mod output;

/// Console and per-run file logging
pub mod logging;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

pub use config::Settings;
pub use database::{connect, TableLoader};
pub use engine::{SyncConfig, SyncJob, SyncStats};
pub use http::FeedClient;
pub use transform::{normalize, NormalizedElectionRow, RawElectionRecord, RecordTransformer};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
