//! Execution engine module
//!
//! Runs one full reload of the destination table.
//!
//! # Overview
//!
//! - `SyncJob`: ensure schema → fetch → filter → truncate → insert → commit
//! - `RecordFilter`: date-window selection of feed records
//! - `SyncConfig` / `SyncStats`: run options and outcome
//!
//! Fetch and schema failures are fatal and returned as errors. A failing
//! record aborts the insert phase (or is skipped without fail-fast); the
//! run still returns its stats so the caller can report partial progress.

mod filter;
mod types;

pub use filter::RecordFilter;
pub use types::{SyncConfig, SyncStats};

use crate::config::FeedSettings;
use crate::database::TableLoader;
use crate::error::{Error, Result};
use crate::http::FeedClient;
use crate::output::SnapshotWriter;
use crate::transform::{NormalizedElectionRow, RawElectionRecord, RecordTransformer};
use chrono::NaiveDateTime;
use std::time::Instant;
use tracing::{error, info, warn};

const LOG_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Orchestrates a truncate-and-reload of the election table
pub struct SyncJob {
    /// Feed client
    client: FeedClient,
    /// Feed endpoint and token
    feed: FeedSettings,
    /// Sync configuration
    config: SyncConfig,
}

impl SyncJob {
    pub fn new(client: FeedClient, feed: FeedSettings) -> Self {
        Self {
            client,
            feed,
            config: SyncConfig::default(),
        }
    }

    /// Set sync configuration
    #[must_use]
    pub fn with_config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Run one reload with `now` as the clock
    ///
    /// The loader is closed on every path. Errors are only returned for
    /// failures before the insert phase.
    pub async fn run(&self, mut loader: Box<dyn TableLoader>, now: NaiveDateTime) -> Result<SyncStats> {
        let start = Instant::now();
        info!("Election Guide sync running");
        info!("Run date/time: {}", now.format(LOG_TIME_FORMAT));

        let result = self.execute(loader.as_mut(), now).await;

        if let Err(e) = &result {
            error!("{e}");
            if let Err(e) = loader.rollback().await {
                warn!("Rollback failed: {e}");
            }
        }
        if let Err(e) = loader.close().await {
            warn!("Error closing database connection: {e}");
        }
        info!(
            "Terminating sync - {}",
            chrono::Local::now().naive_local().format(LOG_TIME_FORMAT)
        );

        let mut stats = result?;
        stats.set_duration(start.elapsed().as_millis() as u64);
        Ok(stats)
    }

    async fn execute(&self, loader: &mut dyn TableLoader, now: NaiveDateTime) -> Result<SyncStats> {
        let mut stats = SyncStats::new();
        let table = loader.sql().qualified_table();

        loader.ensure_schema().await?;

        let records = self.client.fetch(&self.feed).await?;
        if records.is_empty() {
            return Err(Error::EmptyFeed);
        }
        info!("API returned payload is VALID");

        stats.total = records.len();
        info!("Found Total of {} unique Election IDs", stats.total);

        let filter = RecordFilter::new(self.config.window, self.config.trailing_days, now);
        let (selected, dropped) = filter.select(&records);
        stats.selected = selected.len();
        stats.dropped = dropped;

        info!("Purging (Truncate) table {table}");
        match loader.truncate().await {
            Ok(removed) => {
                info!("Purged (Removed) {removed} rows from table {table}");
                stats.purged = Some(removed);
            }
            Err(e) => error!("Error truncating table {table}: {e}"),
        }

        info!("Processing Election Guide JSON payload data");
        info!("Found {} Election IDs {}", stats.selected, filter.describe());
        info!("Found {} Election IDs outside the window", stats.dropped);
        info!("Inserting Total of {} unique Election IDs", stats.selected);

        let transformer = RecordTransformer::new(now)
            .with_range_start_lookback(self.config.range_start_lookback_days);
        let mut loaded = Vec::with_capacity(selected.len());

        for record in selected {
            match load_record(loader, &transformer, &record).await {
                Ok(row) => {
                    info!(
                        "Inserting Election ID {} - {} - {}",
                        row.election_id,
                        row.election_name,
                        row.date_updated.as_deref().unwrap_or_default()
                    );
                    stats.add_inserted();
                    loaded.push(record);
                }
                Err(e) if !self.config.fail_fast => {
                    warn!(
                        "Skipping Election ID {}: {e}",
                        record.election_id().unwrap_or_default()
                    );
                    stats.add_skipped();
                }
                Err(e) => {
                    if e.is_transform() {
                        error!(
                            "Invalid record for Election ID {}: {e}",
                            record.election_id().unwrap_or_default()
                        );
                    } else {
                        error!("An error occurred {e}");
                    }
                    stats.failure = Some(e.to_string());
                    break;
                }
            }
        }

        if stats.failure.is_some() {
            if let Err(e) = loader.rollback().await {
                warn!("Rollback failed: {e}");
            }
            warn!(
                "Load aborted after {} of {} Election IDs; nothing committed",
                stats.inserted, stats.selected
            );
            return Ok(stats);
        }

        if let Err(e) = loader.commit().await {
            error!("An error occurred {e}");
            stats.failure = Some(e.to_string());
            if let Err(e) = loader.rollback().await {
                warn!("Rollback failed: {e}");
            }
            return Ok(stats);
        }
        stats.committed = true;
        info!("Election Guide data successfully inserted");

        if let Some(dir) = &self.config.snapshot_dir {
            match SnapshotWriter::new(dir).write(&loaded, now).await {
                Ok(path) => {
                    info!("Snapshot written to {}", path.display());
                    stats.snapshot = Some(path);
                }
                Err(e) => warn!("Snapshot not written: {e}"),
            }
        }

        Ok(stats)
    }
}

async fn load_record(
    loader: &mut dyn TableLoader,
    transformer: &RecordTransformer,
    record: &RawElectionRecord,
) -> Result<NormalizedElectionRow> {
    let row = transformer.normalize(record)?;
    loader.insert_row(&row).await?;
    Ok(row)
}

#[cfg(test)]
mod tests;
