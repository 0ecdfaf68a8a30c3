//! Engine types

use crate::config::{SyncOptions, DEFAULT_SNAPSHOT_DIR};
use crate::types::DateWindow;
use serde::Serialize;
use std::path::PathBuf;

/// Configuration for a sync run
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Which records are selected for loading
    pub window: DateWindow,
    /// Lookback for [`DateWindow::TrailingDays`]
    pub trailing_days: u32,
    /// Abort the load on the first record error
    pub fail_fast: bool,
    /// Days to shift the stored range start earlier (0 = off)
    pub range_start_lookback_days: u32,
    /// Where to write the snapshot of loaded records (`None` skips it)
    pub snapshot_dir: Option<PathBuf>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            window: DateWindow::FromToday,
            trailing_days: 7,
            fail_fast: true,
            range_start_lookback_days: 0,
            snapshot_dir: Some(PathBuf::from(DEFAULT_SNAPSHOT_DIR)),
        }
    }
}

impl SyncConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Select records updated within the last `days` days
    #[must_use]
    pub fn with_trailing_window(mut self, days: u32) -> Self {
        self.window = DateWindow::TrailingDays;
        self.trailing_days = days;
        self
    }

    /// Set fail fast mode
    #[must_use]
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    #[must_use]
    pub fn with_range_start_lookback(mut self, days: u32) -> Self {
        self.range_start_lookback_days = days;
        self
    }

    /// Write a snapshot of loaded records into `dir`
    #[must_use]
    pub fn with_snapshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.snapshot_dir = Some(dir.into());
        self
    }

    /// Skip the snapshot for this run
    #[must_use]
    pub fn without_snapshot(mut self) -> Self {
        self.snapshot_dir = None;
        self
    }
}

impl From<&SyncOptions> for SyncConfig {
    fn from(options: &SyncOptions) -> Self {
        Self {
            window: options.window,
            trailing_days: options.trailing_days,
            fail_fast: options.fail_fast,
            range_start_lookback_days: options.range_start_lookback_days,
            snapshot_dir: options.snapshot_dir.clone(),
        }
    }
}

/// Counts and outcome of one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncStats {
    /// Records in the feed
    pub total: usize,
    /// Records inside the date window
    pub selected: usize,
    /// Records outside the date window
    pub dropped: usize,
    /// Rows removed by the truncate, when it succeeded
    pub purged: Option<u64>,
    /// Rows inserted (committed only if `committed`)
    pub inserted: usize,
    /// Records skipped after an error (only without fail-fast)
    pub skipped: usize,
    /// Whether the insert transaction was committed
    pub committed: bool,
    /// Error that aborted the insert phase
    pub failure: Option<String>,
    /// Snapshot written for this run
    pub snapshot: Option<PathBuf>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl SyncStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_inserted(&mut self) {
        self.inserted += 1;
    }

    pub fn add_skipped(&mut self) {
        self.skipped += 1;
    }

    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }

    /// True when every selected record was inserted and committed
    pub fn is_complete(&self) -> bool {
        self.committed && self.failure.is_none() && self.inserted == self.selected
    }
}
