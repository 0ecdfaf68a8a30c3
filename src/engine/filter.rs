//! Date-window selection of feed records

use crate::transform::{parse_feed_datetime, RawElectionRecord};
use crate::types::DateWindow;
use chrono::{Duration, NaiveDateTime};
use tracing::debug;

/// Decides which feed records are loaded
#[derive(Debug, Clone, Copy)]
pub struct RecordFilter {
    window: DateWindow,
    trailing_days: u32,
    now: NaiveDateTime,
}

impl RecordFilter {
    pub fn new(window: DateWindow, trailing_days: u32, now: NaiveDateTime) -> Self {
        Self {
            window,
            trailing_days,
            now,
        }
    }

    /// Earliest accepted value: today at midnight, or `now` minus the trailing days
    pub fn cutoff(&self) -> NaiveDateTime {
        match self.window {
            DateWindow::FromToday => self.now.date().and_time(chrono::NaiveTime::MIN),
            DateWindow::TrailingDays => {
                self.now - Duration::days(i64::from(self.trailing_days))
            }
        }
    }

    /// Human description of the window for logs
    pub fn describe(&self) -> String {
        match self.window {
            DateWindow::FromToday => format!("starting from {}", self.now.date()),
            DateWindow::TrailingDays => format!(
                "updated since {}",
                self.cutoff().format("%Y-%m-%d %H:%M:%S")
            ),
        }
    }

    /// Whether `record` falls inside the window
    ///
    /// Records without a parseable anchor date are never selected.
    pub fn accepts(&self, record: &RawElectionRecord) -> bool {
        let anchor = match self.window {
            DateWindow::FromToday => record.range_start_date(),
            DateWindow::TrailingDays => record.date_updated(),
        };
        let Some(value) = anchor else {
            return false;
        };
        let Some(at) = parse_feed_datetime(value) else {
            debug!(
                election_id = %record.election_id().unwrap_or_default(),
                value, "Unparseable window date, dropping record"
            );
            return false;
        };

        match self.window {
            DateWindow::FromToday => at.date() >= self.now.date(),
            DateWindow::TrailingDays => at >= self.cutoff(),
        }
    }

    /// Split `records` into (selected, dropped count), keeping feed order
    pub fn select(&self, records: &[RawElectionRecord]) -> (Vec<RawElectionRecord>, usize) {
        let selected: Vec<RawElectionRecord> = records
            .iter()
            .filter(|r| self.accepts(r))
            .cloned()
            .collect();
        let dropped = records.len() - selected.len();
        (selected, dropped)
    }
}
