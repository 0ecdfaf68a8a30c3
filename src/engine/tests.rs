//! Tests for engine module

use super::*;
use crate::config::SyncOptions;
use crate::database::SqlBuilder;
use crate::types::{DateWindow, DbType};
use async_trait::async_trait;
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use test_case::test_case;
use url::Url;
use wiremock::matchers::{header, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(10, 30, 0)
        .unwrap()
}

fn election(id: &str, range_start: &str) -> Value {
    json!({
        "election_id": id,
        "election_name": {"en_US": format!("Election {id}")},
        "date_updated": "2024-02-28T08:00:00.000000Z",
        "election_range_start_date": range_start,
        "election_declared_start_date": range_start,
        "district": {"district_ocd_id": "ocd-division/country:xx", "district_country": "XX"},
        "government_functions": {"details": "Legislative", "updated": "2024-01-01"},
    })
}

fn raw(value: Value) -> RawElectionRecord {
    RawElectionRecord::from_value(value).unwrap()
}

// ============================================================================
// Recording loader
// ============================================================================

#[derive(Debug, Default)]
struct LoaderState {
    table_exists: bool,
    schema_created: bool,
    rows: Vec<NormalizedElectionRow>,
    pending: Vec<NormalizedElectionRow>,
    truncate_calls: usize,
    commits: usize,
    rollbacks: usize,
    closed: bool,
    fail_truncate: bool,
    fail_commit: bool,
    fail_insert_for: Option<String>,
}

#[derive(Clone)]
struct RecordingLoader {
    sql: SqlBuilder,
    state: Arc<Mutex<LoaderState>>,
}

impl RecordingLoader {
    fn new() -> Self {
        Self {
            sql: SqlBuilder::new(DbType::Mssql, "ElectionGuide"),
            state: Arc::new(Mutex::new(LoaderState {
                table_exists: true,
                ..Default::default()
            })),
        }
    }

    fn with_rows(self, rows: usize) -> Self {
        self.state.lock().unwrap().rows = vec![NormalizedElectionRow::default(); rows];
        self
    }

    fn boxed(&self) -> Box<dyn TableLoader> {
        Box::new(self.clone())
    }

    fn state(&self) -> std::sync::MutexGuard<'_, LoaderState> {
        self.state.lock().unwrap()
    }
}

#[async_trait]
impl TableLoader for RecordingLoader {
    fn sql(&self) -> &SqlBuilder {
        &self.sql
    }

    async fn execute(&mut self, _sql: &str) -> Result<u64> {
        Ok(0)
    }

    async fn query_count(&mut self, _sql: &str) -> Result<i64> {
        Ok(0)
    }

    async fn ensure_schema(&mut self) -> Result<bool> {
        let mut state = self.state();
        if state.table_exists {
            return Ok(false);
        }
        state.table_exists = true;
        state.schema_created = true;
        Ok(true)
    }

    async fn truncate(&mut self) -> Result<u64> {
        let mut state = self.state();
        state.truncate_calls += 1;
        if state.fail_truncate {
            return Err(Error::database("permission denied for TRUNCATE"));
        }
        let removed = state.rows.len() as u64;
        state.rows.clear();
        Ok(removed)
    }

    async fn insert_row(&mut self, row: &NormalizedElectionRow) -> Result<()> {
        let mut state = self.state();
        if state.fail_insert_for.as_deref() == Some(row.election_id.as_str()) {
            return Err(Error::database("String or binary data would be truncated"));
        }
        state.pending.push(row.clone());
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        let mut state = self.state();
        if state.fail_commit {
            return Err(Error::database("Transaction log is full"));
        }
        let pending = std::mem::take(&mut state.pending);
        state.rows.extend(pending);
        state.commits += 1;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        let mut state = self.state();
        state.pending.clear();
        state.rollbacks += 1;
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.state().closed = true;
        Ok(())
    }
}

async fn feed_server(body: Value) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("Authorization", "Token test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;
    server
}

fn job(server: &MockServer, config: SyncConfig) -> SyncJob {
    let feed = FeedSettings {
        endpoint: Url::parse(&format!("{}/api/v2/elections/", server.uri())).unwrap(),
        token: "test-token".to_string(),
    };
    SyncJob::new(FeedClient::new().unwrap(), feed).with_config(config)
}

fn no_snapshot() -> SyncConfig {
    SyncConfig::new().without_snapshot()
}

// ============================================================================
// SyncJob Tests
// ============================================================================

#[tokio::test]
async fn test_single_record_end_to_end() {
    let server = feed_server(json!([{
        "election_id": "abc",
        "election_name": {"en_US": "Test"},
        "election_range_start_date": "2024-03-02",
        "election_declared_start_date": "2024-03-02",
        "district": {},
        "government_functions": {"details": "x"},
        "voting_methods": [{"type": "mail"}, {"type": "in-person"}]
    }]))
    .await;
    let loader = RecordingLoader::new().with_rows(4);

    let stats = job(&server, no_snapshot())
        .run(loader.boxed(), now())
        .await
        .unwrap();

    assert_eq!(stats.total, 1);
    assert_eq!(stats.selected, 1);
    assert_eq!(stats.dropped, 0);
    assert_eq!(stats.purged, Some(4));
    assert_eq!(stats.inserted, 1);
    assert!(stats.committed);
    assert!(stats.is_complete());

    let state = loader.state();
    assert_eq!(state.rows.len(), 1);
    assert_eq!(state.rows[0].election_id, "abc");
    assert_eq!(state.rows[0].election_name, "Test");
    assert_eq!(state.rows[0].voting_type.as_deref(), Some("mail!!in-person"));
    assert_eq!(state.rows[0].days_offset, 1);
    assert!(state.closed);
}

#[tokio::test]
async fn test_empty_feed_aborts_before_truncate() {
    let server = feed_server(json!([])).await;
    let loader = RecordingLoader::new().with_rows(3);

    let err = job(&server, no_snapshot())
        .run(loader.boxed(), now())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::EmptyFeed));

    let state = loader.state();
    assert_eq!(state.truncate_calls, 0);
    assert_eq!(state.rows.len(), 3);
    assert!(state.closed);
}

#[tokio::test]
async fn test_fetch_failure_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let loader = RecordingLoader::new();

    let err = job(&server, no_snapshot())
        .run(loader.boxed(), now())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::HttpStatus { status: 500, .. }));
    assert_eq!(loader.state().truncate_calls, 0);
    assert!(loader.state().closed);
}

#[tokio::test]
async fn test_missing_table_is_created_before_fetch() {
    let server = feed_server(json!([election("a", "2024-03-05")])).await;
    let loader = RecordingLoader::new();
    loader.state().table_exists = false;

    job(&server, no_snapshot())
        .run(loader.boxed(), now())
        .await
        .unwrap();

    assert!(loader.state().schema_created);
}

#[tokio::test]
async fn test_window_drops_past_and_undated_records() {
    let mut undated = election("c", "2024-03-10");
    undated
        .as_object_mut()
        .unwrap()
        .remove("election_range_start_date");

    let server = feed_server(json!([
        election("a", "2024-02-29"),
        election("b", "2024-03-01"),
        undated,
        election("d", "2024-12-01"),
    ]))
    .await;
    let loader = RecordingLoader::new();

    let stats = job(&server, no_snapshot())
        .run(loader.boxed(), now())
        .await
        .unwrap();

    assert_eq!(stats.total, 4);
    assert_eq!(stats.selected, 2);
    assert_eq!(stats.dropped, 2);
    let ids: Vec<String> = loader
        .state()
        .rows
        .iter()
        .map(|r| r.election_id.clone())
        .collect();
    assert_eq!(ids, vec!["b".to_string(), "d".to_string()]);
}

#[tokio::test]
async fn test_trailing_window_uses_date_updated() {
    let mut stale = election("old", "2024-03-10");
    stale["date_updated"] = json!("2024-02-20T08:00:00.000000Z");

    let server = feed_server(json!([election("fresh", "2023-01-01"), stale])).await;
    let loader = RecordingLoader::new();

    let stats = job(&server, no_snapshot().with_trailing_window(7))
        .run(loader.boxed(), now())
        .await
        .unwrap();

    assert_eq!(stats.selected, 1);
    assert_eq!(loader.state().rows[0].election_id, "fresh");
}

#[tokio::test]
async fn test_insert_failure_aborts_and_rolls_back() {
    let server = feed_server(json!([
        election("a", "2024-03-05"),
        election("b", "2024-03-06"),
        election("c", "2024-03-07"),
    ]))
    .await;
    let loader = RecordingLoader::new();
    loader.state().fail_insert_for = Some("b".to_string());

    let stats = job(&server, no_snapshot())
        .run(loader.boxed(), now())
        .await
        .unwrap();

    assert_eq!(stats.inserted, 1);
    assert!(!stats.committed);
    assert!(!stats.is_complete());
    assert!(stats.failure.unwrap().contains("would be truncated"));

    let state = loader.state();
    assert!(state.rows.is_empty());
    assert!(state.pending.is_empty());
    assert_eq!(state.commits, 0);
    assert!(state.rollbacks >= 1);
    assert!(state.closed);
}

#[tokio::test]
async fn test_transform_failure_aborts_by_default() {
    let mut broken = election("b", "2024-03-06");
    broken.as_object_mut().unwrap().remove("district");

    let server = feed_server(json!([election("a", "2024-03-05"), broken])).await;
    let loader = RecordingLoader::new();

    let stats = job(&server, no_snapshot())
        .run(loader.boxed(), now())
        .await
        .unwrap();

    assert_eq!(stats.inserted, 1);
    assert_eq!(
        stats.failure.as_deref(),
        Some("Record is missing required field 'district'")
    );
    assert!(loader.state().rows.is_empty());
}

#[tokio::test]
async fn test_without_fail_fast_records_are_skipped() {
    let mut broken = election("b", "2024-03-06");
    broken["election_declared_start_date"] = json!("06/03/2024");

    let server = feed_server(json!([
        election("a", "2024-03-05"),
        broken,
        election("c", "2024-03-07"),
    ]))
    .await;
    let loader = RecordingLoader::new();

    let stats = job(&server, no_snapshot().with_fail_fast(false))
        .run(loader.boxed(), now())
        .await
        .unwrap();

    assert_eq!(stats.inserted, 2);
    assert_eq!(stats.skipped, 1);
    assert!(stats.committed);
    assert!(stats.failure.is_none());
    assert_eq!(loader.state().rows.len(), 2);
}

#[tokio::test]
async fn test_truncate_failure_is_not_fatal() {
    let server = feed_server(json!([election("a", "2024-03-05")])).await;
    let loader = RecordingLoader::new();
    loader.state().fail_truncate = true;

    let stats = job(&server, no_snapshot())
        .run(loader.boxed(), now())
        .await
        .unwrap();

    assert_eq!(stats.purged, None);
    assert_eq!(stats.inserted, 1);
    assert!(stats.committed);
}

#[tokio::test]
async fn test_commit_failure_rolls_back_without_snapshot() {
    let dir = TempDir::new().unwrap();
    let server = feed_server(json!([
        election("a", "2024-03-05"),
        election("b", "2024-03-06"),
    ]))
    .await;
    let loader = RecordingLoader::new().with_rows(2);
    loader.state().fail_commit = true;

    let stats = job(&server, SyncConfig::new().with_snapshot_dir(dir.path()))
        .run(loader.boxed(), now())
        .await
        .unwrap();

    assert_eq!(stats.inserted, 2);
    assert!(!stats.committed);
    assert!(!stats.is_complete());
    assert_eq!(stats.failure.as_deref(), Some("Database error: Transaction log is full"));
    assert!(stats.snapshot.is_none());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

    let state = loader.state();
    assert!(state.rollbacks >= 1);
    assert!(state.pending.is_empty());
    assert!(state.rows.is_empty());
    assert!(state.closed);
}

#[tokio::test]
async fn test_snapshot_contains_loaded_records() {
    let dir = TempDir::new().unwrap();
    let server = feed_server(json!([
        election("a", "2024-02-01"),
        election("b", "2024-03-05"),
    ]))
    .await;
    let loader = RecordingLoader::new();

    let stats = job(&server, SyncConfig::new().with_snapshot_dir(dir.path()))
        .run(loader.boxed(), now())
        .await
        .unwrap();

    let path = stats.snapshot.unwrap();
    assert_eq!(
        path.file_name().unwrap().to_str().unwrap(),
        "election_guide_2024-03-01_10-30-00.json"
    );
    let written: Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(written, json!([election("b", "2024-03-05")]));
}

#[tokio::test]
async fn test_range_start_lookback_applies_to_rows() {
    let server = feed_server(json!([election("a", "2024-03-05")])).await;
    let loader = RecordingLoader::new();

    job(&server, no_snapshot().with_range_start_lookback(10))
        .run(loader.boxed(), now())
        .await
        .unwrap();

    let state = loader.state();
    assert_eq!(state.rows[0].range_start_date.as_deref(), Some("2024-02-24"));
    assert_eq!(state.rows[0].declared_start_date.as_deref(), Some("2024-03-05"));
}

// ============================================================================
// RecordFilter Tests
// ============================================================================

#[test_case("2024-02-29", false ; "yesterday excluded")]
#[test_case("2024-03-01", true ; "today included")]
#[test_case("2024-03-02", true ; "tomorrow included")]
#[test_case("2024-03-01T00:00:00Z", true ; "timestamp today")]
#[test_case("", false ; "empty excluded")]
#[test_case("soon", false ; "unparseable excluded")]
fn test_from_today_window(range_start: &str, expected: bool) {
    let filter = RecordFilter::new(DateWindow::FromToday, 7, now());
    let record = raw(json!({"election_id": 1, "election_range_start_date": range_start}));
    assert_eq!(filter.accepts(&record), expected);
}

#[test]
fn test_from_today_window_absent_or_null() {
    let filter = RecordFilter::new(DateWindow::FromToday, 7, now());
    assert!(!filter.accepts(&raw(json!({"election_id": 1}))));
    assert!(!filter.accepts(&raw(
        json!({"election_id": 1, "election_range_start_date": null})
    )));
}

#[test_case("2024-02-23T10:30:00.000000Z", true ; "exactly seven days")]
#[test_case("2024-02-23T10:29:59.000000Z", false ; "just outside")]
#[test_case("2024-03-01T09:00:00.000000Z", true ; "today")]
fn test_trailing_days_window(date_updated: &str, expected: bool) {
    let filter = RecordFilter::new(DateWindow::TrailingDays, 7, now());
    let record = raw(json!({"election_id": 1, "date_updated": date_updated}));
    assert_eq!(filter.accepts(&record), expected);
}

#[test]
fn test_filter_cutoff_and_description() {
    let today = RecordFilter::new(DateWindow::FromToday, 7, now());
    assert_eq!(today.cutoff().to_string(), "2024-03-01 00:00:00");
    assert_eq!(today.describe(), "starting from 2024-03-01");

    let trailing = RecordFilter::new(DateWindow::TrailingDays, 7, now());
    assert_eq!(trailing.cutoff().to_string(), "2024-02-23 10:30:00");
    assert_eq!(trailing.describe(), "updated since 2024-02-23 10:30:00");
}

#[test]
fn test_select_keeps_order() {
    let filter = RecordFilter::new(DateWindow::FromToday, 7, now());
    let records = vec![
        raw(election("z", "2024-05-01")),
        raw(election("y", "2020-01-01")),
        raw(election("x", "2024-03-01")),
    ];

    let (selected, dropped) = filter.select(&records);
    let ids: Vec<String> = selected.iter().filter_map(RawElectionRecord::election_id).collect();
    assert_eq!(ids, vec!["z".to_string(), "x".to_string()]);
    assert_eq!(dropped, 1);
}

// ============================================================================
// SyncConfig Tests
// ============================================================================

#[test]
fn test_sync_config_default() {
    let config = SyncConfig::default();
    assert_eq!(config.window, DateWindow::FromToday);
    assert_eq!(config.trailing_days, 7);
    assert!(config.fail_fast);
    assert_eq!(config.range_start_lookback_days, 0);
    assert_eq!(config.snapshot_dir, Some("snapshots".into()));
    assert!(config.without_snapshot().snapshot_dir.is_none());
}

#[test]
fn test_sync_config_from_options() {
    let options = SyncOptions {
        window: DateWindow::TrailingDays,
        trailing_days: 14,
        fail_fast: false,
        range_start_lookback_days: 180,
        snapshot_dir: Some("/tmp/snapshots".into()),
        ..Default::default()
    };

    let config = SyncConfig::from(&options);
    assert_eq!(config.window, DateWindow::TrailingDays);
    assert_eq!(config.trailing_days, 14);
    assert!(!config.fail_fast);
    assert_eq!(config.range_start_lookback_days, 180);
    assert_eq!(config.snapshot_dir, Some("/tmp/snapshots".into()));
}
