//! Raw record → table row
//!
//! Required keys are checked explicitly and reported as
//! [`Error::MissingField`]; every other key is optional.

use super::dates::{format_date, parse_date};
use super::types::{render_scalar, NormalizedElectionRow, RawElectionRecord};
use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};
use chrono::{Duration, NaiveDateTime};

/// Separator between per-method components in flattened voting fields
pub const VOTING_METHOD_SEPARATOR: &str = "!!";

/// Language key read from `election_name`, stored in the `Encode` column
pub const NAME_ENCODING: &str = "en_US";

const SECONDS_PER_DAY: i64 = 86_400;

/// Normalizes raw feed records against a fixed clock
#[derive(Debug, Clone, Copy)]
pub struct RecordTransformer {
    now: NaiveDateTime,
    range_start_lookback_days: u32,
}

impl RecordTransformer {
    /// Create a transformer that treats `now` as the current local time
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now,
            range_start_lookback_days: 0,
        }
    }

    /// Shift the stored range start this many days earlier (0 disables)
    #[must_use]
    pub fn with_range_start_lookback(mut self, days: u32) -> Self {
        self.range_start_lookback_days = days;
        self
    }

    /// Clock used for `days_offset`
    pub fn now(&self) -> NaiveDateTime {
        self.now
    }

    /// Convert one raw record into a row
    pub fn normalize(&self, raw: &RawElectionRecord) -> Result<NormalizedElectionRow> {
        let election_id = raw
            .election_id()
            .ok_or_else(|| Error::missing_field("election_id"))?;
        let election_name = raw
            .election_name()
            .ok_or_else(|| Error::missing_field("election_name.en_US"))?
            .to_string();
        let district = raw
            .get_object("district")
            .ok_or_else(|| Error::missing_field("district"))?;
        let government_functions = raw
            .get_object("government_functions")
            .ok_or_else(|| Error::missing_field("government_functions"))?;

        let methods = raw.voting_methods();
        let voting_start_date = join_method_attr(methods, "start");

        let mut row = NormalizedElectionRow {
            election_id,
            name_encoding: NAME_ENCODING.to_string(),
            election_name,
            date_updated: text_or_blank(raw, "date_updated"),
            election_issues: text_or_blank(raw, "election_issues"),
            is_snap_election: text_or_blank(raw, "is_snap_election"),
            original_election_year: text_or_blank(raw, "original_election_year"),
            range_start_date: text_or_blank(raw, "election_range_start_date"),
            range_end_date: text_or_blank(raw, "election_range_end_date"),
            is_delayed_covid19: text_or_blank(raw, "is_delayed_covid19"),
            covid_effects: text_or_blank(raw, "covid_effects"),
            declared_start_date: text_or_blank(raw, "election_declared_start_date"),
            declared_end_date: text_or_blank(raw, "election_declared_end_date"),
            blackout_start_date: text_or_blank(raw, "election_blackout_start_date"),
            blackout_end_date: text_or_blank(raw, "election_blackout_end_date"),
            election_type: text_or_blank(raw, "election_type"),
            election_scope: text_or_blank(raw, "election_scope"),
            electoral_system: text_or_blank(raw, "electoral_system"),
            election_commission_name: text_or_blank(raw, "election_commission_name"),
            commission_website: text_or_blank(raw, "administering_election_commission_website"),
            source: text_or_blank(raw, "source"),
            district_ocd_id: nested_text(district, "district_ocd_id"),
            district_name: nested_text(district, "district_name"),
            district_country: nested_text(district, "district_country"),
            district_type: nested_text(district, "district_type"),
            government_functions: nested_text(government_functions, "details")
                .filter(|s| !s.is_empty()),
            government_functions_updated: match government_functions.get("updated") {
                None => Some(String::new()),
                Some(value) => render_scalar(value),
            },
            voter_registration_day: text_or_blank(raw, "voter_registration_day"),
            voting_age_minimum: text_or_blank(raw, "voting_age_minimum_inclusive"),
            eligible_voters: raw.get("eligible_voters").and_then(render_scalar),
            first_time_voters: raw.get("first_time_voters").and_then(render_scalar),
            voting_type: join_method_attr(methods, "type"),
            voting_primary: join_method_attr(methods, "primary"),
            voting_start_date,
            voting_end_date: join_method_attr(methods, "end"),
            voting_excuse_required: join_method_attr(methods, "excuse-required")
                .filter(|s| !s.is_empty()),
            voting_instructions: join_method_attr(methods, "instructions"),
            days_offset: 1,
        };

        apply_date_defaults(&mut row, first_method_start(methods), !methods.is_empty());
        row.days_offset = self.days_offset(row.declared_start_date.as_deref())?;

        if self.range_start_lookback_days > 0 {
            if let Some(start) = row.range_start_date.as_deref().filter(|s| !s.is_empty()) {
                let date = parse_date(start)
                    .ok_or_else(|| Error::date_parse("election_range_start_date", start))?;
                let shifted = date - Duration::days(i64::from(self.range_start_lookback_days));
                row.range_start_date = Some(format_date(shifted));
            }
        }

        Ok(row)
    }

    /// Whole days from now until the declared start date, plus one, at least 1
    fn days_offset(&self, declared_start: Option<&str>) -> Result<i64> {
        let value = declared_start.unwrap_or_default();
        let date = parse_date(value)
            .ok_or_else(|| Error::date_parse("election_declared_start_date", value))?;

        let start = date.and_hms_opt(0, 0, 0).unwrap_or_default();
        let delta = start - self.now + Duration::days(1);
        let days = delta.num_seconds().div_euclid(SECONDS_PER_DAY);

        Ok(days.max(1))
    }
}

/// Convenience wrapper for a one-off normalization at `now`
pub fn normalize(raw: &RawElectionRecord, now: NaiveDateTime) -> Result<NormalizedElectionRow> {
    RecordTransformer::new(now).normalize(raw)
}

/// Fill the three start-date fields from each other
///
/// Branches are exclusive: only the first whose field is blank runs, so a
/// record can still leave the range start or voting start empty. The voting
/// start is only filled for records that list voting methods; without any,
/// every flattened voting field stays NULL.
fn apply_date_defaults(
    row: &mut NormalizedElectionRow,
    first_method_start: Option<String>,
    has_methods: bool,
) {
    if is_blank(row.declared_start_date.as_deref()) {
        if is_blank(row.range_start_date.as_deref()) {
            row.range_start_date.clone_from(&first_method_start);
            row.declared_start_date = first_method_start;
        } else {
            row.declared_start_date.clone_from(&row.range_start_date);
        }
    } else if is_blank(row.range_start_date.as_deref()) {
        row.range_start_date.clone_from(&row.declared_start_date);
    } else if has_methods && is_blank(row.voting_start_date.as_deref()) {
        row.voting_start_date.clone_from(&row.declared_start_date);
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

/// Absent key → `''`, `null` → NULL, anything else rendered as text
fn text_or_blank(raw: &RawElectionRecord, key: &str) -> Option<String> {
    match raw.get(key) {
        None => Some(String::new()),
        Some(value) => render_scalar(value),
    }
}

fn nested_text(object: &JsonObject, key: &str) -> Option<String> {
    object.get(key).and_then(render_scalar)
}

/// One component per method, joined with [`VOTING_METHOD_SEPARATOR`]
fn join_method_attr(methods: &[JsonValue], attr: &str) -> Option<String> {
    if methods.is_empty() {
        return None;
    }
    let parts: Vec<String> = methods
        .iter()
        .map(|method| {
            method
                .get(attr)
                .and_then(render_scalar)
                .unwrap_or_default()
        })
        .collect();
    Some(parts.join(VOTING_METHOD_SEPARATOR))
}

fn first_method_start(methods: &[JsonValue]) -> Option<String> {
    methods
        .first()
        .and_then(|m| m.get("start"))
        .and_then(render_scalar)
        .filter(|s| !s.trim().is_empty())
}
