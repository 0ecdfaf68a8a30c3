//! Record types
//!
//! `RawElectionRecord` wraps the feed object untouched so it can be written
//! back out verbatim in the run snapshot. `NormalizedElectionRow` is what the
//! loaders insert.

use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};
use serde::{Deserialize, Serialize};

/// One election object as delivered by the feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawElectionRecord(JsonObject);

impl RawElectionRecord {
    /// Wrap a JSON object
    pub fn new(object: JsonObject) -> Self {
        Self(object)
    }

    /// Wrap a JSON value, which must be an object
    pub fn from_value(value: JsonValue) -> Result<Self> {
        match value {
            JsonValue::Object(object) => Ok(Self(object)),
            other => Err(Error::decode(format!(
                "Expected election object, got {}",
                json_type_name(&other)
            ))),
        }
    }

    /// Raw value for a top-level key
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.0.get(key)
    }

    /// Whether the key is present (even if `null`)
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// String value for a top-level key, if it is a string
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(JsonValue::as_str)
    }

    /// Nested object for a top-level key
    pub fn get_object(&self, key: &str) -> Option<&JsonObject> {
        self.get(key).and_then(JsonValue::as_object)
    }

    /// `election_id` rendered as text, if present
    pub fn election_id(&self) -> Option<String> {
        self.get("election_id").and_then(render_scalar)
    }

    /// `election_name.en_US`, if present
    pub fn election_name(&self) -> Option<&str> {
        self.get_object("election_name")?
            .get("en_US")
            .and_then(JsonValue::as_str)
    }

    /// `election_range_start_date`, if present and non-empty
    pub fn range_start_date(&self) -> Option<&str> {
        self.get_str("election_range_start_date")
            .filter(|s| !s.trim().is_empty())
    }

    /// `date_updated`, if present and non-empty
    pub fn date_updated(&self) -> Option<&str> {
        self.get_str("date_updated").filter(|s| !s.trim().is_empty())
    }

    /// Entries of `voting_methods`; absent, `null` and non-array all mean none
    pub fn voting_methods(&self) -> &[JsonValue] {
        self.get("voting_methods")
            .and_then(JsonValue::as_array)
            .map_or(&[], Vec::as_slice)
    }

    /// Borrow the underlying object
    pub fn as_object(&self) -> &JsonObject {
        &self.0
    }

    /// Convert back into a JSON value
    pub fn into_value(self) -> JsonValue {
        JsonValue::Object(self.0)
    }
}

/// Render a scalar JSON value the way it is stored in text columns
///
/// `null` is `None`; booleans are stored as `True`/`False`; nested
/// arrays and objects are kept as compact JSON.
pub(crate) fn render_scalar(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Bool(true) => Some("True".to_string()),
        JsonValue::Bool(false) => Some("False".to_string()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Array(_) | JsonValue::Object(_) => Some(value.to_string()),
    }
}

pub(crate) fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

/// One row of the `ElectionGuide` table (everything except the identity `ID`)
///
/// Text fields are `None` for SQL NULL and `Some("")` for fields the feed
/// left out. Date fields keep the feed's text; each loader converts them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizedElectionRow {
    pub election_id: String,
    pub name_encoding: String,
    pub election_name: String,
    pub date_updated: Option<String>,
    pub election_issues: Option<String>,
    pub is_snap_election: Option<String>,
    pub original_election_year: Option<String>,
    pub range_start_date: Option<String>,
    pub range_end_date: Option<String>,
    pub is_delayed_covid19: Option<String>,
    pub covid_effects: Option<String>,
    pub declared_start_date: Option<String>,
    pub declared_end_date: Option<String>,
    pub blackout_start_date: Option<String>,
    pub blackout_end_date: Option<String>,
    pub election_type: Option<String>,
    pub election_scope: Option<String>,
    pub electoral_system: Option<String>,
    pub election_commission_name: Option<String>,
    pub commission_website: Option<String>,
    pub source: Option<String>,
    pub district_ocd_id: Option<String>,
    pub district_name: Option<String>,
    pub district_country: Option<String>,
    pub district_type: Option<String>,
    pub government_functions: Option<String>,
    pub government_functions_updated: Option<String>,
    pub voter_registration_day: Option<String>,
    pub voting_age_minimum: Option<String>,
    pub eligible_voters: Option<String>,
    pub first_time_voters: Option<String>,
    pub voting_type: Option<String>,
    pub voting_primary: Option<String>,
    pub voting_start_date: Option<String>,
    pub voting_end_date: Option<String>,
    pub voting_excuse_required: Option<String>,
    pub voting_instructions: Option<String>,
    /// Days until the declared start date, never below 1
    pub days_offset: i64,
}
