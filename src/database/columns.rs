//! The `ElectionGuide` column table
//!
//! Inserts bind by position, so this list is the single source of column
//! order for the DDL, the INSERT statement and the bound values.

use crate::transform::NormalizedElectionRow;

/// Storage class of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Wide text
    Text,
    /// Offset-aware timestamp, converted from feed text at insert time
    DateTime,
}

/// One destination column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub kind: ColumnKind,
}

const fn text(name: &'static str) -> ColumnDef {
    ColumnDef {
        name,
        kind: ColumnKind::Text,
    }
}

const fn datetime(name: &'static str) -> ColumnDef {
    ColumnDef {
        name,
        kind: ColumnKind::DateTime,
    }
}

/// Identity column, generated by the database
pub const ID_COLUMN: &str = "ID";

/// Number of bound columns
pub const COLUMN_COUNT: usize = 38;

/// Bound columns in insert order
pub const COLUMNS: [ColumnDef; COLUMN_COUNT] = [
    text("ExternalID"),
    text("Encode"),
    text("Title"),
    text("PubDate"),
    text("ElectIssues"),
    text("Snap"),
    text("OrigElectYear"),
    datetime("StartTime"),
    datetime("EndTime"),
    text("CovidDelay"),
    text("CovidEffects"),
    datetime("ElectStartDate"),
    datetime("ElectEndDate"),
    datetime("ElectBlackoutStartDate"),
    datetime("ElectBlackoutEndDate"),
    text("Category"),
    text("SubCategory"),
    text("ElecSys"),
    text("ElectCommName"),
    text("Url"),
    text("Source"),
    text("DistrictID"),
    text("Country"),
    text("CountryCode"),
    text("DistrictType"),
    text("GovFun"),
    text("GovFunUpdate"),
    text("RegDeadline"),
    text("VotingAge"),
    text("EligibleVoters"),
    text("FirstTimeVoters"),
    text("VotingType"),
    text("VotingPrimary"),
    datetime("VotingStartDate"),
    datetime("VotingEndDate"),
    text("Excuse"),
    text("Description"),
    text("DaysOffset"),
];

/// A value ready to bind, tagged with how the dialect should treat it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    Text(Option<String>),
    /// Feed date text; each dialect converts it to its timestamp type
    DateTime(Option<String>),
}

impl SqlValue {
    pub fn kind(&self) -> ColumnKind {
        match self {
            SqlValue::Text(_) => ColumnKind::Text,
            SqlValue::DateTime(_) => ColumnKind::DateTime,
        }
    }
}

/// Row values in [`COLUMNS`] order
pub fn row_values(row: &NormalizedElectionRow) -> [SqlValue; COLUMN_COUNT] {
    let t = |v: &Option<String>| SqlValue::Text(v.clone());
    let d = |v: &Option<String>| SqlValue::DateTime(v.clone());

    [
        SqlValue::Text(Some(row.election_id.clone())),
        SqlValue::Text(Some(row.name_encoding.clone())),
        SqlValue::Text(Some(row.election_name.clone())),
        t(&row.date_updated),
        t(&row.election_issues),
        t(&row.is_snap_election),
        t(&row.original_election_year),
        d(&row.range_start_date),
        d(&row.range_end_date),
        t(&row.is_delayed_covid19),
        t(&row.covid_effects),
        d(&row.declared_start_date),
        d(&row.declared_end_date),
        d(&row.blackout_start_date),
        d(&row.blackout_end_date),
        t(&row.election_type),
        t(&row.election_scope),
        t(&row.electoral_system),
        t(&row.election_commission_name),
        t(&row.commission_website),
        t(&row.source),
        t(&row.district_ocd_id),
        t(&row.district_name),
        t(&row.district_country),
        t(&row.district_type),
        t(&row.government_functions),
        t(&row.government_functions_updated),
        t(&row.voter_registration_day),
        t(&row.voting_age_minimum),
        t(&row.eligible_voters),
        t(&row.first_time_voters),
        t(&row.voting_type),
        t(&row.voting_primary),
        d(&row.voting_start_date),
        d(&row.voting_end_date),
        t(&row.voting_excuse_required),
        t(&row.voting_instructions),
        SqlValue::Text(Some(row.days_offset.to_string())),
    ]
}
