//! Record transformation module
//!
//! Turns raw feed records into rows shaped like the `ElectionGuide` table.
//!
//! # Overview
//!
//! The transform module provides:
//! - `RawElectionRecord` - read-only view over one feed object
//! - `NormalizedElectionRow` - flat row, one field per destination column
//! - `RecordTransformer` - voting-method flattening, date defaulting and
//!   the days-until-election offset
//!
//! Transformation is pure: the clock is passed in, nothing touches I/O.

mod dates;
mod normalize;
mod types;

pub use dates::{format_date, parse_date, parse_feed_datetime};
pub use normalize::{normalize, RecordTransformer, NAME_ENCODING, VOTING_METHOD_SEPARATOR};
pub use types::{NormalizedElectionRow, RawElectionRecord};
pub(crate) use types::json_type_name;
