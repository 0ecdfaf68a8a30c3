//! Output module
//!
//! Side artifacts of a run.
//!
//! # Overview
//!
//! - [`SnapshotWriter`]: atomically writes the raw records a run loaded to a
//!   timestamped JSON file

mod snapshot;

pub use snapshot::{SnapshotWriter, FILE_TIMESTAMP_FORMAT, SNAPSHOT_PREFIX};
