//! Common types used throughout election-guide-sync
//!
//! This module contains shared type definitions and type aliases
//! used across multiple modules.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

// ============================================================================
// Database Type
// ============================================================================

/// Destination database engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DbType {
    /// Microsoft SQL Server
    #[default]
    Mssql,
    /// MySQL / MariaDB
    Mysql,
}

impl DbType {
    /// Value used in configuration (`DB_TYPE`)
    pub fn as_str(self) -> &'static str {
        match self {
            DbType::Mssql => "mssql",
            DbType::Mysql => "mysql",
        }
    }

    /// Human-readable engine name for log lines
    pub fn display_name(self) -> &'static str {
        match self {
            DbType::Mssql => "SQL Server",
            DbType::Mysql => "MySQL",
        }
    }

    /// Default TCP port for the engine
    pub fn default_port(self) -> u16 {
        match self {
            DbType::Mssql => 1433,
            DbType::Mysql => 3306,
        }
    }
}

impl fmt::Display for DbType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DbType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mssql" | "sqlserver" => Ok(DbType::Mssql),
            "mysql" | "mariadb" => Ok(DbType::Mysql),
            _ => Err(Error::UnsupportedDbType {
                value: s.to_string(),
            }),
        }
    }
}

// ============================================================================
// Date Window
// ============================================================================

/// Which feed records are selected for loading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateWindow {
    /// `election_range_start_date` on or after today
    #[default]
    FromToday,
    /// `date_updated` within the trailing number of days
    TrailingDays,
}
