//! Error types for election-guide-sync
//!
//! This module defines the error hierarchy for the whole job.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for the sync job
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Please make sure the following database credentials are provided: {}", missing.join(", "))]
    MissingCredentials { missing: Vec<String> },

    #[error("Unsupported DB_TYPE '{value}' (expected mssql or mysql)")]
    UnsupportedDbType { value: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Connection Errors
    // ============================================================================
    #[error("Error connecting to {engine}: {message}")]
    Connection { engine: String, message: String },

    // ============================================================================
    // Feed Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unable to fetch data from the API. Status code: {status}")]
    HttpStatus { status: u16, body: String },

    #[error("Failed to decode feed payload: {message}")]
    Decode { message: String },

    #[error("API returned an empty payload")]
    EmptyFeed,

    // ============================================================================
    // Transform Errors
    // ============================================================================
    #[error("Record is missing required field '{field}'")]
    MissingField { field: String },

    #[error("Invalid date '{value}' in '{field}' (expected YYYY-MM-DD)")]
    DateParse { field: String, value: String },

    // ============================================================================
    // Load Errors
    // ============================================================================
    #[error("Database error: {message}")]
    Database { message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a connection error for the given engine
    pub fn connection(engine: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Connection {
            engine: engine.into(),
            message: message.to_string(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Create a date parse error
    pub fn date_parse(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::DateParse {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create a database error
    pub fn database(message: impl std::fmt::Display) -> Self {
        Self::Database {
            message: message.to_string(),
        }
    }

    /// Whether this error belongs to the per-record transform class
    pub fn is_transform(&self) -> bool {
        matches!(self, Error::MissingField { .. } | Error::DateParse { .. })
    }
}

impl From<sqlx::Error> for Error {
    fn from(e: sqlx::Error) -> Self {
        Error::database(e)
    }
}

impl From<tiberius::error::Error> for Error {
    fn from(e: tiberius::error::Error) -> Self {
        Error::database(e)
    }
}

/// Process exit code for a run that ends with any returned error
pub const EXIT_FAILURE: i32 = 1;

/// Result type alias for the sync job
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
