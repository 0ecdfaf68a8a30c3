//! Job configuration
//!
//! Settings are layered: built-in defaults, then an optional YAML file, then
//! environment variables (`API_ENDPOINT`, `API_TOKEN`, `DB_USERNAME`,
//! `DB_PASSWORD`, `DB_HOST`, `DB_PORT`, `DB_DATABASE`, `DB_TYPE`, `LOG_PATH`).
//! The resolved values are handed to the sync job explicitly.

use crate::error::{Error, Result};
use crate::types::{DateWindow, DbType};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

/// File looked up in the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Destination table name
pub const DEFAULT_TABLE: &str = "ElectionGuide";

/// Directory for per-run snapshots unless the config sets `snapshot_dir: null`
pub const DEFAULT_SNAPSHOT_DIR: &str = "snapshots";

// ============================================================================
// Top-Level Settings
// ============================================================================

/// Complete job configuration as loaded from YAML and the environment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Feed and logging settings
    #[serde(default)]
    pub general: GeneralConfig,

    /// Destination database settings
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Sync behaviour
    #[serde(default)]
    pub sync: SyncOptions,
}

/// Feed endpoint, credentials and log location
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Feed URL
    #[serde(default)]
    pub api_endpoint: Option<String>,

    /// Feed token, sent as `Authorization: Token <token>`
    #[serde(default)]
    pub api_token: Option<String>,

    /// Log file prefix; the run timestamp and `.log` are appended
    #[serde(default)]
    pub log_path: Option<PathBuf>,
}

impl fmt::Debug for GeneralConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneralConfig")
            .field("api_endpoint", &self.api_endpoint)
            .field("api_token", &self.api_token.as_ref().map(|_| "****"))
            .field("log_path", &self.log_path)
            .finish()
    }
}

/// Raw database settings (validated by [`Settings::database_settings`])
#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    #[serde(default)]
    pub host: Option<String>,

    /// Port (engine default when unset)
    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default)]
    pub database: Option<String>,

    /// `mssql` or `mysql`
    #[serde(default)]
    pub db_type: Option<String>,

    /// Accept the server certificate without validation (SQL Server)
    #[serde(default = "default_true")]
    pub trust_cert: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            host: None,
            port: None,
            database: None,
            db_type: None,
            trust_cert: true,
        }
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "****"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("db_type", &self.db_type)
            .field("trust_cert", &self.trust_cert)
            .finish()
    }
}

/// Sync behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncOptions {
    /// Destination table
    #[serde(default = "default_table")]
    pub table: String,

    /// Record selection policy
    #[serde(default)]
    pub window: DateWindow,

    /// Window length for [`DateWindow::TrailingDays`]
    #[serde(default = "default_trailing_days")]
    pub trailing_days: u32,

    /// Directory for the per-run JSON snapshot (`null` disables it)
    #[serde(default = "default_snapshot_dir")]
    pub snapshot_dir: Option<PathBuf>,

    /// Abort the load on the first failing record
    #[serde(default = "default_true")]
    pub fail_fast: bool,

    /// Shift the stored range start this many days earlier (0 = off)
    #[serde(default)]
    pub range_start_lookback_days: u32,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            table: default_table(),
            window: DateWindow::default(),
            trailing_days: default_trailing_days(),
            snapshot_dir: default_snapshot_dir(),
            fail_fast: true,
            range_start_lookback_days: 0,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_table() -> String {
    DEFAULT_TABLE.to_string()
}

fn default_trailing_days() -> u32 {
    7
}

fn default_snapshot_dir() -> Option<PathBuf> {
    Some(PathBuf::from(DEFAULT_SNAPSHOT_DIR))
}

// ============================================================================
// Resolved Settings
// ============================================================================

/// Validated feed settings
#[derive(Clone)]
pub struct FeedSettings {
    pub endpoint: Url,
    pub token: String,
}

impl fmt::Debug for FeedSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeedSettings")
            .field("endpoint", &self.endpoint.as_str())
            .field("token", &"****")
            .finish()
    }
}

/// Validated database settings
#[derive(Clone)]
pub struct DatabaseSettings {
    pub db_type: DbType,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
    pub trust_cert: bool,
}

impl DatabaseSettings {
    /// Connection target for logging (password masked)
    pub fn connection_info(&self) -> String {
        format!(
            "{}://{}:****@{}:{}/{}",
            self.db_type, self.username, self.host, self.port, self.database
        )
    }
}

impl fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.connection_info())
    }
}

// ============================================================================
// Loading
// ============================================================================

impl Settings {
    /// Load settings from an optional YAML file and the process environment
    ///
    /// With no explicit path, [`DEFAULT_CONFIG_FILE`] is read when it exists.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        settings.apply_env(|key| std::env::var(key).ok());
        Ok(settings)
    }

    /// Parse a YAML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_yaml(&content)
    }

    /// Parse YAML config text
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Override values from environment-style variables
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let set = |target: &mut Option<String>, key: &str| {
            if let Some(value) = lookup(key) {
                *target = Some(value);
            }
        };

        set(&mut self.general.api_endpoint, "API_ENDPOINT");
        set(&mut self.general.api_token, "API_TOKEN");
        set(&mut self.database.username, "DB_USERNAME");
        set(&mut self.database.password, "DB_PASSWORD");
        set(&mut self.database.host, "DB_HOST");
        set(&mut self.database.database, "DB_DATABASE");
        set(&mut self.database.db_type, "DB_TYPE");

        if let Some(path) = lookup("LOG_PATH") {
            self.general.log_path = Some(PathBuf::from(path));
        }
        if let Some(port) = lookup("DB_PORT").and_then(|p| p.trim().parse().ok()) {
            self.database.port = Some(port);
        }
    }

    /// Validate everything the run needs before any I/O happens
    pub fn validate(&self) -> Result<()> {
        self.database_settings()?;
        self.feed_settings()?;
        validate_table_name(&self.sync.table)?;
        Ok(())
    }

    /// Resolve the destination database type
    pub fn db_type(&self) -> Result<DbType> {
        match non_empty(self.database.db_type.as_ref()) {
            Some(value) => value.parse(),
            None => Ok(DbType::default()),
        }
    }

    /// Resolve and check database credentials
    pub fn database_settings(&self) -> Result<DatabaseSettings> {
        let db_type = self.db_type()?;
        let db = &self.database;

        let mut missing = Vec::new();
        if non_empty(db.username.as_ref()).is_none() {
            missing.push("username".to_string());
        }
        if non_empty(db.password.as_ref()).is_none() {
            missing.push("password".to_string());
        }
        if non_empty(db.host.as_ref()).is_none() {
            missing.push("host".to_string());
        }
        if non_empty(db.database.as_ref()).is_none() {
            missing.push("database".to_string());
        }
        if !missing.is_empty() {
            return Err(Error::MissingCredentials { missing });
        }

        Ok(DatabaseSettings {
            db_type,
            host: db.host.clone().unwrap_or_default(),
            port: db.port.unwrap_or_else(|| db_type.default_port()),
            username: db.username.clone().unwrap_or_default(),
            password: db.password.clone().unwrap_or_default(),
            database: db.database.clone().unwrap_or_default(),
            trust_cert: db.trust_cert,
        })
    }

    /// Resolve the feed endpoint and token
    pub fn feed_settings(&self) -> Result<FeedSettings> {
        let endpoint = non_empty(self.general.api_endpoint.as_ref())
            .ok_or_else(|| Error::config("API_ENDPOINT is not set"))?;
        let token = non_empty(self.general.api_token.as_ref())
            .ok_or_else(|| Error::config("API_TOKEN is not set"))?;

        Ok(FeedSettings {
            endpoint: Url::parse(endpoint)?,
            token: token.to_string(),
        })
    }
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

/// Table names are interpolated into SQL, so only plain identifiers pass
fn validate_table_name(table: &str) -> Result<()> {
    let valid = !table.is_empty()
        && table.split('.').count() <= 2
        && table.split('.').all(|part| {
            !part.is_empty()
                && part
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_')
        });
    if valid {
        Ok(())
    } else {
        Err(Error::config(format!("Invalid table name '{table}'")))
    }
}
