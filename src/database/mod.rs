//! Destination table loaders
//!
//! # Overview
//!
//! - [`TableLoader`]: the operations the sync job runs against a table
//! - [`MssqlLoader`]: SQL Server via `tiberius`
//! - [`MysqlLoader`]: MySQL via `sqlx`
//! - [`SqlBuilder`]: per-dialect statement text
//! - [`COLUMNS`]: the shared column table that fixes bind order
//!
//! Loaders run inserts inside one explicit transaction that is opened by
//! the first insert and ended by [`TableLoader::commit`] or
//! [`TableLoader::rollback`]. Schema creation and truncation run outside it
//! and are durable as soon as they return.

mod columns;
mod mssql;
mod mysql;
mod sql;

pub use columns::{row_values, ColumnDef, ColumnKind, SqlValue, COLUMNS, COLUMN_COUNT, ID_COLUMN};
pub use mssql::MssqlLoader;
pub use mysql::MysqlLoader;
pub use sql::SqlBuilder;

use crate::config::DatabaseSettings;
use crate::error::Result;
use crate::transform::NormalizedElectionRow;
use crate::types::DbType;
use async_trait::async_trait;
use tracing::{debug, info};

/// A connection bound to one destination table
#[async_trait]
pub trait TableLoader: Send {
    /// Statement builder for this loader's dialect and table
    fn sql(&self) -> &SqlBuilder;

    fn db_type(&self) -> DbType {
        self.sql().db_type()
    }

    /// Run a statement without parameters, returning rows affected
    async fn execute(&mut self, sql: &str) -> Result<u64>;

    /// Run a query whose first row's first column is a BIGINT
    async fn query_count(&mut self, sql: &str) -> Result<i64>;

    /// Insert one row inside the open transaction, opening it if needed
    async fn insert_row(&mut self, row: &NormalizedElectionRow) -> Result<()>;

    /// Commit the open transaction; no-op when none is open
    async fn commit(&mut self) -> Result<()>;

    /// Roll back the open transaction; no-op when none is open
    async fn rollback(&mut self) -> Result<()>;

    /// Release the connection
    async fn close(self: Box<Self>) -> Result<()>;

    /// Round-trip a trivial query
    async fn check(&mut self) -> Result<()> {
        let sql = self.sql().check_sql();
        self.query_count(sql).await.map(|_| ())
    }

    async fn table_exists(&mut self) -> Result<bool> {
        let sql = self.sql().table_exists_sql();
        Ok(self.query_count(&sql).await? > 0)
    }

    async fn row_count(&mut self) -> Result<u64> {
        let sql = self.sql().count_sql();
        let count = self.query_count(&sql).await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// Create the table when missing; returns whether it was created
    async fn ensure_schema(&mut self) -> Result<bool> {
        if self.table_exists().await? {
            debug!(table = %self.sql().qualified_table(), "Table already exists");
            return Ok(false);
        }

        let sql = self.sql().create_table_sql();
        self.execute(&sql).await?;
        self.commit().await?;
        info!("Created table {}", self.sql().qualified_table());
        Ok(true)
    }

    /// Remove every row; returns the count before minus the count after
    async fn truncate(&mut self) -> Result<u64> {
        let before = self.row_count().await?;
        let sql = self.sql().truncate_sql();
        self.execute(&sql).await?;
        self.commit().await?;
        let after = self.row_count().await?;
        Ok(before.saturating_sub(after))
    }
}

/// Open a loader for `table` on the configured engine
pub async fn connect(settings: &DatabaseSettings, table: &str) -> Result<Box<dyn TableLoader>> {
    debug!(connection = %settings.connection_info(), table, "Connecting to database");

    let loader: Box<dyn TableLoader> = match settings.db_type {
        DbType::Mssql => Box::new(MssqlLoader::connect(settings, table).await?),
        DbType::Mysql => Box::new(MysqlLoader::connect(settings, table).await?),
    };

    info!("Connected to {} database", settings.db_type.display_name());
    Ok(loader)
}
