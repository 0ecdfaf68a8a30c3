//! Dialect-specific SQL text
//!
//! Table names are validated identifiers (see `config`), so they are
//! interpolated directly; row values are always bound.

use super::columns::{ColumnKind, COLUMNS, ID_COLUMN};
use crate::types::DbType;

/// Default schema for unqualified SQL Server tables
const MSSQL_DEFAULT_SCHEMA: &str = "dbo";

/// Builds every statement a loader runs for one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlBuilder {
    db_type: DbType,
    schema: Option<String>,
    table: String,
}

impl SqlBuilder {
    /// Create a builder for `table` (optionally `schema.table`)
    pub fn new(db_type: DbType, table: &str) -> Self {
        let (schema, table) = match table.split_once('.') {
            Some((schema, table)) => (Some(schema.to_string()), table.to_string()),
            None => (None, table.to_string()),
        };
        let schema = match db_type {
            DbType::Mssql => schema.or_else(|| Some(MSSQL_DEFAULT_SCHEMA.to_string())),
            DbType::Mysql => schema,
        };
        Self {
            db_type,
            schema,
            table,
        }
    }

    pub fn db_type(&self) -> DbType {
        self.db_type
    }

    /// Unqualified table name
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Table name as used in statements
    pub fn qualified_table(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{schema}.{}", self.table),
            None => self.table.clone(),
        }
    }

    /// Connectivity probe returning a single BIGINT
    pub fn check_sql(&self) -> &'static str {
        match self.db_type {
            DbType::Mssql => "SELECT CAST(1 AS BIGINT)",
            DbType::Mysql => "SELECT CAST(1 AS SIGNED)",
        }
    }

    /// Count of matching tables (0 or 1)
    pub fn table_exists_sql(&self) -> String {
        match self.db_type {
            DbType::Mssql => format!(
                "SELECT CAST(COUNT(*) AS BIGINT) FROM INFORMATION_SCHEMA.TABLES \
                 WHERE TABLE_SCHEMA = '{}' AND TABLE_NAME = '{}'",
                self.schema.as_deref().unwrap_or(MSSQL_DEFAULT_SCHEMA),
                self.table
            ),
            DbType::Mysql => {
                let schema = self
                    .schema
                    .as_ref()
                    .map_or_else(|| "DATABASE()".to_string(), |s| format!("'{s}'"));
                format!(
                    "SELECT COUNT(*) FROM information_schema.tables \
                     WHERE table_schema = {schema} AND table_name = '{}'",
                    self.table
                )
            }
        }
    }

    /// DDL for the destination table
    pub fn create_table_sql(&self) -> String {
        let (id, text, datetime, suffix) = match self.db_type {
            DbType::Mssql => (
                "INT IDENTITY(1,1) NOT NULL PRIMARY KEY",
                "NVARCHAR(MAX) NULL",
                "DATETIMEOFFSET NULL",
                "",
            ),
            DbType::Mysql => (
                "INT NOT NULL AUTO_INCREMENT PRIMARY KEY",
                "TEXT NULL",
                "DATETIME NULL",
                " ENGINE=InnoDB DEFAULT CHARSET=utf8mb4",
            ),
        };

        let mut lines = vec![format!("    {ID_COLUMN} {id}")];
        lines.extend(COLUMNS.iter().map(|column| {
            let ty = match column.kind {
                ColumnKind::Text => text,
                ColumnKind::DateTime => datetime,
            };
            format!("    {} {ty}", column.name)
        }));

        format!(
            "CREATE TABLE {} (\n{}\n){suffix}",
            self.qualified_table(),
            lines.join(",\n")
        )
    }

    pub fn truncate_sql(&self) -> String {
        format!("TRUNCATE TABLE {}", self.qualified_table())
    }

    /// Row count returning a single BIGINT
    pub fn count_sql(&self) -> String {
        match self.db_type {
            DbType::Mssql => format!(
                "SELECT CAST(COUNT(*) AS BIGINT) FROM {}",
                self.qualified_table()
            ),
            DbType::Mysql => format!("SELECT COUNT(*) FROM {}", self.qualified_table()),
        }
    }

    /// Positional placeholder for the 1-based parameter `index`
    pub fn placeholder(&self, index: usize) -> String {
        match self.db_type {
            DbType::Mssql => format!("@P{index}"),
            DbType::Mysql => "?".to_string(),
        }
    }

    /// Value expression for one column
    ///
    /// SQL Server converts date text server-side (style 127, ISO 8601 with
    /// offset; unconvertible values become NULL). MySQL gets typed binds.
    fn value_expr(&self, index: usize, kind: ColumnKind) -> String {
        let placeholder = self.placeholder(index);
        match (self.db_type, kind) {
            (DbType::Mssql, ColumnKind::DateTime) => {
                format!("TRY_CONVERT(datetimeoffset, {placeholder}, 127)")
            }
            _ => placeholder,
        }
    }

    /// INSERT for one row, columns in [`COLUMNS`] order
    pub fn insert_sql(&self) -> String {
        let names: Vec<&str> = COLUMNS.iter().map(|c| c.name).collect();
        let values: Vec<String> = COLUMNS
            .iter()
            .enumerate()
            .map(|(i, c)| self.value_expr(i + 1, c.kind))
            .collect();

        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.qualified_table(),
            names.join(", "),
            values.join(", ")
        )
    }

    /// Transaction control statements
    pub fn begin_sql(&self) -> &'static str {
        match self.db_type {
            DbType::Mssql => "BEGIN TRANSACTION",
            DbType::Mysql => "START TRANSACTION",
        }
    }

    pub fn commit_sql(&self) -> &'static str {
        match self.db_type {
            DbType::Mssql => "IF @@TRANCOUNT > 0 COMMIT TRANSACTION",
            DbType::Mysql => "COMMIT",
        }
    }

    pub fn rollback_sql(&self) -> &'static str {
        match self.db_type {
            DbType::Mssql => "IF @@TRANCOUNT > 0 ROLLBACK TRANSACTION",
            DbType::Mysql => "ROLLBACK",
        }
    }
}
