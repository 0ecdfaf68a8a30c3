//! MySQL loader

use super::columns::{row_values, SqlValue};
use super::sql::SqlBuilder;
use super::TableLoader;
use crate::config::DatabaseSettings;
use crate::error::{Error, Result};
use crate::transform::{parse_feed_datetime, NormalizedElectionRow};
use crate::types::DbType;
use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::Connection;
use tracing::debug;

/// Loader backed by a single `sqlx` connection
pub struct MysqlLoader {
    conn: MySqlConnection,
    sql: SqlBuilder,
    insert_sql: String,
    in_transaction: bool,
}

impl MysqlLoader {
    pub async fn connect(settings: &DatabaseSettings, table: &str) -> Result<Self> {
        let options = MySqlConnectOptions::new()
            .host(&settings.host)
            .port(settings.port)
            .username(&settings.username)
            .password(&settings.password)
            .database(&settings.database);

        let conn = MySqlConnection::connect_with(&options)
            .await
            .map_err(|e| Error::connection(DbType::Mysql.display_name(), e))?;

        let sql = SqlBuilder::new(DbType::Mysql, table);
        let insert_sql = sql.insert_sql();

        Ok(Self {
            conn,
            sql,
            insert_sql,
            in_transaction: false,
        })
    }
}

#[async_trait]
impl TableLoader for MysqlLoader {
    fn sql(&self) -> &SqlBuilder {
        &self.sql
    }

    async fn execute(&mut self, sql: &str) -> Result<u64> {
        // Text protocol: transaction control and DDL cannot be prepared
        let result = sqlx::Executor::execute(&mut self.conn, sql).await?;
        Ok(result.rows_affected())
    }

    async fn query_count(&mut self, sql: &str) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(sql)
            .fetch_optional(&mut self.conn)
            .await?;
        Ok(count.unwrap_or_default())
    }

    async fn insert_row(&mut self, row: &NormalizedElectionRow) -> Result<()> {
        if !self.in_transaction {
            let begin = self.sql.begin_sql();
            self.execute(begin).await?;
            self.in_transaction = true;
            debug!("Transaction opened");
        }

        // Unparseable timestamps (e.g. joined multi-method dates) bind as NULL
        let mut query = sqlx::query(&self.insert_sql);
        for value in row_values(row) {
            query = match value {
                SqlValue::Text(v) => query.bind(v),
                SqlValue::DateTime(v) => query.bind(v.as_deref().and_then(parse_feed_datetime)),
            };
        }
        query.execute(&mut self.conn).await?;
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        if self.in_transaction {
            let commit = self.sql.commit_sql();
            self.execute(commit).await?;
            self.in_transaction = false;
            debug!("Transaction committed");
        }
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        if self.in_transaction {
            let rollback = self.sql.rollback_sql();
            self.execute(rollback).await?;
            self.in_transaction = false;
            debug!("Transaction rolled back");
        }
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.conn.close().await?;
        Ok(())
    }
}
