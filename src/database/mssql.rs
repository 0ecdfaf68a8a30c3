//! SQL Server loader

use super::columns::{row_values, SqlValue};
use super::sql::SqlBuilder;
use super::TableLoader;
use crate::config::DatabaseSettings;
use crate::error::{Error, Result};
use crate::transform::NormalizedElectionRow;
use crate::types::DbType;
use async_trait::async_trait;
use tiberius::{AuthMethod, Client, Config, Query};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::debug;

/// Loader backed by a single `tiberius` connection
pub struct MssqlLoader {
    client: Client<Compat<TcpStream>>,
    sql: SqlBuilder,
    insert_sql: String,
    in_transaction: bool,
}

impl MssqlLoader {
    /// Connect with SQL Server authentication
    pub async fn connect(settings: &DatabaseSettings, table: &str) -> Result<Self> {
        let engine = DbType::Mssql.display_name();

        let mut config = Config::new();
        config.host(&settings.host);
        config.port(settings.port);
        config.database(&settings.database);
        config.authentication(AuthMethod::sql_server(
            &settings.username,
            &settings.password,
        ));
        if settings.trust_cert {
            config.trust_cert();
        }

        let tcp = TcpStream::connect(config.get_addr())
            .await
            .map_err(|e| Error::connection(engine, e))?;
        tcp.set_nodelay(true)
            .map_err(|e| Error::connection(engine, e))?;

        let client = Client::connect(config, tcp.compat_write())
            .await
            .map_err(|e| Error::connection(engine, e))?;

        let sql = SqlBuilder::new(DbType::Mssql, table);
        let insert_sql = sql.insert_sql();

        Ok(Self {
            client,
            sql,
            insert_sql,
            in_transaction: false,
        })
    }

    /// Transaction control goes through a plain batch, not `sp_executesql`,
    /// so the transaction outlives the statement.
    async fn batch(&mut self, sql: &str) -> Result<()> {
        self.client.simple_query(sql).await?.into_results().await?;
        Ok(())
    }
}

#[async_trait]
impl TableLoader for MssqlLoader {
    fn sql(&self) -> &SqlBuilder {
        &self.sql
    }

    async fn execute(&mut self, sql: &str) -> Result<u64> {
        let result = self.client.execute(sql, &[]).await?;
        Ok(result.total())
    }

    async fn query_count(&mut self, sql: &str) -> Result<i64> {
        let row = self.client.query(sql, &[]).await?.into_row().await?;
        match row {
            Some(row) => Ok(row.try_get::<i64, _>(0)?.unwrap_or_default()),
            None => Ok(0),
        }
    }

    async fn insert_row(&mut self, row: &NormalizedElectionRow) -> Result<()> {
        if !self.in_transaction {
            let begin = self.sql.begin_sql();
            self.batch(begin).await?;
            self.in_transaction = true;
            debug!("Transaction opened");
        }

        let mut query = Query::new(self.insert_sql.as_str());
        for value in row_values(row) {
            match value {
                SqlValue::Text(v) | SqlValue::DateTime(v) => query.bind(v),
            }
        }
        query.execute(&mut self.client).await?;
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        if self.in_transaction {
            let commit = self.sql.commit_sql();
            self.batch(commit).await?;
            self.in_transaction = false;
            debug!("Transaction committed");
        }
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        if self.in_transaction {
            let rollback = self.sql.rollback_sql();
            self.batch(rollback).await?;
            self.in_transaction = false;
            debug!("Transaction rolled back");
        }
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.client.close().await?;
        Ok(())
    }
}
