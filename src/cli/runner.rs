//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands};
use crate::config::Settings;
use crate::database::{self, SqlBuilder};
use crate::engine::{SyncConfig, SyncJob, SyncStats};
use crate::error::Result;
use crate::http::FeedClient;
use crate::types::DbType;
use serde_json::{json, Value};
use tracing::{info, warn};

/// CLI runner
pub struct Runner {
    cli: Cli,
    settings: Settings,
}

impl Runner {
    pub fn new(cli: Cli, settings: Settings) -> Self {
        Self { cli, settings }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match self.cli.command() {
            Commands::Sync => self.sync().await,
            Commands::Check => self.check().await,
            Commands::Schema { db_type } => self.schema(db_type),
        }
    }

    async fn sync(&self) -> Result<()> {
        let db = self.settings.database_settings()?;
        let feed = self.settings.feed_settings()?;
        self.settings.validate()?;

        let loader = database::connect(&db, &self.settings.sync.table).await?;
        let job = SyncJob::new(FeedClient::new()?, feed)
            .with_config(SyncConfig::from(&self.settings.sync));

        let stats = job
            .run(loader, chrono::Local::now().naive_local())
            .await?;

        if let Some(failure) = &stats.failure {
            warn!(
                "Load incomplete: {} of {} Election IDs inserted before: {failure}",
                stats.inserted, stats.selected
            );
        }
        self.output_message(&report_message(&stats));
        Ok(())
    }

    async fn check(&self) -> Result<()> {
        let db = self.settings.database_settings()?;
        let feed = self.settings.feed_settings()?;
        self.settings.validate()?;

        self.output_message(&json!({
            "type": "LOG",
            "log": {"level": "INFO", "message": format!("Checking {}", db.connection_info())}
        }));

        let mut loader = database::connect(&db, &self.settings.sync.table).await?;
        let probe = async {
            loader.check().await?;
            let exists = loader.table_exists().await?;
            let rows = if exists {
                Some(loader.row_count().await?)
            } else {
                None
            };
            Ok::<_, crate::error::Error>((exists, rows))
        }
        .await;
        if let Err(e) = loader.close().await {
            warn!("Error closing database connection: {e}");
        }
        let (table_exists, rows) = probe?;

        let records = FeedClient::new()?.fetch(&feed).await?;
        info!("Feed returned {} records", records.len());

        self.output_message(&json!({
            "type": "CONNECTION_STATUS",
            "connectionStatus": {
                "status": "SUCCEEDED",
                "database": db.db_type.as_str(),
                "table": self.settings.sync.table,
                "tableExists": table_exists,
                "rows": rows,
                "feedRecords": records.len(),
            }
        }));
        Ok(())
    }

    fn schema(&self, db_type: Option<DbType>) -> Result<()> {
        let db_type = match db_type {
            Some(db_type) => db_type,
            None => self.settings.db_type()?,
        };
        let sql = SqlBuilder::new(db_type, &self.settings.sync.table);
        println!("{};", sql.create_table_sql());
        Ok(())
    }

    /// Output a message to stdout
    fn output_message(&self, msg: &Value) {
        println!("{}", serde_json::to_string(msg).unwrap_or_default());
    }
}

/// Machine-readable summary of a sync run
pub fn report_message(stats: &SyncStats) -> Value {
    json!({
        "type": "REPORT",
        "report": stats,
    })
}
