use anyhow::Context;
use clap::Subcommand;

use crate::cli::{utils, OutputFormat};
use crate::config;
use crate::database::DatabaseManager;

#[derive(Subcommand)]
pub enum DbCommands {
    #[command(about = "Apply pending migrations to DATABASE_URL")]
    Migrate,

    #[command(about = "Check that DATABASE_URL accepts connections")]
    Ping,
}

pub async fn handle(cmd: DbCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let database = &config::config().database;
    let pool = DatabaseManager::connect(database)
        .await
        .context("failed to connect to PostgreSQL")?;

    match cmd {
        DbCommands::Migrate => {
            DatabaseManager::migrate(&pool).await.context("migration failed")?;
            utils::output_success(output_format, "Migrations applied", None)
        }
        DbCommands::Ping => {
            DatabaseManager::health_check(&pool).await.context("database did not answer")?;
            utils::output_success(output_format, "Database is reachable", None)
        }
    }
}
