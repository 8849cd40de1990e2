use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use staybook_api::api::{app, AppState};
use staybook_api::config::{self, StoreKind};
use staybook_api::database::{DatabaseManager, PgStore};
use staybook_api::is_production;

#[derive(Parser, Debug)]
#[command(name = "staybook-api", version, about = "Booking marketplace REST API server")]
struct ServerArgs {
    /// Serve from an empty in-memory store instead of PostgreSQL
    #[arg(long)]
    memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, SECURITY_JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("staybook_api=info,tower_http=info")),
        )
        .init();

    let args = ServerArgs::parse();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();
    tracing::info!("Starting Staybook API in {:?} mode", config.environment);

    if config.security.jwt_secret.is_empty() {
        anyhow::bail!("SECURITY_JWT_SECRET must be set outside development");
    }

    let use_memory = args.memory || config.database.store == StoreKind::Memory;
    let state = if use_memory {
        if is_production!() {
            anyhow::bail!("the in-memory store is not available in production");
        }
        tracing::warn!("Using the in-memory store; data is lost on exit");
        AppState::in_memory()
    } else {
        let pool = DatabaseManager::connect(&config.database)
            .await
            .context("failed to connect to PostgreSQL")?;
        if config.database.run_migrations {
            DatabaseManager::migrate(&pool).await.context("failed to run migrations")?;
        }
        AppState::new(PgStore::new(pool))
    };

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Staybook API listening on http://{}", bind_addr);

    axum::serve(listener, app(state)).await.context("server error")?;
    Ok(())
}
