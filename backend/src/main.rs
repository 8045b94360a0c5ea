//! Stock Ledger - Backend Server

use std::{sync::Arc, time::Duration};

use sqlx::postgres::PgPoolOptions;
use stock_ledger::{
    config::{Config, StorageBackend},
    create_app,
    ledger::{InMemoryLedgerStore, LedgerStore, PgLedgerStore},
    AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    let json_logs = std::env::var("LEDGER_LOG_FORMAT").is_ok_and(|f| f == "json");
    let fmt_layer = if json_logs {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "ledger_server=debug,stock_ledger=debug,tower_http=debug,sqlx=warn".into()
            }),
        )
        .with(fmt_layer)
        .init();

    // Load configuration
    let config = Config::load()?;

    tracing::info!("Starting Stock Ledger Server");
    tracing::info!("Environment: {}", config.environment);

    let store = connect_store(&config).await?;

    // Create application state
    let state = AppState {
        store,
        config: Arc::new(config.clone()),
    };

    // Build application
    let app = create_app(state);

    // Start server
    let addr = config.bind_address();
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn connect_store(config: &Config) -> anyhow::Result<Arc<dyn LedgerStore>> {
    match config.ledger.storage {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory ledger store; data is lost on shutdown");
            Ok(Arc::new(InMemoryLedgerStore::new()))
        }
        StorageBackend::Postgres => {
            // Create database connection pool
            tracing::info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .min_connections(config.database.min_connections)
                .acquire_timeout(Duration::from_secs(30))
                .connect(&config.database.url)
                .await?;

            tracing::info!("Database connection established");

            // Run migrations in development
            if config.environment == "development" {
                tracing::info!("Running database migrations...");
                sqlx::migrate!("./migrations").run(&db_pool).await?;
                tracing::info!("Migrations completed");
            }

            Ok(Arc::new(PgLedgerStore::new(db_pool)))
        }
    }
}
