//! School library server binary

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use school_library_server::{
    config::{AppConfig, LoggingConfig, StorageBackend},
    create_router,
    repository::{seed::seed_demo_data, MemoryStore, PgStore, Repository},
    services::{
        clock::{Clock, SharedClock, SystemClock},
        Services,
    },
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    init_tracing(&config.logging);

    tracing::info!("Starting school library server v{}", env!("CARGO_PKG_VERSION"));

    let clock: SharedClock = Arc::new(SystemClock);
    let repository = open_repository(&config, clock.as_ref()).await?;

    let services = Services::new(repository, clock, &config.loans);

    let addr = SocketAddr::new(
        config.server.host.parse().context("Invalid host address")?,
        config.server.port,
    );

    // Create application state
    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    let app = create_router(state);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("school_library_server={},tower_http=debug", logging.level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Open the configured record store
async fn open_repository(config: &AppConfig, clock: &dyn Clock) -> anyhow::Result<Repository> {
    match config.storage.backend {
        StorageBackend::Memory => {
            let store = MemoryStore::new();
            if config.storage.seed_demo_data {
                seed_demo_data(&store, clock.today(), config.loans.duration_days)
                    .await
                    .context("Failed to seed demo data")?;
                tracing::info!("Loaded demo data into the in-memory store");
            }
            tracing::warn!("Using the in-memory store; records are lost on shutdown");
            Ok(Arc::new(store))
        }
        StorageBackend::Postgres => {
            // Create database connection pool
            let pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .min_connections(config.database.min_connections)
                .connect(&config.database.url)
                .await
                .context("Failed to connect to database")?;

            tracing::info!("Connected to database");

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("Failed to run database migrations")?;

            tracing::info!("Database migrations completed");

            Ok(Arc::new(PgStore::new(pool)))
        }
    }
}
