//! Crypto Dashboard API - Main executable
//!
//! Serves cached CoinGecko market data over HTTP. Stored snapshots are
//! reused while fresh and refreshed on demand otherwise.
use anyhow::Context;
use crypto_dashboard::coingecko::{CoinGeckoMarketService, MarketDataService};
use crypto_dashboard::interactor::{CryptoRepository, InMemoryCryptoRepository, PgCryptoRepository};
use crypto_dashboard::{create_router, AppConfig, ServiceContainer};
use dotenv::dotenv;
use log::{error, info, warn};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;

/// Application entry point
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    // Initialize logging with default level of "info"
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    info!("Starting Crypto Dashboard API v{}", crypto_dashboard::VERSION);

    let config = AppConfig::from_env();

    let repository: Arc<dyn CryptoRepository + Send + Sync> = match &config.database_url {
        Some(database_url) => {
            info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(config.db_max_connections)
                .connect(database_url)
                .await
                .context("Failed to create database connection pool")?;

            info!("Running database migrations...");
            if let Err(e) = sqlx::migrate!("./migrations").run(&db_pool).await {
                error!("Failed to run migrations: {}", e);
                return Err(anyhow::Error::from(e));
            }
            info!("Migrations completed successfully");

            Arc::new(PgCryptoRepository::new(Arc::new(db_pool)))
        }
        None => {
            warn!("DATABASE_URL is not set, using the in-memory store; data is lost on restart");
            Arc::new(InMemoryCryptoRepository::new())
        }
    };

    let market_service: Arc<dyn MarketDataService + Send + Sync> = Arc::new(
        CoinGeckoMarketService::new(config.coingecko.clone())
            .context("Failed to create CoinGecko client")?,
    );

    info!(
        "Freshness threshold {:?}, upstream timeout {:?}",
        config.freshness.threshold, config.freshness.upstream_timeout
    );
    let services = Arc::new(ServiceContainer::new(
        repository,
        market_service,
        config.freshness.clone(),
    ));
    let app = create_router(services, &config.allowed_origins);

    let listener = tokio::net::TcpListener::bind(&config.server_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server_addr))?;

    info!("Listening on {}. Press Ctrl+C to stop.", config.server_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
