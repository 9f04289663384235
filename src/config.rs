use std::env;

use crate::coingecko::Config as CoinGeckoConfig;
use crate::interactor::FreshnessConfig;
use crate::utils::{env_or, split_list};

const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:5173,http://localhost:3000";

/// Process-wide settings, read once at start-up
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_addr: String,
    /// `None` runs the service on the in-memory store
    pub database_url: Option<String>,
    pub allowed_origins: Vec<String>,
    pub db_max_connections: u32,
    pub freshness: FreshnessConfig,
    pub coingecko: CoinGeckoConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let database_url = env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());
        let origins =
            env::var("ALLOWED_ORIGINS").unwrap_or_else(|_| DEFAULT_ALLOWED_ORIGINS.to_string());

        Self {
            server_addr: env::var("SERVER_ADDR")
                .unwrap_or_else(|_| DEFAULT_SERVER_ADDR.to_string()),
            database_url,
            allowed_origins: split_list(&origins),
            db_max_connections: env_or("DB_MAX_CONNECTIONS", 10),
            freshness: FreshnessConfig::from_env(),
            coingecko: CoinGeckoConfig::from_env(),
        }
    }
}
