// src/coingecko/mod.rs
pub mod config;
pub mod error;
pub mod market_service;
pub mod models;
pub mod retry;
pub mod throttle;

pub use config::Config;
pub use error::UpstreamError;
pub use market_service::{CoinGeckoMarketService, MarketDataService};
pub use retry::RetryPolicy;
pub use throttle::RequestThrottle;
