pub mod coingecko;
pub mod config;
pub mod di;
pub mod entity;
pub mod interactor;
pub mod router;
pub mod utils;
pub mod watchlist;

#[cfg(test)]
mod test_support;

// Re-export commonly used items
pub use config::AppConfig;
pub use di::ServiceContainer;
pub use entity::*;
pub use router::create_router;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
