pub mod crypto_interactor;
pub mod db;
pub mod freshness;
pub mod maintenance_interactor;
pub mod memory_repository;
pub mod repository;

pub use crypto_interactor::{CryptoInteractor, CryptoInteractorImpl};
pub use freshness::{FreshnessConfig, FreshnessPolicy};
pub use maintenance_interactor::{MaintenanceInteractor, MaintenanceInteractorImpl, SyncReport};
pub use memory_repository::InMemoryCryptoRepository;
pub use repository::{CryptoRepository, PgCryptoRepository};
