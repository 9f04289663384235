use std::sync::Arc;

use crate::coingecko::MarketDataService;
use crate::interactor::{
    CryptoInteractor, CryptoInteractorImpl, CryptoRepository, FreshnessConfig, FreshnessPolicy,
    MaintenanceInteractor, MaintenanceInteractorImpl,
};

/// ServiceContainer wires the store and the market data provider into the interactors
pub struct ServiceContainer {
    crypto_interactor: Arc<dyn CryptoInteractor + Send + Sync>,
    maintenance_interactor: Arc<dyn MaintenanceInteractor + Send + Sync>,
}

impl ServiceContainer {
    pub fn new(
        repository: Arc<dyn CryptoRepository + Send + Sync>,
        market_service: Arc<dyn MarketDataService + Send + Sync>,
        freshness_config: FreshnessConfig,
    ) -> Self {
        let freshness = Arc::new(FreshnessPolicy::new(
            repository,
            market_service,
            freshness_config,
        ));

        let crypto_interactor = Arc::new(CryptoInteractorImpl::new(freshness.clone()))
            as Arc<dyn CryptoInteractor + Send + Sync>;
        let maintenance_interactor = Arc::new(MaintenanceInteractorImpl::new(freshness))
            as Arc<dyn MaintenanceInteractor + Send + Sync>;

        Self {
            crypto_interactor,
            maintenance_interactor,
        }
    }

    // Accessor methods

    pub fn crypto_interactor(&self) -> Arc<dyn CryptoInteractor + Send + Sync> {
        self.crypto_interactor.clone()
    }

    pub fn maintenance_interactor(&self) -> Arc<dyn MaintenanceInteractor + Send + Sync> {
        self.maintenance_interactor.clone()
    }
}
