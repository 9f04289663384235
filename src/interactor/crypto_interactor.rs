use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use futures::future::join_all;
use log::{info, warn};
use std::sync::Arc;

use crate::entity::{
    AssetSearchResult, AssetSnapshot, DashboardError, DataSource, PriceTrend, Served,
};
use crate::interactor::freshness::FreshnessPolicy;
use crate::utils::validate_asset_id;

pub const MAX_TOP_LIMIT: u32 = 100;
pub const MAX_TREND_DAYS: u32 = 365;
pub const MAX_SEARCH_LIMIT: usize = 50;
pub const MIN_QUERY_LEN: usize = 2;
// A stored trend needs at least this many points to be worth drawing
const MIN_STORED_TREND_POINTS: usize = 2;

/// Read side of the dashboard
#[async_trait]
pub trait CryptoInteractor: Send + Sync {
    async fn get_asset(
        &self,
        asset_id: &str,
        force_refresh: bool,
    ) -> Result<Served<AssetSnapshot>, DashboardError>;

    async fn get_top_assets(
        &self,
        limit: u32,
        force_refresh: bool,
    ) -> Result<Served<Vec<AssetSnapshot>>, DashboardError>;

    /// Resolves client-remembered ids through the per-asset policy
    async fn get_watchlist_assets(
        &self,
        asset_ids: &[String],
        limit: u32,
        force_refresh: bool,
    ) -> Result<Served<Vec<AssetSnapshot>>, DashboardError>;

    async fn get_price_trend(
        &self,
        asset_id: &str,
        days: u32,
        force_refresh: bool,
    ) -> Result<Served<PriceTrend>, DashboardError>;

    async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<AssetSearchResult>, DashboardError>;
}

pub struct CryptoInteractorImpl {
    freshness: Arc<FreshnessPolicy>,
}

impl CryptoInteractorImpl {
    pub fn new(freshness: Arc<FreshnessPolicy>) -> Self {
        Self { freshness }
    }

    fn check_top_limit(limit: u32) -> Result<(), DashboardError> {
        if limit == 0 || limit > MAX_TOP_LIMIT {
            return Err(DashboardError::InvalidRequest(format!(
                "limit must be between 1 and {}",
                MAX_TOP_LIMIT
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl CryptoInteractor for CryptoInteractorImpl {
    async fn get_asset(
        &self,
        asset_id: &str,
        force_refresh: bool,
    ) -> Result<Served<AssetSnapshot>, DashboardError> {
        if !validate_asset_id(asset_id) {
            return Err(DashboardError::NotFound(asset_id.to_string()));
        }

        self.freshness.get_asset(asset_id, force_refresh).await
    }

    async fn get_top_assets(
        &self,
        limit: u32,
        force_refresh: bool,
    ) -> Result<Served<Vec<AssetSnapshot>>, DashboardError> {
        Self::check_top_limit(limit)?;
        self.freshness.get_top_assets(limit, force_refresh).await
    }

    async fn get_watchlist_assets(
        &self,
        asset_ids: &[String],
        limit: u32,
        force_refresh: bool,
    ) -> Result<Served<Vec<AssetSnapshot>>, DashboardError> {
        Self::check_top_limit(limit)?;

        let requested: Vec<&String> = asset_ids.iter().take(limit as usize).collect();
        let lookups = requested
            .iter()
            .map(|id| self.get_asset(id.as_str(), force_refresh));
        let results = join_all(lookups).await;

        let mut assets = Vec::with_capacity(results.len());
        let mut source = DataSource::Store;
        let mut first_error = None;

        for (id, result) in requested.iter().zip(results) {
            match result {
                Ok(served) => {
                    source = source.max(served.source);
                    assets.push(served.data);
                }
                Err(DashboardError::NotFound(_)) => {
                    warn!("Skipping unknown watchlist asset {}", id);
                }
                Err(DashboardError::Database(e)) => return Err(DashboardError::Database(e)),
                Err(err) => {
                    warn!("Skipping unavailable watchlist asset {}: {}", id, err);
                    first_error.get_or_insert(err);
                }
            }
        }

        let missing = requested.len() - assets.len();
        if missing > 0 {
            info!("Watchlist resolved {} of {} assets", assets.len(), requested.len());
        }

        if assets.is_empty() {
            if let Some(err) = first_error {
                return Err(err);
            }
        }

        assets.sort_by_key(|a| (a.market_cap_rank.is_none(), a.market_cap_rank));
        Ok(Served { data: assets, source })
    }

    async fn get_price_trend(
        &self,
        asset_id: &str,
        days: u32,
        force_refresh: bool,
    ) -> Result<Served<PriceTrend>, DashboardError> {
        if days == 0 || days > MAX_TREND_DAYS {
            return Err(DashboardError::InvalidRequest(format!(
                "days must be between 1 and {}",
                MAX_TREND_DAYS
            )));
        }

        let asset = self.get_asset(asset_id, force_refresh).await?.data;
        let repository = self.freshness.repository();
        let since = Utc::now() - ChronoDuration::days(i64::from(days));
        let stored = repository.get_price_points(asset_id, since).await?;

        let trend = |data_points| PriceTrend {
            asset_id: asset.id.clone(),
            asset_name: asset.name.clone(),
            asset_symbol: asset.symbol.clone(),
            data_points,
            period_days: days,
        };

        if !force_refresh && stored.len() >= MIN_STORED_TREND_POINTS {
            return Ok(Served::store(trend(stored)));
        }

        let history = self
            .freshness
            .call_upstream(self.freshness.market().get_price_history(asset_id, days))
            .await;

        match history {
            Ok(points) => {
                let imported = repository.import_price_points(&points).await?;
                info!(
                    "Imported {} of {} history points for {} ({} days)",
                    imported,
                    points.len(),
                    asset_id,
                    days
                );
                let window = repository.get_price_points(asset_id, since).await?;
                Ok(Served::upstream(trend(window)))
            }
            Err(err) if !stored.is_empty() => {
                warn!("Serving stored trend for {}: {}", asset_id, err);
                Ok(Served::stale(trend(stored)))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<AssetSearchResult>, DashboardError> {
        let query = query.trim();
        if query.chars().count() < MIN_QUERY_LEN {
            return Err(DashboardError::InvalidRequest(format!(
                "query must be at least {} characters",
                MIN_QUERY_LEN
            )));
        }
        if limit == 0 || limit > MAX_SEARCH_LIMIT {
            return Err(DashboardError::InvalidRequest(format!(
                "limit must be between 1 and {}",
                MAX_SEARCH_LIMIT
            )));
        }

        match self
            .freshness
            .call_upstream(self.freshness.market().search(query))
            .await
        {
            Ok(mut results) => {
                results.truncate(limit);
                Ok(results)
            }
            Err(err) => {
                warn!("Search for {:?} failed: {}", query, err);
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::NewPricePoint;
    use crate::interactor::freshness::FreshnessConfig;
    use crate::interactor::memory_repository::InMemoryCryptoRepository;
    use crate::interactor::repository::CryptoRepository;
    use crate::test_support::{snapshot, StubMarket};

    fn interactor() -> (
        CryptoInteractorImpl,
        Arc<InMemoryCryptoRepository>,
        Arc<StubMarket>,
    ) {
        let repo = Arc::new(InMemoryCryptoRepository::new());
        let market = Arc::new(StubMarket::with_top(10));
        let freshness = Arc::new(FreshnessPolicy::new(
            repo.clone(),
            market.clone(),
            FreshnessConfig::default(),
        ));
        (CryptoInteractorImpl::new(freshness), repo, market)
    }

    #[tokio::test]
    async fn test_invalid_id_is_not_found_without_upstream_call() {
        let (interactor, _, market) = interactor();

        let err = interactor.get_asset("../admin", false).await.unwrap_err();

        assert!(matches!(err, DashboardError::NotFound(_)));
        assert_eq!(market.asset_calls(), 0);
    }

    #[tokio::test]
    async fn test_top_limit_bounds() {
        let (interactor, _, market) = interactor();

        assert!(matches!(
            interactor.get_top_assets(0, false).await,
            Err(DashboardError::InvalidRequest(_))
        ));
        assert!(matches!(
            interactor.get_top_assets(101, false).await,
            Err(DashboardError::InvalidRequest(_))
        ));
        assert_eq!(market.top_calls(), 0);
    }

    #[tokio::test]
    async fn test_watchlist_skips_unknown_ids_and_orders_by_rank() {
        let (interactor, _, _) = interactor();
        let ids = vec![
            "coin-5".to_string(),
            "not-listed".to_string(),
            "bitcoin".to_string(),
        ];

        let served = interactor
            .get_watchlist_assets(&ids, 10, false)
            .await
            .unwrap();

        let ids: Vec<&str> = served.data.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["bitcoin", "coin-5"]);
        assert_eq!(served.source, DataSource::Upstream);
    }

    #[tokio::test]
    async fn test_watchlist_reports_weakest_source() {
        let (interactor, repo, market) = interactor();
        interactor.get_asset("bitcoin", false).await.unwrap();
        repo.upsert_asset(&snapshot("ethereum", 2, Utc::now() - ChronoDuration::hours(1)))
            .await
            .unwrap();
        market.set_failing(true);

        let served = interactor
            .get_watchlist_assets(&["bitcoin".to_string(), "ethereum".to_string()], 10, false)
            .await
            .unwrap();

        assert_eq!(served.data.len(), 2);
        assert_eq!(served.source, DataSource::StaleFallback);
    }

    #[tokio::test]
    async fn test_watchlist_unavailable_asset_is_omitted_not_stale() {
        let (interactor, _, market) = interactor();
        interactor.get_asset("bitcoin", false).await.unwrap();
        market.set_failing(true);

        let served = interactor
            .get_watchlist_assets(&["bitcoin".to_string(), "ethereum".to_string()], 10, false)
            .await
            .unwrap();

        assert_eq!(served.data.len(), 1);
        assert_eq!(served.data[0].id, "bitcoin");
        assert_eq!(served.source, DataSource::Store);
    }

    #[tokio::test]
    async fn test_watchlist_fails_when_nothing_is_available() {
        let (interactor, _, market) = interactor();
        market.set_failing(true);

        let err = interactor
            .get_watchlist_assets(&["bitcoin".to_string()], 10, false)
            .await
            .unwrap_err();

        assert!(matches!(err, DashboardError::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn test_watchlist_respects_limit() {
        let (interactor, _, market) = interactor();
        let ids = vec![
            "bitcoin".to_string(),
            "ethereum".to_string(),
            "coin-3".to_string(),
        ];

        let served = interactor.get_watchlist_assets(&ids, 2, false).await.unwrap();

        assert_eq!(served.data.len(), 2);
        assert_eq!(market.asset_calls(), 2);
    }

    #[tokio::test]
    async fn test_trend_imports_history_when_store_is_thin() {
        let (interactor, repo, market) = interactor();

        let served = interactor.get_price_trend("bitcoin", 7, false).await.unwrap();

        assert_eq!(served.source, DataSource::Upstream);
        assert_eq!(market.history_calls(), 1);
        assert_eq!(served.data.asset_name, "bitcoin");
        assert!(served.data.data_points.len() >= 7);
        assert!(served
            .data
            .data_points
            .windows(2)
            .all(|w| w[0].timestamp <= w[1].timestamp));
        assert!(repo.price_point_count(Some("bitcoin")) >= 7);
    }

    #[tokio::test]
    async fn test_trend_served_from_store_when_enough_points() {
        let (interactor, _, market) = interactor();
        interactor.get_price_trend("bitcoin", 7, false).await.unwrap();

        let served = interactor.get_price_trend("bitcoin", 7, false).await.unwrap();

        assert_eq!(served.source, DataSource::Store);
        assert_eq!(market.history_calls(), 1);
    }

    #[tokio::test]
    async fn test_trend_falls_back_to_stored_points() {
        let (interactor, repo, market) = interactor();
        repo.upsert_asset(&snapshot("bitcoin", 1, Utc::now() - ChronoDuration::hours(1)))
            .await
            .unwrap();
        repo.append_price_point(&NewPricePoint {
            asset_id: "bitcoin".to_string(),
            price: 42.0,
            market_cap: None,
            total_volume: None,
            timestamp: Utc::now() - ChronoDuration::days(1),
        })
        .await
        .unwrap();
        market.set_failing(true);

        let served = interactor.get_price_trend("bitcoin", 7, false).await.unwrap();

        assert!(served.is_stale());
        assert_eq!(served.data.data_points.len(), 1);
    }

    #[tokio::test]
    async fn test_trend_days_bounds() {
        let (interactor, _, _) = interactor();

        assert!(matches!(
            interactor.get_price_trend("bitcoin", 0, false).await,
            Err(DashboardError::InvalidRequest(_))
        ));
        assert!(matches!(
            interactor.get_price_trend("bitcoin", 366, false).await,
            Err(DashboardError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_search_validation_and_failure() {
        let (interactor, _, market) = interactor();

        assert!(matches!(
            interactor.search(" b ", 20).await,
            Err(DashboardError::InvalidRequest(_))
        ));

        let results = interactor.search("coin", 3).await.unwrap();
        assert_eq!(results.len(), 3);

        market.set_failing(true);
        assert!(interactor.search("bitcoin", 20).await.unwrap().is_empty());
    }
}
