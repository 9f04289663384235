//! Freshness-gated cache-or-fetch policy.
//!
//! Every read decides between stored data and a provider refresh:
//! single assets are judged by their own `last_updated`, the top-N listing
//! by the single timestamp of the batch it was stored with. Successful
//! refreshes always append price history. Failed refreshes fall back to
//! whatever is stored, however old.

use chrono::{DateTime, Utc};
use log::{info, warn};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::coingecko::{MarketDataService, UpstreamError};
use crate::entity::{AssetSnapshot, DashboardError, NewPricePoint, Served};
use crate::interactor::repository::CryptoRepository;
use crate::utils::env_or;

/// Tunables of the freshness policy
#[derive(Debug, Clone)]
pub struct FreshnessConfig {
    /// Maximum age of stored data served without a refresh
    pub threshold: Duration,
    /// Upper bound on a single provider call before falling back
    pub upstream_timeout: Duration,
    /// Days of history imported per asset by a manual sync
    pub sync_history_days: u32,
}

impl Default for FreshnessConfig {
    fn default() -> Self {
        Self {
            threshold: Duration::from_secs(300),
            upstream_timeout: Duration::from_secs(45),
            sync_history_days: 30,
        }
    }
}

impl FreshnessConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            threshold: Duration::from_secs(env_or(
                "CACHE_TTL_SECONDS",
                defaults.threshold.as_secs(),
            )),
            upstream_timeout: Duration::from_secs(env_or(
                "UPSTREAM_TIMEOUT_SECONDS",
                defaults.upstream_timeout.as_secs(),
            )),
            sync_history_days: env_or("SYNC_HISTORY_DAYS", defaults.sync_history_days),
        }
    }

    /// Whether data refreshed at `last_updated` may still be served at `now`
    pub fn is_fresh(&self, last_updated: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match chrono::Duration::from_std(self.threshold) {
            Ok(threshold) => now - last_updated <= threshold,
            Err(_) => true,
        }
    }
}

pub struct FreshnessPolicy {
    repository: Arc<dyn CryptoRepository + Send + Sync>,
    market: Arc<dyn MarketDataService + Send + Sync>,
    config: FreshnessConfig,
}

impl FreshnessPolicy {
    pub fn new(
        repository: Arc<dyn CryptoRepository + Send + Sync>,
        market: Arc<dyn MarketDataService + Send + Sync>,
        config: FreshnessConfig,
    ) -> Self {
        Self {
            repository,
            market,
            config,
        }
    }

    pub fn config(&self) -> &FreshnessConfig {
        &self.config
    }

    pub fn repository(&self) -> Arc<dyn CryptoRepository + Send + Sync> {
        self.repository.clone()
    }

    pub fn market(&self) -> Arc<dyn MarketDataService + Send + Sync> {
        self.market.clone()
    }

    /// Runs a provider call under the configured timeout
    pub async fn call_upstream<T, F>(&self, call: F) -> Result<T, UpstreamError>
    where
        F: Future<Output = Result<T, UpstreamError>>,
    {
        match tokio::time::timeout(self.config.upstream_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(UpstreamError::Timeout),
        }
    }

    /// Serves one asset, refreshing it when missing, stale or forced
    pub async fn get_asset(
        &self,
        asset_id: &str,
        force_refresh: bool,
    ) -> Result<Served<AssetSnapshot>, DashboardError> {
        let stored = self.repository.get_asset(asset_id).await?;

        if !force_refresh {
            if let Some(asset) = &stored {
                if self.config.is_fresh(asset.last_updated, Utc::now()) {
                    return Ok(Served::store(asset.clone()));
                }
            }
        }

        info!(
            "Refreshing {} from CoinGecko (forced: {}, stored: {})",
            asset_id,
            force_refresh,
            stored.is_some()
        );

        match self.call_upstream(self.market.get_asset(asset_id)).await {
            Ok(fresh) => {
                let saved = self.persist_asset(fresh).await?;
                Ok(Served::upstream(saved))
            }
            Err(err) => match stored {
                Some(asset) => {
                    warn!("Serving stale snapshot for {}: {}", asset_id, err);
                    Ok(Served::stale(asset))
                }
                None => Err(err.into()),
            },
        }
    }

    /// Serves the top `limit` assets as one batch: either the whole stored
    /// batch is fresh enough, or the whole batch is refreshed together
    pub async fn get_top_assets(
        &self,
        limit: u32,
        force_refresh: bool,
    ) -> Result<Served<Vec<AssetSnapshot>>, DashboardError> {
        let stored = self.repository.get_latest_batch(limit).await?;

        if !force_refresh && self.batch_is_fresh(&stored, limit, Utc::now()) {
            return Ok(Served::store(stored));
        }

        info!(
            "Refreshing top {} batch from CoinGecko (forced: {}, stored rows: {})",
            limit,
            force_refresh,
            stored.len()
        );

        match self.refresh_top_assets(limit).await {
            Ok(saved) => Ok(Served::upstream(saved)),
            Err(DashboardError::Database(e)) => Err(DashboardError::Database(e)),
            Err(err) if !stored.is_empty() => {
                warn!("Serving stale top {} batch: {}", limit, err);
                Ok(Served::stale(stored))
            }
            Err(err) => Err(err),
        }
    }

    /// Fetches and stores a new top-N batch without any fallback
    pub async fn refresh_top_assets(
        &self,
        limit: u32,
    ) -> Result<Vec<AssetSnapshot>, DashboardError> {
        let assets = self
            .call_upstream(self.market.get_top_assets(limit))
            .await?;
        self.persist_batch(assets).await
    }

    fn batch_is_fresh(&self, batch: &[AssetSnapshot], limit: u32, now: DateTime<Utc>) -> bool {
        if batch.is_empty() || batch.len() < limit as usize {
            return false;
        }

        batch[0]
            .batch_synced_at
            .map_or(false, |synced_at| self.config.is_fresh(synced_at, now))
    }

    async fn persist_asset(&self, asset: AssetSnapshot) -> Result<AssetSnapshot, DashboardError> {
        let saved = self.repository.upsert_asset(&asset).await?;
        self.record_observation(&saved).await?;
        Ok(saved)
    }

    async fn persist_batch(
        &self,
        assets: Vec<AssetSnapshot>,
    ) -> Result<Vec<AssetSnapshot>, DashboardError> {
        let batch_time = Utc::now();
        let mut saved = Vec::with_capacity(assets.len());

        for mut asset in assets {
            asset.last_updated = batch_time;
            asset.batch_synced_at = Some(batch_time);
            let stored = self.repository.upsert_asset(&asset).await?;
            self.record_observation(&stored).await?;
            saved.push(stored);
        }

        info!("Stored top batch of {} assets at {}", saved.len(), batch_time);
        Ok(saved)
    }

    async fn record_observation(&self, asset: &AssetSnapshot) -> Result<(), DashboardError> {
        match NewPricePoint::from_snapshot(asset) {
            Some(point) => {
                self.repository.append_price_point(&point).await?;
            }
            None => warn!("No price reported for {}, history point skipped", asset.id),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::DataSource;
    use crate::interactor::memory_repository::InMemoryCryptoRepository;
    use crate::test_support::{snapshot, StubMarket};
    use chrono::Duration as ChronoDuration;

    struct Fixture {
        repo: Arc<InMemoryCryptoRepository>,
        market: Arc<StubMarket>,
        policy: FreshnessPolicy,
    }

    fn fixture() -> Fixture {
        let repo = Arc::new(InMemoryCryptoRepository::new());
        let market = Arc::new(StubMarket::with_top(10));
        let policy = FreshnessPolicy::new(repo.clone(), market.clone(), FreshnessConfig::default());
        Fixture {
            repo,
            market,
            policy,
        }
    }

    #[tokio::test]
    async fn test_empty_store_fetches_and_records_history() {
        let f = fixture();

        let served = f.policy.get_asset("bitcoin", false).await.unwrap();

        assert_eq!(served.source, DataSource::Upstream);
        assert_eq!(served.data.id, "bitcoin");
        assert_eq!(f.market.asset_calls(), 1);
        assert_eq!(f.repo.price_point_count(Some("bitcoin")), 1);
    }

    #[tokio::test]
    async fn test_fresh_store_is_served_without_upstream_call() {
        let f = fixture();
        let first = f.policy.get_asset("bitcoin", false).await.unwrap();

        let second = f.policy.get_asset("bitcoin", false).await.unwrap();

        assert_eq!(second.source, DataSource::Store);
        assert_eq!(second.data, first.data);
        assert_eq!(
            f.repo.get_asset("bitcoin").await.unwrap().unwrap(),
            second.data
        );
        assert_eq!(f.market.asset_calls(), 1);
        assert_eq!(f.repo.price_point_count(Some("bitcoin")), 1);
    }

    #[tokio::test]
    async fn test_stale_store_is_refreshed() {
        let f = fixture();
        let old = snapshot("bitcoin", 1, Utc::now() - ChronoDuration::minutes(10));
        f.repo.upsert_asset(&old).await.unwrap();

        let served = f.policy.get_asset("bitcoin", false).await.unwrap();

        assert_eq!(served.source, DataSource::Upstream);
        assert!(served.data.last_updated > old.last_updated);
        assert_eq!(f.market.asset_calls(), 1);
    }

    #[tokio::test]
    async fn test_force_refresh_always_calls_upstream() {
        let f = fixture();
        f.policy.get_asset("bitcoin", false).await.unwrap();

        let served = f.policy.get_asset("bitcoin", true).await.unwrap();

        assert_eq!(served.source, DataSource::Upstream);
        assert_eq!(f.market.asset_calls(), 2);
        assert_eq!(f.repo.price_point_count(Some("bitcoin")), 2);
        assert_eq!(
            f.repo.get_asset("bitcoin").await.unwrap().unwrap(),
            served.data
        );
    }

    #[tokio::test]
    async fn test_upstream_failure_serves_stale_snapshot() {
        let f = fixture();
        let old = snapshot("bitcoin", 1, Utc::now() - ChronoDuration::hours(2));
        f.repo.upsert_asset(&old).await.unwrap();
        f.market.set_failing(true);

        let served = f.policy.get_asset("bitcoin", true).await.unwrap();

        assert!(served.is_stale());
        assert_eq!(served.data, old);
        assert_eq!(f.repo.price_point_count(None), 0);
    }

    #[tokio::test]
    async fn test_upstream_failure_without_store_is_an_error() {
        let f = fixture();
        f.market.set_failing(true);

        let err = f.policy.get_asset("bitcoin", false).await.unwrap_err();

        assert!(matches!(err, DashboardError::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn test_unknown_asset_is_not_found() {
        let f = fixture();

        let err = f.policy.get_asset("not-a-coin", false).await.unwrap_err();

        assert!(matches!(err, DashboardError::NotFound(id) if id == "not-a-coin"));
    }

    #[tokio::test]
    async fn test_upstream_timeout_falls_back_to_stale() {
        let repo = Arc::new(InMemoryCryptoRepository::new());
        let market = Arc::new(StubMarket::with_top(10));
        market.set_delay(std::time::Duration::from_millis(200));
        let config = FreshnessConfig {
            upstream_timeout: std::time::Duration::from_millis(10),
            ..Default::default()
        };
        let policy = FreshnessPolicy::new(repo.clone(), market.clone(), config);
        let old = snapshot("bitcoin", 1, Utc::now() - ChronoDuration::hours(1));
        repo.upsert_asset(&old).await.unwrap();

        let served = policy.get_asset("bitcoin", false).await.unwrap();

        assert!(served.is_stale());
        assert_eq!(served.data, old);
    }

    #[tokio::test]
    async fn test_top_batch_served_from_store_when_fresh() {
        let f = fixture();
        let first = f.policy.get_top_assets(10, false).await.unwrap();

        let second = f.policy.get_top_assets(10, false).await.unwrap();
        let smaller = f.policy.get_top_assets(5, false).await.unwrap();

        assert_eq!(first.source, DataSource::Upstream);
        assert_eq!(second.source, DataSource::Store);
        assert_eq!(second.data, first.data);
        assert_eq!(smaller.source, DataSource::Store);
        assert_eq!(smaller.data.len(), 5);
        assert_eq!(f.market.top_calls(), 1);
    }

    #[tokio::test]
    async fn test_top_batch_shares_one_timestamp() {
        let f = fixture();

        let served = f.policy.get_top_assets(10, false).await.unwrap();

        let stamp = served.data[0].batch_synced_at;
        assert!(stamp.is_some());
        assert!(served
            .data
            .iter()
            .all(|a| a.batch_synced_at == stamp && Some(a.last_updated) == stamp));
    }

    #[tokio::test]
    async fn test_larger_request_than_stored_batch_refreshes() {
        let f = fixture();
        f.policy.get_top_assets(5, false).await.unwrap();

        let served = f.policy.get_top_assets(10, false).await.unwrap();

        assert_eq!(served.source, DataSource::Upstream);
        assert_eq!(served.data.len(), 10);
        assert_eq!(f.market.top_calls(), 2);
    }

    async fn seed_batch(repo: &InMemoryCryptoRepository, size: i32, synced_at: DateTime<Utc>) {
        for rank in 1..=size {
            let id = match rank {
                1 => "bitcoin".to_string(),
                2 => "ethereum".to_string(),
                n => format!("coin-{}", n),
            };
            let mut asset = snapshot(&id, rank, synced_at);
            asset.batch_synced_at = Some(synced_at);
            repo.upsert_asset(&asset).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_expired_batch_is_refreshed_as_a_whole() {
        let f = fixture();
        let synced_at = Utc::now() - ChronoDuration::minutes(10);
        seed_batch(&f.repo, 10, synced_at).await;

        let served = f.policy.get_top_assets(10, false).await.unwrap();

        assert_eq!(served.source, DataSource::Upstream);
        assert_eq!(served.data.len(), 10);
        assert_eq!(f.market.top_calls(), 1);
        assert_eq!(f.repo.price_point_count(None), 10);
        assert!(served
            .data
            .iter()
            .all(|a| a.batch_synced_at.is_some_and(|t| t > synced_at)));
    }

    #[tokio::test]
    async fn test_batch_just_inside_threshold_is_served_from_store() {
        let f = fixture();
        let synced_at = Utc::now() - ChronoDuration::seconds(299);
        seed_batch(&f.repo, 10, synced_at).await;

        let served = f.policy.get_top_assets(10, false).await.unwrap();

        assert_eq!(served.source, DataSource::Store);
        assert_eq!(f.market.top_calls(), 0);
        assert_eq!(f.repo.price_point_count(None), 0);
    }

    #[tokio::test]
    async fn test_individual_refresh_does_not_refresh_batch() {
        let f = fixture();
        let batch = f.policy.get_top_assets(3, false).await.unwrap();

        f.policy.get_asset("bitcoin", true).await.unwrap();
        let served = f.policy.get_top_assets(3, false).await.unwrap();

        assert_eq!(served.source, DataSource::Store);
        assert_eq!(
            served.data[0].batch_synced_at,
            batch.data[0].batch_synced_at
        );
    }

    #[tokio::test]
    async fn test_forced_top_refresh_appends_point_per_asset_each_time() {
        let f = fixture();

        f.policy.get_top_assets(10, true).await.unwrap();
        assert_eq!(f.repo.price_point_count(None), 10);

        f.policy.get_top_assets(10, true).await.unwrap();
        assert_eq!(f.repo.price_point_count(None), 20);
        assert_eq!(f.market.top_calls(), 2);
    }

    #[tokio::test]
    async fn test_top_failure_serves_stale_batch() {
        let f = fixture();
        let stored = f.policy.get_top_assets(10, false).await.unwrap();
        f.market.set_failing(true);

        let served = f.policy.get_top_assets(10, true).await.unwrap();

        assert!(served.is_stale());
        assert_eq!(served.data, stored.data);
    }

    #[tokio::test]
    async fn test_top_failure_without_store_is_an_error() {
        let f = fixture();
        f.market.set_failing(true);

        let err = f.policy.get_top_assets(10, false).await.unwrap_err();

        assert!(matches!(err, DashboardError::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn test_missing_price_skips_history_point() {
        let f = fixture();
        let mut priceless = snapshot("mystery", 50, Utc::now());
        priceless.current_price = None;
        f.market.insert_asset(priceless);

        let served = f.policy.get_asset("mystery", false).await.unwrap();

        assert_eq!(served.data.current_price, None);
        assert_eq!(f.repo.price_point_count(Some("mystery")), 0);
    }

    #[test]
    fn test_is_fresh_boundary() {
        let config = FreshnessConfig::default();
        let now = Utc::now();

        assert!(config.is_fresh(now - ChronoDuration::seconds(300), now));
        assert!(!config.is_fresh(now - ChronoDuration::seconds(301), now));
        assert!(config.is_fresh(now + ChronoDuration::seconds(5), now));
    }
}
