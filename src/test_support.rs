//! Shared fixtures for unit tests.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::coingecko::{MarketDataService, UpstreamError};
use crate::entity::{AssetSearchResult, AssetSnapshot, NewPricePoint};

pub fn snapshot(id: &str, rank: i32, last_updated: DateTime<Utc>) -> AssetSnapshot {
    let mut asset = AssetSnapshot::new(id, &id[..id.len().min(3)], id, last_updated);
    asset.market_cap_rank = Some(rank);
    asset.current_price = Some(1000.0 / f64::from(rank));
    asset.market_cap = Some(1_000_000.0 / f64::from(rank));
    asset.total_volume = Some(10_000.0);
    asset
}

/// In-process market with call counters and switchable failures
pub struct StubMarket {
    catalog: Mutex<Vec<AssetSnapshot>>,
    failing: AtomicBool,
    delay: Mutex<Duration>,
    top_calls: AtomicUsize,
    asset_calls: AtomicUsize,
    history_calls: AtomicUsize,
}

impl StubMarket {
    /// Catalog of `count` assets: bitcoin, ethereum, then coin-3, coin-4, ...
    pub fn with_top(count: i32) -> Self {
        let catalog = (1..=count.max(2))
            .map(|rank| {
                let id = match rank {
                    1 => "bitcoin".to_string(),
                    2 => "ethereum".to_string(),
                    n => format!("coin-{}", n),
                };
                snapshot(&id, rank, Utc::now())
            })
            .collect();

        Self {
            catalog: Mutex::new(catalog),
            failing: AtomicBool::new(false),
            delay: Mutex::new(Duration::ZERO),
            top_calls: AtomicUsize::new(0),
            asset_calls: AtomicUsize::new(0),
            history_calls: AtomicUsize::new(0),
        }
    }

    pub fn insert_asset(&self, asset: AssetSnapshot) {
        self.catalog.lock().unwrap().push(asset);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn top_calls(&self) -> usize {
        self.top_calls.load(Ordering::SeqCst)
    }

    pub fn asset_calls(&self) -> usize {
        self.asset_calls.load(Ordering::SeqCst)
    }

    pub fn history_calls(&self) -> usize {
        self.history_calls.load(Ordering::SeqCst)
    }

    async fn respond(&self) -> Result<(), UpstreamError> {
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(UpstreamError::Api {
                status: 503,
                message: "stub outage".to_string(),
            });
        }
        Ok(())
    }

    fn find(&self, asset_id: &str) -> Option<AssetSnapshot> {
        self.catalog
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == asset_id)
            .cloned()
    }
}

#[async_trait]
impl MarketDataService for StubMarket {
    async fn get_top_assets(&self, limit: u32) -> Result<Vec<AssetSnapshot>, UpstreamError> {
        self.top_calls.fetch_add(1, Ordering::SeqCst);
        self.respond().await?;

        let mut assets = self.catalog.lock().unwrap().clone();
        assets.sort_by_key(|a| a.market_cap_rank);
        assets.truncate(limit as usize);
        let now = Utc::now();
        for asset in assets.iter_mut() {
            asset.last_updated = now;
        }
        Ok(assets)
    }

    async fn get_asset(&self, asset_id: &str) -> Result<AssetSnapshot, UpstreamError> {
        self.asset_calls.fetch_add(1, Ordering::SeqCst);
        self.respond().await?;

        let mut asset = self
            .find(asset_id)
            .ok_or_else(|| UpstreamError::NotFound(asset_id.to_string()))?;
        asset.last_updated = Utc::now();
        Ok(asset)
    }

    async fn get_price_history(
        &self,
        asset_id: &str,
        days: u32,
    ) -> Result<Vec<NewPricePoint>, UpstreamError> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        self.respond().await?;

        let asset = self
            .find(asset_id)
            .ok_or_else(|| UpstreamError::NotFound(asset_id.to_string()))?;
        let price = asset.current_price.unwrap_or(1.0);
        let now = Utc::now();

        Ok((0..=days)
            .rev()
            .map(|back| NewPricePoint {
                asset_id: asset_id.to_string(),
                price: price + f64::from(back),
                market_cap: asset.market_cap,
                total_volume: asset.total_volume,
                timestamp: now - ChronoDuration::days(i64::from(back)),
            })
            .collect())
    }

    async fn search(&self, query: &str) -> Result<Vec<AssetSearchResult>, UpstreamError> {
        self.respond().await?;

        let query = query.to_lowercase();
        Ok(self
            .catalog
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.id.contains(&query) || a.name.to_lowercase().contains(&query))
            .map(|a| AssetSearchResult {
                id: a.id.clone(),
                name: a.name.clone(),
                symbol: a.symbol.to_uppercase(),
                market_cap_rank: a.market_cap_rank,
                image: a.image.clone(),
            })
            .collect())
    }
}
