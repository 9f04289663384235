use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::entity::{AssetSnapshot, DashboardError, NewPricePoint, PricePoint};
use crate::interactor::repository::{CryptoRepository, PRICE_WINDOW_LIMIT};

#[derive(Default)]
struct Tables {
    assets: HashMap<String, AssetSnapshot>,
    price_points: Vec<PricePoint>,
    next_point_id: i64,
}

/// Process-local [`CryptoRepository`], used when no database is configured.
/// Contents are lost on restart.
#[derive(Default)]
pub struct InMemoryCryptoRepository {
    tables: Mutex<Tables>,
}

impl InMemoryCryptoRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_tables<R>(&self, f: impl FnOnce(&mut Tables) -> R) -> R {
        let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut tables)
    }

    /// Number of stored price points for one asset, or for all when `None`
    pub fn price_point_count(&self, asset_id: Option<&str>) -> usize {
        self.with_tables(|tables| {
            tables
                .price_points
                .iter()
                .filter(|p| asset_id.map_or(true, |id| p.asset_id == id))
                .count()
        })
    }

    fn insert_point(tables: &mut Tables, point: &NewPricePoint) -> bool {
        let exists = tables
            .price_points
            .iter()
            .any(|p| p.asset_id == point.asset_id && p.timestamp == point.timestamp);
        if exists {
            return false;
        }

        tables.next_point_id += 1;
        let id = tables.next_point_id;
        tables.price_points.push(PricePoint {
            id,
            asset_id: point.asset_id.clone(),
            price: point.price,
            market_cap: point.market_cap,
            total_volume: point.total_volume,
            timestamp: point.timestamp,
        });
        true
    }
}

#[async_trait]
impl CryptoRepository for InMemoryCryptoRepository {
    async fn get_asset(&self, asset_id: &str) -> Result<Option<AssetSnapshot>, DashboardError> {
        Ok(self.with_tables(|tables| tables.assets.get(asset_id).cloned()))
    }

    async fn get_latest_batch(&self, limit: u32) -> Result<Vec<AssetSnapshot>, DashboardError> {
        Ok(self.with_tables(|tables| {
            let latest = tables.assets.values().filter_map(|a| a.batch_synced_at).max();
            let Some(latest) = latest else {
                return Vec::new();
            };

            let mut batch: Vec<AssetSnapshot> = tables
                .assets
                .values()
                .filter(|a| a.batch_synced_at == Some(latest))
                .cloned()
                .collect();
            batch.sort_by_key(|a| (a.market_cap_rank.is_none(), a.market_cap_rank));
            batch.truncate(limit as usize);
            batch
        }))
    }

    async fn upsert_asset(&self, asset: &AssetSnapshot) -> Result<AssetSnapshot, DashboardError> {
        Ok(self.with_tables(|tables| {
            let mut stored = asset.clone();
            if stored.batch_synced_at.is_none() {
                stored.batch_synced_at = tables
                    .assets
                    .get(&asset.id)
                    .and_then(|existing| existing.batch_synced_at);
            }
            tables.assets.insert(stored.id.clone(), stored.clone());
            stored
        }))
    }

    async fn append_price_point(&self, point: &NewPricePoint) -> Result<bool, DashboardError> {
        Ok(self.with_tables(|tables| Self::insert_point(tables, point)))
    }

    async fn import_price_points(&self, points: &[NewPricePoint]) -> Result<u64, DashboardError> {
        Ok(self.with_tables(|tables| {
            points
                .iter()
                .filter(|point| Self::insert_point(tables, point))
                .count() as u64
        }))
    }

    async fn get_price_points(
        &self,
        asset_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<PricePoint>, DashboardError> {
        Ok(self.with_tables(|tables| {
            let mut points: Vec<PricePoint> = tables
                .price_points
                .iter()
                .filter(|p| p.asset_id == asset_id && p.timestamp >= since)
                .cloned()
                .collect();
            points.sort_by_key(|p| p.timestamp);
            let excess = points.len().saturating_sub(PRICE_WINDOW_LIMIT);
            points.split_off(excess)
        }))
    }

    async fn delete_price_points_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, DashboardError> {
        Ok(self.with_tables(|tables| {
            let before = tables.price_points.len();
            tables.price_points.retain(|p| p.timestamp >= cutoff);
            (before - tables.price_points.len()) as u64
        }))
    }
}
