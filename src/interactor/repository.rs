use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::entity::{AssetSnapshot, DashboardError, NewPricePoint, PricePoint};
use crate::interactor::db;

/// Most price points returned for one history window; the newest are kept
pub const PRICE_WINDOW_LIMIT: usize = 1000;

/// Durable storage for snapshots and price history
#[async_trait]
pub trait CryptoRepository: Send + Sync {
    /// Snapshot of a single asset, if stored
    async fn get_asset(&self, asset_id: &str) -> Result<Option<AssetSnapshot>, DashboardError>;

    /// Up to `limit` rows of the newest top-N batch, best ranked first
    async fn get_latest_batch(&self, limit: u32) -> Result<Vec<AssetSnapshot>, DashboardError>;

    /// Insert or update keyed by id; returns the row as stored
    async fn upsert_asset(&self, asset: &AssetSnapshot) -> Result<AssetSnapshot, DashboardError>;

    /// Append one observation; `false` if the same (asset, timestamp) already exists
    async fn append_price_point(&self, point: &NewPricePoint) -> Result<bool, DashboardError>;

    /// Append many observations; returns how many were new
    async fn import_price_points(&self, points: &[NewPricePoint]) -> Result<u64, DashboardError>;

    /// Observations at or after `since`, oldest first, capped at the newest
    /// [`PRICE_WINDOW_LIMIT`]
    async fn get_price_points(
        &self,
        asset_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<PricePoint>, DashboardError>;

    /// Delete observations strictly older than `cutoff`; returns the count deleted
    async fn delete_price_points_before(&self, cutoff: DateTime<Utc>)
        -> Result<u64, DashboardError>;
}

/// Postgres implementation of [`CryptoRepository`]
pub struct PgCryptoRepository {
    db_pool: Arc<PgPool>,
}

impl PgCryptoRepository {
    pub fn new(db_pool: Arc<PgPool>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl CryptoRepository for PgCryptoRepository {
    async fn get_asset(&self, asset_id: &str) -> Result<Option<AssetSnapshot>, DashboardError> {
        Ok(db::get_asset(&self.db_pool, asset_id).await?)
    }

    async fn get_latest_batch(&self, limit: u32) -> Result<Vec<AssetSnapshot>, DashboardError> {
        Ok(db::get_latest_batch(&self.db_pool, limit).await?)
    }

    async fn upsert_asset(&self, asset: &AssetSnapshot) -> Result<AssetSnapshot, DashboardError> {
        Ok(db::upsert_asset(&self.db_pool, asset).await?)
    }

    async fn append_price_point(&self, point: &NewPricePoint) -> Result<bool, DashboardError> {
        Ok(db::insert_price_point(&self.db_pool, point).await?)
    }

    async fn import_price_points(&self, points: &[NewPricePoint]) -> Result<u64, DashboardError> {
        Ok(db::insert_price_points(&self.db_pool, points).await?)
    }

    async fn get_price_points(
        &self,
        asset_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<PricePoint>, DashboardError> {
        Ok(db::get_price_points(&self.db_pool, asset_id, since, PRICE_WINDOW_LIMIT).await?)
    }

    async fn delete_price_points_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, DashboardError> {
        Ok(db::delete_price_points_before(&self.db_pool, cutoff).await?)
    }
}
