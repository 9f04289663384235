use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use log::{info, warn};
use std::sync::Arc;

use crate::entity::DashboardError;
use crate::interactor::freshness::FreshnessPolicy;

pub const MAX_SYNC_LIMIT: u32 = 100;
pub const MIN_RETENTION_DAYS: u32 = 30;
pub const MAX_RETENTION_DAYS: u32 = 365;

/// Outcome of a manual top-N sync
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    pub synced_count: usize,
    pub history_points_imported: u64,
}

/// Administrative operations. Failures surface directly, there is no fallback.
#[async_trait]
pub trait MaintenanceInteractor: Send + Sync {
    async fn sync_top_assets(&self, limit: u32) -> Result<SyncReport, DashboardError>;

    async fn cleanup_old_data(&self, older_than_days: u32) -> Result<u64, DashboardError>;
}

pub struct MaintenanceInteractorImpl {
    freshness: Arc<FreshnessPolicy>,
}

impl MaintenanceInteractorImpl {
    pub fn new(freshness: Arc<FreshnessPolicy>) -> Self {
        Self { freshness }
    }
}

#[async_trait]
impl MaintenanceInteractor for MaintenanceInteractorImpl {
    async fn sync_top_assets(&self, limit: u32) -> Result<SyncReport, DashboardError> {
        if limit == 0 || limit > MAX_SYNC_LIMIT {
            return Err(DashboardError::InvalidRequest(format!(
                "limit must be between 1 and {}",
                MAX_SYNC_LIMIT
            )));
        }

        let assets = self.freshness.refresh_top_assets(limit).await?;
        let days = self.freshness.config().sync_history_days;
        let repository = self.freshness.repository();
        let market = self.freshness.market();

        let mut history_points_imported = 0;
        for asset in &assets {
            let history = self
                .freshness
                .call_upstream(market.get_price_history(&asset.id, days))
                .await;
            match history {
                Ok(points) => {
                    history_points_imported += repository.import_price_points(&points).await?;
                }
                Err(e) => warn!("Skipping history import for {}: {}", asset.id, e),
            }
        }

        info!(
            "Synced {} assets, imported {} history points",
            assets.len(),
            history_points_imported
        );

        Ok(SyncReport {
            synced_count: assets.len(),
            history_points_imported,
        })
    }

    async fn cleanup_old_data(&self, older_than_days: u32) -> Result<u64, DashboardError> {
        if !(MIN_RETENTION_DAYS..=MAX_RETENTION_DAYS).contains(&older_than_days) {
            return Err(DashboardError::InvalidRequest(format!(
                "older_than_days must be between {} and {}",
                MIN_RETENTION_DAYS, MAX_RETENTION_DAYS
            )));
        }

        let cutoff = Utc::now() - ChronoDuration::days(i64::from(older_than_days));
        self.freshness
            .repository()
            .delete_price_points_before(cutoff)
            .await
    }
}
