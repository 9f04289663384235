use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{AssetSearchResult, AssetSnapshot, DataSource, PricePoint, PriceTrend, Served};

#[derive(Debug, Default, Deserialize)]
pub struct TopAssetsQuery {
    #[serde(default)]
    pub force_refresh: bool,
    #[serde(default)]
    pub use_watchlist: bool,
    /// Comma separated asset ids remembered by the client
    pub watchlist: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RefreshQuery {
    #[serde(default)]
    pub force_refresh: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct PriceTrendQuery {
    pub days: Option<u32>,
    #[serde(default)]
    pub force_refresh: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SyncQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CleanupQuery {
    pub older_than_days: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TopAssetsResponse {
    pub coins: Vec<AssetSnapshot>,
    pub total_count: usize,
    pub data_source: DataSource,
}

impl From<Served<Vec<AssetSnapshot>>> for TopAssetsResponse {
    fn from(served: Served<Vec<AssetSnapshot>>) -> Self {
        Self {
            total_count: served.data.len(),
            coins: served.data,
            data_source: served.source,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AssetResponse {
    #[serde(flatten)]
    pub asset: AssetSnapshot,
    pub data_source: DataSource,
}

impl From<Served<AssetSnapshot>> for AssetResponse {
    fn from(served: Served<AssetSnapshot>) -> Self {
        Self {
            asset: served.data,
            data_source: served.source,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PricePointDto {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub market_cap: Option<f64>,
    pub total_volume: Option<f64>,
}

impl From<PricePoint> for PricePointDto {
    fn from(point: PricePoint) -> Self {
        Self {
            timestamp: point.timestamp,
            price: point.price,
            market_cap: point.market_cap,
            total_volume: point.total_volume,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PriceTrendResponse {
    pub crypto_id: String,
    pub crypto_name: String,
    pub crypto_symbol: String,
    pub data_points: Vec<PricePointDto>,
    pub period_days: u32,
    pub data_source: DataSource,
}

impl From<Served<PriceTrend>> for PriceTrendResponse {
    fn from(served: Served<PriceTrend>) -> Self {
        let trend = served.data;
        Self {
            crypto_id: trend.asset_id,
            crypto_name: trend.asset_name,
            crypto_symbol: trend.asset_symbol,
            data_points: trend.data_points.into_iter().map(Into::into).collect(),
            period_days: trend.period_days,
            data_source: served.source,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<AssetSearchResult>,
    pub total_count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SyncResponse {
    pub message: String,
    pub synced_count: usize,
    pub history_points_imported: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CleanupResponse {
    pub message: String,
    pub deleted_records: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InfoResponse {
    pub name: String,
    pub version: String,
}
