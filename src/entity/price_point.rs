use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored price observation for an asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PricePoint {
    pub id: i64,
    #[sqlx(rename = "crypto_id")]
    pub asset_id: String,
    pub price: f64,
    pub market_cap: Option<f64>,
    pub total_volume: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

/// A price observation that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPricePoint {
    pub asset_id: String,
    pub price: f64,
    pub market_cap: Option<f64>,
    pub total_volume: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl NewPricePoint {
    /// Builds the observation recorded alongside a snapshot refresh.
    /// Returns `None` when the provider reported no price.
    pub fn from_snapshot(snapshot: &crate::entity::AssetSnapshot) -> Option<Self> {
        snapshot.current_price.map(|price| Self {
            asset_id: snapshot.id.clone(),
            price,
            market_cap: snapshot.market_cap,
            total_volume: snapshot.total_volume,
            timestamp: snapshot.last_updated,
        })
    }
}
