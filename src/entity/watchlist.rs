use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An asset remembered by a client. The server keeps no watchlist state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    pub asset_id: String,
    pub symbol: String,
    pub name: String,
    pub added_at: DateTime<Utc>,
}

impl WatchlistEntry {
    pub fn new(asset_id: &str, symbol: &str, name: &str) -> Self {
        Self {
            asset_id: asset_id.to_string(),
            symbol: symbol.to_uppercase(),
            name: name.to_string(),
            added_at: Utc::now(),
        }
    }
}
