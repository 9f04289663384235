mod asset_snapshot;
mod dashboard_error;
mod price_point;
mod price_trend;
mod search_result;
mod served;
mod watchlist;

pub use asset_snapshot::AssetSnapshot;
pub use dashboard_error::DashboardError;
pub use price_point::{NewPricePoint, PricePoint};
pub use price_trend::PriceTrend;
pub use search_result::AssetSearchResult;
pub use served::{DataSource, Served};
pub use watchlist::WatchlistEntry;
