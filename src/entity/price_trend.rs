use crate::entity::PricePoint;

/// Price history of one asset over a trailing window, oldest point first.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTrend {
    pub asset_id: String,
    pub asset_name: String,
    pub asset_symbol: String,
    pub data_points: Vec<PricePoint>,
    pub period_days: u32,
}
