//! Wire formats of the CoinGecko endpoints we consume.

use serde::Deserialize;
use std::collections::HashMap;

/// Currency-keyed value map, e.g. `{"usd": 64000.0, "eur": 59000.0}`
pub type CurrencyMap<T> = HashMap<String, Option<T>>;

#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Entry of `GET /coins/markets`
#[derive(Debug, Clone, Deserialize)]
pub struct MarketCoin {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub image: Option<String>,
    pub current_price: Option<f64>,
    pub market_cap: Option<f64>,
    pub market_cap_rank: Option<i32>,
    pub fully_diluted_valuation: Option<f64>,
    pub total_volume: Option<f64>,
    pub high_24h: Option<f64>,
    pub low_24h: Option<f64>,
    pub price_change_24h: Option<f64>,
    pub price_change_percentage_24h: Option<f64>,
    pub market_cap_change_24h: Option<f64>,
    pub market_cap_change_percentage_24h: Option<f64>,
    pub circulating_supply: Option<f64>,
    pub total_supply: Option<f64>,
    pub max_supply: Option<f64>,
    pub ath: Option<f64>,
    pub ath_change_percentage: Option<f64>,
    pub ath_date: Option<String>,
    pub atl: Option<f64>,
    pub atl_change_percentage: Option<f64>,
    pub atl_date: Option<String>,
}

/// Response of `GET /coins/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct CoinDetail {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub image: Option<ImageLinks>,
    pub market_data: Option<MarketData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageLinks {
    pub thumb: Option<String>,
    pub small: Option<String>,
    pub large: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MarketData {
    pub current_price: Option<CurrencyMap<f64>>,
    pub market_cap: Option<CurrencyMap<f64>>,
    pub market_cap_rank: Option<i32>,
    pub fully_diluted_valuation: Option<CurrencyMap<f64>>,
    pub total_volume: Option<CurrencyMap<f64>>,
    pub high_24h: Option<CurrencyMap<f64>>,
    pub low_24h: Option<CurrencyMap<f64>>,
    pub price_change_24h: Option<f64>,
    pub price_change_24h_in_currency: Option<CurrencyMap<f64>>,
    pub price_change_percentage_24h: Option<f64>,
    pub market_cap_change_24h: Option<f64>,
    pub market_cap_change_24h_in_currency: Option<CurrencyMap<f64>>,
    pub market_cap_change_percentage_24h: Option<f64>,
    pub circulating_supply: Option<f64>,
    pub total_supply: Option<f64>,
    pub max_supply: Option<f64>,
    pub ath: Option<CurrencyMap<f64>>,
    pub ath_change_percentage: Option<CurrencyMap<f64>>,
    pub ath_date: Option<CurrencyMap<String>>,
    pub atl: Option<CurrencyMap<f64>>,
    pub atl_change_percentage: Option<CurrencyMap<f64>>,
    pub atl_date: Option<CurrencyMap<String>>,
}

/// Response of `GET /coins/{id}/market_chart`; each entry is `[timestamp_ms, value]`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MarketChart {
    #[serde(default)]
    pub prices: Vec<(f64, Option<f64>)>,
    #[serde(default)]
    pub market_caps: Vec<(f64, Option<f64>)>,
    #[serde(default)]
    pub total_volumes: Vec<(f64, Option<f64>)>,
}

/// Response of `GET /search`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub coins: Vec<SearchCoin>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchCoin {
    pub id: String,
    pub name: String,
    pub symbol: Option<String>,
    pub api_symbol: Option<String>,
    pub market_cap_rank: Option<i32>,
    pub thumb: Option<String>,
    pub small: Option<String>,
    pub large: Option<String>,
}
