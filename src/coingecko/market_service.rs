use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use log::{debug, error, info, warn};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use tokio::time::sleep;

use crate::coingecko::models::{
    CoinDetail, CurrencyMap, ErrorResponse, MarketChart, MarketCoin, MarketData, SearchResponse,
};
use crate::coingecko::{Config, RequestThrottle, UpstreamError};
use crate::entity::{AssetSearchResult, AssetSnapshot, NewPricePoint};

const USER_AGENT_VALUE: &str = "Crypto-Dashboard/1.0";
const API_KEY_HEADER: &str = "x-cg-demo-api-key";
const MAX_PER_PAGE: u32 = 250;
const MAX_SEARCH_RESULTS: usize = 50;

/// Source of market data for tracked assets
#[async_trait]
pub trait MarketDataService: Send + Sync {
    /// Top assets by market capitalisation, best ranked first
    async fn get_top_assets(&self, limit: u32) -> Result<Vec<AssetSnapshot>, UpstreamError>;

    /// Current market data of a single asset
    async fn get_asset(&self, asset_id: &str) -> Result<AssetSnapshot, UpstreamError>;

    /// Historical prices over the trailing `days`
    async fn get_price_history(
        &self,
        asset_id: &str,
        days: u32,
    ) -> Result<Vec<NewPricePoint>, UpstreamError>;

    /// Assets matching a name or symbol
    async fn search(&self, query: &str) -> Result<Vec<AssetSearchResult>, UpstreamError>;
}

/// [`MarketDataService`] backed by the CoinGecko REST API
pub struct CoinGeckoMarketService {
    http_client: Client,
    config: Config,
    throttle: RequestThrottle,
}

impl CoinGeckoMarketService {
    pub fn new(config: Config) -> Result<Self, UpstreamError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        if let Some(api_key) = &config.api_key {
            let value = HeaderValue::from_str(api_key)
                .map_err(|e| UpstreamError::Parse(format!("Invalid API key header: {}", e)))?;
            headers.insert(API_KEY_HEADER, value);
        }

        let http_client = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()?;

        let throttle =
            RequestThrottle::per_minute(config.requests_per_minute, config.max_queue_wait);

        Ok(Self {
            http_client,
            config,
            throttle,
        })
    }

    /// Issues a GET against `endpoint`, retrying transient failures per the retry policy
    async fn get_json<D>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<D, UpstreamError>
    where
        D: DeserializeOwned,
    {
        let mut attempt = 1;
        loop {
            match self.send_once(endpoint, params).await {
                Ok(value) => return Ok(value),
                Err(err) if self.config.retry.should_retry(attempt, &err) => {
                    let backoff = self.config.retry.backoff_for(attempt);
                    warn!(
                        "CoinGecko request to {} failed (attempt {}/{}): {}; retrying in {:?}",
                        endpoint, attempt, self.config.retry.max_attempts, err, backoff
                    );
                    sleep(backoff).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn send_once<D>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<D, UpstreamError>
    where
        D: DeserializeOwned,
    {
        self.throttle.acquire().await?;

        let url = format!("{}/{}", self.config.api_url.trim_end_matches('/'), endpoint);
        debug!("GET {}", url);

        let response = self
            .http_client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    UpstreamError::Timeout
                } else {
                    UpstreamError::Network(e)
                }
            })?;

        let status = response.status();
        info!("CoinGecko API response: {} for {}", status, endpoint);

        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!("Rate limited by CoinGecko API");
            return Err(UpstreamError::RateLimited);
        }

        if status == StatusCode::NOT_FOUND {
            return Err(UpstreamError::NotFound(endpoint.to_string()));
        }

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("CoinGecko API error: {} - {}", status, error_text);
            return Err(UpstreamError::Api {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| UpstreamError::Parse(e.to_string()))?;

        check_for_api_error(value)
    }
}

/// Some CoinGecko failures come back as `200 {"error": "..."}`
fn check_for_api_error<D>(value: serde_json::Value) -> Result<D, UpstreamError>
where
    D: DeserializeOwned,
{
    if let Ok(ErrorResponse { error }) = serde_json::from_value::<ErrorResponse>(value.clone()) {
        if error.to_lowercase().contains("not found") {
            return Err(UpstreamError::NotFound(error));
        }
        return Err(UpstreamError::Api {
            status: 200,
            message: error,
        });
    }

    serde_json::from_value(value).map_err(|e| UpstreamError::Parse(e.to_string()))
}

#[async_trait]
impl MarketDataService for CoinGeckoMarketService {
    async fn get_top_assets(&self, limit: u32) -> Result<Vec<AssetSnapshot>, UpstreamError> {
        let params = [
            ("vs_currency", self.config.vs_currency.clone()),
            ("order", "market_cap_desc".to_string()),
            ("per_page", limit.min(MAX_PER_PAGE).to_string()),
            ("page", "1".to_string()),
            ("sparkline", "false".to_string()),
            ("price_change_percentage", "24h".to_string()),
        ];

        let coins: Vec<MarketCoin> = self.get_json("coins/markets", &params).await?;
        let fetched_at = Utc::now();

        Ok(coins
            .into_iter()
            .map(|coin| snapshot_from_market(coin, fetched_at))
            .collect())
    }

    async fn get_asset(&self, asset_id: &str) -> Result<AssetSnapshot, UpstreamError> {
        let params = [
            ("localization", "false".to_string()),
            ("tickers", "false".to_string()),
            ("market_data", "true".to_string()),
            ("community_data", "false".to_string()),
            ("developer_data", "false".to_string()),
        ];

        let endpoint = format!("coins/{}", asset_id);
        let detail: CoinDetail = self.get_json(&endpoint, &params).await.map_err(|e| match e {
            UpstreamError::NotFound(_) => UpstreamError::NotFound(asset_id.to_string()),
            other => other,
        })?;

        Ok(snapshot_from_detail(
            detail,
            &self.config.vs_currency,
            Utc::now(),
        ))
    }

    async fn get_price_history(
        &self,
        asset_id: &str,
        days: u32,
    ) -> Result<Vec<NewPricePoint>, UpstreamError> {
        let mut params = vec![
            ("vs_currency", self.config.vs_currency.clone()),
            ("days", days.to_string()),
        ];
        if days > 1 {
            params.push(("interval", "daily".to_string()));
        }

        let endpoint = format!("coins/{}/market_chart", asset_id);
        let chart: MarketChart = self.get_json(&endpoint, &params).await.map_err(|e| match e {
            UpstreamError::NotFound(_) => UpstreamError::NotFound(asset_id.to_string()),
            other => other,
        })?;

        Ok(points_from_chart(asset_id, chart))
    }

    async fn search(&self, query: &str) -> Result<Vec<AssetSearchResult>, UpstreamError> {
        let params = [("query", query.to_string())];
        let response: SearchResponse = self.get_json("search", &params).await?;

        if response.coins.is_empty() {
            warn!("No search results found for query: {}", query);
        }

        Ok(response
            .coins
            .into_iter()
            .take(MAX_SEARCH_RESULTS)
            .map(|coin| AssetSearchResult {
                symbol: coin
                    .symbol
                    .or(coin.api_symbol)
                    .unwrap_or_default()
                    .to_uppercase(),
                image: coin.thumb.or(coin.large).or(coin.small),
                id: coin.id,
                name: coin.name,
                market_cap_rank: coin.market_cap_rank,
            })
            .collect())
    }
}

/// Parses an ISO-8601 date, logging and dropping values that do not parse.
fn parse_date(value: Option<&str>) -> Option<DateTime<Utc>> {
    let value = value.filter(|v| !v.is_empty())?;
    match DateTime::parse_from_rfc3339(value) {
        Ok(date) => Some(date.with_timezone(&Utc)),
        Err(e) => {
            warn!("Could not parse date '{}': {}", value, e);
            None
        }
    }
}

fn in_currency<T: Clone>(map: &Option<CurrencyMap<T>>, vs_currency: &str) -> Option<T> {
    map.as_ref()?.get(vs_currency).cloned().flatten()
}

pub(crate) fn snapshot_from_market(coin: MarketCoin, fetched_at: DateTime<Utc>) -> AssetSnapshot {
    AssetSnapshot {
        ath_date: parse_date(coin.ath_date.as_deref()),
        atl_date: parse_date(coin.atl_date.as_deref()),
        id: coin.id,
        symbol: coin.symbol,
        name: coin.name,
        image: coin.image,
        current_price: coin.current_price,
        market_cap: coin.market_cap,
        market_cap_rank: coin.market_cap_rank,
        fully_diluted_valuation: coin.fully_diluted_valuation,
        total_volume: coin.total_volume,
        high_24h: coin.high_24h,
        low_24h: coin.low_24h,
        price_change_24h: coin.price_change_24h,
        price_change_percentage_24h: coin.price_change_percentage_24h,
        market_cap_change_24h: coin.market_cap_change_24h,
        market_cap_change_percentage_24h: coin.market_cap_change_percentage_24h,
        circulating_supply: coin.circulating_supply,
        total_supply: coin.total_supply,
        max_supply: coin.max_supply,
        ath: coin.ath,
        ath_change_percentage: coin.ath_change_percentage,
        atl: coin.atl,
        atl_change_percentage: coin.atl_change_percentage,
        last_updated: fetched_at,
        batch_synced_at: None,
    }
}

pub(crate) fn snapshot_from_detail(
    detail: CoinDetail,
    vs_currency: &str,
    fetched_at: DateTime<Utc>,
) -> AssetSnapshot {
    let market = detail.market_data.unwrap_or_default();
    let MarketData {
        current_price,
        market_cap,
        market_cap_rank,
        fully_diluted_valuation,
        total_volume,
        high_24h,
        low_24h,
        price_change_24h,
        price_change_24h_in_currency,
        price_change_percentage_24h,
        market_cap_change_24h,
        market_cap_change_24h_in_currency,
        market_cap_change_percentage_24h,
        circulating_supply,
        total_supply,
        max_supply,
        ath,
        ath_change_percentage,
        ath_date,
        atl,
        atl_change_percentage,
        atl_date,
    } = market;

    let mut snapshot = AssetSnapshot::new(&detail.id, &detail.symbol, &detail.name, fetched_at);
    snapshot.image = detail
        .image
        .and_then(|links| links.large.or(links.small).or(links.thumb));
    snapshot.current_price = in_currency(&current_price, vs_currency);
    snapshot.market_cap = in_currency(&market_cap, vs_currency);
    snapshot.market_cap_rank = market_cap_rank;
    snapshot.fully_diluted_valuation = in_currency(&fully_diluted_valuation, vs_currency);
    snapshot.total_volume = in_currency(&total_volume, vs_currency);
    snapshot.high_24h = in_currency(&high_24h, vs_currency);
    snapshot.low_24h = in_currency(&low_24h, vs_currency);
    snapshot.price_change_24h =
        in_currency(&price_change_24h_in_currency, vs_currency).or(price_change_24h);
    snapshot.price_change_percentage_24h = price_change_percentage_24h;
    snapshot.market_cap_change_24h =
        in_currency(&market_cap_change_24h_in_currency, vs_currency).or(market_cap_change_24h);
    snapshot.market_cap_change_percentage_24h = market_cap_change_percentage_24h;
    snapshot.circulating_supply = circulating_supply;
    snapshot.total_supply = total_supply;
    snapshot.max_supply = max_supply;
    snapshot.ath = in_currency(&ath, vs_currency);
    snapshot.ath_change_percentage = in_currency(&ath_change_percentage, vs_currency);
    snapshot.ath_date = parse_date(in_currency(&ath_date, vs_currency).as_deref());
    snapshot.atl = in_currency(&atl, vs_currency);
    snapshot.atl_change_percentage = in_currency(&atl_change_percentage, vs_currency);
    snapshot.atl_date = parse_date(in_currency(&atl_date, vs_currency).as_deref());
    snapshot
}

pub(crate) fn points_from_chart(asset_id: &str, chart: MarketChart) -> Vec<NewPricePoint> {
    let to_lookup = |series: Vec<(f64, Option<f64>)>| -> HashMap<i64, f64> {
        series
            .into_iter()
            .filter_map(|(ts, value)| value.map(|v| (ts as i64, v)))
            .collect()
    };
    let market_caps = to_lookup(chart.market_caps);
    let volumes = to_lookup(chart.total_volumes);

    chart
        .prices
        .into_iter()
        .filter_map(|(ts, price)| {
            let price = price?;
            let millis = ts as i64;
            let timestamp = Utc.timestamp_millis_opt(millis).single()?;
            Some(NewPricePoint {
                asset_id: asset_id.to_string(),
                price,
                market_cap: market_caps.get(&millis).copied(),
                total_volume: volumes.get(&millis).copied(),
                timestamp,
            })
        })
        .collect()
}
