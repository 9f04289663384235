use std::sync::Arc;

use axum::{extract::State, Json};
use log::{debug, info};

use crate::di::ServiceContainer;
use crate::router::dto::{
    AssetResponse, CleanupQuery, CleanupResponse, HealthResponse, InfoResponse, PriceTrendQuery,
    PriceTrendResponse, RefreshQuery, SearchQuery, SearchResponse, SyncQuery, SyncResponse,
    TopAssetsQuery, TopAssetsResponse,
};
use crate::router::error::ErrorServer;
use crate::router::extract::{Path, Query};
use crate::utils::parse_id_list;

pub const SERVICE_NAME: &str = "crypto-dashboard-api";

const DEFAULT_TREND_DAYS: u32 = 30;
const DEFAULT_SEARCH_LIMIT: usize = 20;
const DEFAULT_SYNC_LIMIT: u32 = 10;
const DEFAULT_RETENTION_DAYS: u32 = 90;

pub async fn info() -> Json<InfoResponse> {
    Json(InfoResponse {
        name: "Crypto Dashboard API".to_string(),
        version: crate::VERSION.to_string(),
    })
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
    })
}

pub async fn top_assets(
    State(services): State<Arc<ServiceContainer>>,
    Path(limit): Path<u32>,
    Query(query): Query<TopAssetsQuery>,
) -> Result<Json<TopAssetsResponse>, ErrorServer> {
    let interactor = services.crypto_interactor();

    let watchlist = match (query.use_watchlist, query.watchlist.as_deref()) {
        (true, Some(ids)) => parse_id_list(ids),
        _ => Vec::new(),
    };

    let served = if watchlist.is_empty() {
        interactor.get_top_assets(limit, query.force_refresh).await?
    } else {
        debug!("Resolving watchlist of {} assets", watchlist.len());
        interactor
            .get_watchlist_assets(&watchlist, limit, query.force_refresh)
            .await?
    };

    Ok(Json(served.into()))
}

pub async fn asset(
    State(services): State<Arc<ServiceContainer>>,
    Path(asset_id): Path<String>,
    Query(query): Query<RefreshQuery>,
) -> Result<Json<AssetResponse>, ErrorServer> {
    let served = services
        .crypto_interactor()
        .get_asset(&asset_id, query.force_refresh)
        .await?;

    Ok(Json(served.into()))
}

pub async fn price_trend(
    State(services): State<Arc<ServiceContainer>>,
    Path(asset_id): Path<String>,
    Query(query): Query<PriceTrendQuery>,
) -> Result<Json<PriceTrendResponse>, ErrorServer> {
    let days = query.days.unwrap_or(DEFAULT_TREND_DAYS);
    let served = services
        .crypto_interactor()
        .get_price_trend(&asset_id, days, query.force_refresh)
        .await?;

    Ok(Json(served.into()))
}

pub async fn search(
    State(services): State<Arc<ServiceContainer>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, ErrorServer> {
    let q = query
        .q
        .ok_or_else(|| ErrorServer::bad_request("Missing query parameter q"))?;
    let limit = query.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);

    let results = services.crypto_interactor().search(&q, limit).await?;

    Ok(Json(SearchResponse {
        total_count: results.len(),
        results,
    }))
}

pub async fn sync_top_assets(
    State(services): State<Arc<ServiceContainer>>,
    Query(query): Query<SyncQuery>,
) -> Result<Json<SyncResponse>, ErrorServer> {
    let limit = query.limit.unwrap_or(DEFAULT_SYNC_LIMIT);
    info!("Manual sync of top {} assets requested", limit);

    let report = services.maintenance_interactor().sync_top_assets(limit).await?;

    Ok(Json(SyncResponse {
        message: format!("Successfully synced {} cryptocurrencies", report.synced_count),
        synced_count: report.synced_count,
        history_points_imported: report.history_points_imported,
    }))
}

pub async fn cleanup_old_data(
    State(services): State<Arc<ServiceContainer>>,
    Query(query): Query<CleanupQuery>,
) -> Result<Json<CleanupResponse>, ErrorServer> {
    let days = query.older_than_days.unwrap_or(DEFAULT_RETENTION_DAYS);

    let deleted_records = services.maintenance_interactor().cleanup_old_data(days).await?;

    Ok(Json(CleanupResponse {
        message: format!(
            "Deleted {} price records older than {} days",
            deleted_records, days
        ),
        deleted_records,
    }))
}
