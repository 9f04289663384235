use crate::entity::{AssetSnapshot, NewPricePoint, PricePoint};
use chrono::{DateTime, Utc};
use log::info;
use sqlx::{Error as SqlxError, PgPool};

// Get a stored snapshot by asset id
pub async fn get_asset(pool: &PgPool, asset_id: &str) -> Result<Option<AssetSnapshot>, SqlxError> {
    let asset = sqlx::query_as::<_, AssetSnapshot>("SELECT * FROM cryptocurrencies WHERE id = $1")
        .bind(asset_id)
        .fetch_optional(pool)
        .await?;

    Ok(asset)
}

/// Get the rows of the most recent top-N batch, best ranked first
pub async fn get_latest_batch(pool: &PgPool, limit: u32) -> Result<Vec<AssetSnapshot>, SqlxError> {
    let rows = sqlx::query_as::<_, AssetSnapshot>(
        "SELECT * FROM cryptocurrencies
         WHERE batch_synced_at = (SELECT MAX(batch_synced_at) FROM cryptocurrencies)
         ORDER BY market_cap_rank ASC NULLS LAST, market_cap DESC NULLS LAST
         LIMIT $1",
    )
    .bind(i64::from(limit))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Insert or update a snapshot keyed by id and return the stored row.
///
/// A NULL `batch_synced_at` keeps the existing batch stamp so individual
/// refreshes never detach a row from its batch.
pub async fn upsert_asset(
    pool: &PgPool,
    asset: &AssetSnapshot,
) -> Result<AssetSnapshot, SqlxError> {
    let stored = sqlx::query_as::<_, AssetSnapshot>(
        "INSERT INTO cryptocurrencies (
            id, symbol, name, image, current_price, market_cap, market_cap_rank,
            fully_diluted_valuation, total_volume, high_24h, low_24h, price_change_24h,
            price_change_percentage_24h, market_cap_change_24h, market_cap_change_percentage_24h,
            circulating_supply, total_supply, max_supply, ath, ath_change_percentage, ath_date,
            atl, atl_change_percentage, atl_date, last_updated, batch_synced_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
                $18, $19, $20, $21, $22, $23, $24, $25, $26)
        ON CONFLICT (id) DO UPDATE SET
            symbol = EXCLUDED.symbol,
            name = EXCLUDED.name,
            image = EXCLUDED.image,
            current_price = EXCLUDED.current_price,
            market_cap = EXCLUDED.market_cap,
            market_cap_rank = EXCLUDED.market_cap_rank,
            fully_diluted_valuation = EXCLUDED.fully_diluted_valuation,
            total_volume = EXCLUDED.total_volume,
            high_24h = EXCLUDED.high_24h,
            low_24h = EXCLUDED.low_24h,
            price_change_24h = EXCLUDED.price_change_24h,
            price_change_percentage_24h = EXCLUDED.price_change_percentage_24h,
            market_cap_change_24h = EXCLUDED.market_cap_change_24h,
            market_cap_change_percentage_24h = EXCLUDED.market_cap_change_percentage_24h,
            circulating_supply = EXCLUDED.circulating_supply,
            total_supply = EXCLUDED.total_supply,
            max_supply = EXCLUDED.max_supply,
            ath = EXCLUDED.ath,
            ath_change_percentage = EXCLUDED.ath_change_percentage,
            ath_date = EXCLUDED.ath_date,
            atl = EXCLUDED.atl,
            atl_change_percentage = EXCLUDED.atl_change_percentage,
            atl_date = EXCLUDED.atl_date,
            last_updated = EXCLUDED.last_updated,
            batch_synced_at = COALESCE(EXCLUDED.batch_synced_at, cryptocurrencies.batch_synced_at)
        RETURNING *",
    )
    .bind(&asset.id)
    .bind(&asset.symbol)
    .bind(&asset.name)
    .bind(&asset.image)
    .bind(asset.current_price)
    .bind(asset.market_cap)
    .bind(asset.market_cap_rank)
    .bind(asset.fully_diluted_valuation)
    .bind(asset.total_volume)
    .bind(asset.high_24h)
    .bind(asset.low_24h)
    .bind(asset.price_change_24h)
    .bind(asset.price_change_percentage_24h)
    .bind(asset.market_cap_change_24h)
    .bind(asset.market_cap_change_percentage_24h)
    .bind(asset.circulating_supply)
    .bind(asset.total_supply)
    .bind(asset.max_supply)
    .bind(asset.ath)
    .bind(asset.ath_change_percentage)
    .bind(asset.ath_date)
    .bind(asset.atl)
    .bind(asset.atl_change_percentage)
    .bind(asset.atl_date)
    .bind(asset.last_updated)
    .bind(asset.batch_synced_at)
    .fetch_one(pool)
    .await?;

    Ok(stored)
}

// Append a price observation; an existing (asset, timestamp) pair is left untouched
pub async fn insert_price_point(pool: &PgPool, point: &NewPricePoint) -> Result<bool, SqlxError> {
    let result = sqlx::query(
        "INSERT INTO price_history (crypto_id, price, market_cap, total_volume, timestamp)
         VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT (crypto_id, timestamp) DO NOTHING",
    )
    .bind(&point.asset_id)
    .bind(point.price)
    .bind(point.market_cap)
    .bind(point.total_volume)
    .bind(point.timestamp)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Bulk import of provider history; rows are inserted one by one since each
/// is independent.
pub async fn insert_price_points(
    pool: &PgPool,
    points: &[NewPricePoint],
) -> Result<u64, SqlxError> {
    let mut inserted = 0;
    for point in points {
        if insert_price_point(pool, point).await? {
            inserted += 1;
        }
    }

    if let Some(first) = points.first() {
        info!(
            "Imported {} of {} price points for {}",
            inserted,
            points.len(),
            first.asset_id
        );
    }

    Ok(inserted)
}

/// Get the newest `limit` price points of an asset since the given instant,
/// returned oldest first
pub async fn get_price_points(
    pool: &PgPool,
    asset_id: &str,
    since: DateTime<Utc>,
    limit: usize,
) -> Result<Vec<PricePoint>, SqlxError> {
    let mut rows = sqlx::query_as::<_, PricePoint>(
        "SELECT id, crypto_id, price, market_cap, total_volume, timestamp
         FROM price_history
         WHERE crypto_id = $1 AND timestamp >= $2
         ORDER BY timestamp DESC
         LIMIT $3",
    )
    .bind(asset_id)
    .bind(since)
    .bind(i64::try_from(limit).unwrap_or(i64::MAX))
    .fetch_all(pool)
    .await?;

    rows.reverse();
    Ok(rows)
}

/// Delete price history strictly older than the cutoff
pub async fn delete_price_points_before(
    pool: &PgPool,
    cutoff: DateTime<Utc>,
) -> Result<u64, SqlxError> {
    let result = sqlx::query("DELETE FROM price_history WHERE timestamp < $1")
        .bind(cutoff)
        .execute(pool)
        .await?;

    let count = result.rows_affected();
    info!("Deleted {} price points older than {}", count, cutoff);

    Ok(count)
}
