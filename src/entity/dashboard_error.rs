use crate::coingecko::UpstreamError;

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Market data unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Cryptocurrency not found: {0}")]
    NotFound(String),

    #[error("Rate limited by market data provider")]
    RateLimited,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<UpstreamError> for DashboardError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::RateLimited | UpstreamError::Throttled(_) => DashboardError::RateLimited,
            UpstreamError::NotFound(id) => DashboardError::NotFound(id),
            other => DashboardError::UpstreamUnavailable(other.to_string()),
        }
    }
}
