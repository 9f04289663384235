use std::time::Duration;

/// Failure talking to the CoinGecko API.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("CoinGecko request timed out")]
    Timeout,

    #[error("Rate limited by CoinGecko API")]
    RateLimited,

    #[error("Request rejected by local throttle, next slot in {0:?}")]
    Throttled(Duration),

    #[error("Coin not found: {0}")]
    NotFound(String),

    #[error("CoinGecko API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse CoinGecko response: {0}")]
    Parse(String),
}

impl UpstreamError {
    /// Whether repeating the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            UpstreamError::Network(_) | UpstreamError::Timeout | UpstreamError::RateLimited => true,
            UpstreamError::Api { status, .. } => *status >= 500,
            UpstreamError::Throttled(_) | UpstreamError::NotFound(_) | UpstreamError::Parse(_) => {
                false
            }
        }
    }
}
