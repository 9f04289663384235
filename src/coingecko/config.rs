use std::time::Duration;

use crate::coingecko::RetryPolicy;
use crate::utils::env_or;

pub const DEFAULT_API_URL: &str = "https://api.coingecko.com/api/v3";

/// CoinGecko client configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the CoinGecko API
    pub api_url: String,

    /// Demo API key, sent as `x-cg-demo-api-key` when present
    pub api_key: Option<String>,

    /// Quote currency for prices
    pub vs_currency: String,

    /// Request budget used to space calls client-side
    pub requests_per_minute: u32,

    /// Longest a caller may queue for a request slot
    pub max_queue_wait: Duration,

    /// Per-request HTTP timeout
    pub request_timeout: Duration,

    pub retry: RetryPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            vs_currency: "usd".to_string(),
            requests_per_minute: 30,
            max_queue_wait: Duration::from_secs(20),
            request_timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }
}

impl Config {
    /// Builds the configuration from environment variables
    pub fn from_env() -> Self {
        use std::env;

        let defaults = Self::default();
        let retry = RetryPolicy {
            max_attempts: env_or("COINGECKO_MAX_ATTEMPTS", defaults.retry.max_attempts),
            initial_backoff: Duration::from_millis(env_or(
                "COINGECKO_INITIAL_BACKOFF_MS",
                defaults.retry.initial_backoff.as_millis() as u64,
            )),
            ..defaults.retry.clone()
        };

        Self {
            api_url: env::var("COINGECKO_API_URL").unwrap_or(defaults.api_url),
            api_key: env::var("COINGECKO_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            vs_currency: env::var("COINGECKO_VS_CURRENCY").unwrap_or(defaults.vs_currency),
            requests_per_minute: env_or(
                "RATE_LIMIT_REQUESTS_PER_MINUTE",
                defaults.requests_per_minute,
            ),
            max_queue_wait: Duration::from_secs(env_or(
                "COINGECKO_MAX_QUEUE_WAIT_SECONDS",
                defaults.max_queue_wait.as_secs(),
            )),
            request_timeout: Duration::from_secs(env_or(
                "COINGECKO_TIMEOUT_SECONDS",
                defaults.request_timeout.as_secs(),
            )),
            retry,
        }
    }
}
