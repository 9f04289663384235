//! Client-side request spacing for the CoinGecko API.

use log::debug;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

use crate::coingecko::UpstreamError;

/// Hands out request slots at least `min_interval` apart.
///
/// A caller sleeps until the next free slot and claims it only once it has
/// arrived, so a waiter cancelled mid-sleep leaves no unused slot behind.
/// A caller whose next slot lies beyond `max_wait` from its first attempt is
/// rejected with [`UpstreamError::Throttled`].
pub struct RequestThrottle {
    min_interval: Duration,
    max_wait: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RequestThrottle {
    pub fn new(min_interval: Duration, max_wait: Duration) -> Self {
        Self {
            min_interval,
            max_wait,
            next_slot: Mutex::new(None),
        }
    }

    /// Derives the spacing from a requests-per-minute budget.
    pub fn per_minute(requests_per_minute: u32, max_wait: Duration) -> Self {
        let min_interval = if requests_per_minute == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs(60) / requests_per_minute
        };
        Self::new(min_interval, max_wait)
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Waits for the next slot, or fails if it is too far away.
    pub async fn acquire(&self) -> Result<(), UpstreamError> {
        let deadline = Instant::now() + self.max_wait;

        loop {
            let slot = {
                let mut next_slot = self.next_slot.lock().await;
                let now = Instant::now();
                match *next_slot {
                    Some(slot) if slot > now => {
                        if slot > deadline {
                            return Err(UpstreamError::Throttled(slot - now));
                        }
                        slot
                    }
                    _ => {
                        *next_slot = Some(now + self.min_interval);
                        return Ok(());
                    }
                }
            };

            debug!("Throttling CoinGecko request until {:?}", slot);
            sleep_until(slot).await;
        }
    }
}
