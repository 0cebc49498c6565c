//! Retry delays: fixed, or exponential with jitter.

use std::time::Duration;

use rand::Rng;

use crate::config::{BackoffStrategy, RetryConfig};

/// Calculate exponential backoff delay with jitter.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let delay_ms = base_ms.saturating_mul(exponential_base);
    let capped_delay = delay_ms.min(max_ms);

    // Apply jitter (0 to 10% of the delay)
    let jitter_range = capped_delay / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay + jitter)
}

/// Delay policy for one retry loop.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    strategy: BackoffStrategy,
    base_ms: u64,
    max_ms: u64,
}

impl Backoff {
    pub fn new(strategy: BackoffStrategy, base_ms: u64, max_ms: u64) -> Self {
        Self {
            strategy,
            base_ms,
            max_ms: max_ms.max(base_ms),
        }
    }

    pub fn fixed(delay_ms: u64) -> Self {
        Self::new(BackoffStrategy::Fixed, delay_ms, delay_ms)
    }

    /// Policy for a loop whose base delay is `base_ms`.
    pub fn from_config(config: &RetryConfig, base_ms: u64) -> Self {
        Self::new(config.strategy, base_ms, config.max_delay_ms)
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        match self.strategy {
            BackoffStrategy::Fixed => Duration::from_millis(self.base_ms),
            BackoffStrategy::Exponential => calculate_backoff(attempt.max(1), self.base_ms, self.max_ms),
        }
    }

    /// Sleep for the delay that follows `attempt`.
    pub async fn wait(&self, attempt: u32) {
        tokio::time::sleep(self.delay(attempt)).await;
    }
}
