//! Sliding-window admission gate for LLM calls.
//!
//! The limiter remembers when each admitted call happened. A new call is
//! admitted once fewer than `requests_per_period` of those timestamps fall
//! within the trailing `period`; otherwise the caller sleeps until the
//! oldest one leaves the window.
//!
//! The window is half-open: a timestamp exactly `period` old no longer
//! counts. The timestamp queue sits behind an async mutex that is held
//! while waiting, so concurrent callers are admitted one at a time.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, instrument};

use crate::config::RateLimitConfig;

#[derive(Debug)]
pub struct RateLimiter {
    requests_per_period: usize,
    period: Duration,
    request_times: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// A limit of zero requests is treated as one.
    pub fn new(requests_per_period: usize, period: Duration) -> Self {
        Self {
            requests_per_period: requests_per_period.max(1),
            period,
            request_times: Mutex::new(VecDeque::new()),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.requests_per_period, config.period())
    }

    /// Wait until a call may proceed, then record it.
    #[instrument(level = "debug", skip(self))]
    pub async fn acquire(&self) {
        let mut times = self.request_times.lock().await;

        loop {
            let now = Instant::now();
            while times
                .front()
                .is_some_and(|&oldest| now.duration_since(oldest) >= self.period)
            {
                times.pop_front();
            }

            if times.len() < self.requests_per_period {
                break;
            }

            // Window is full, so it has a head.
            let Some(&oldest) = times.front() else { break };
            let deadline = oldest + self.period;
            debug!(wait = ?deadline.duration_since(now), "Rate limit reached; waiting");
            sleep_until(deadline).await;
        }

        times.push_back(Instant::now());
    }
}
