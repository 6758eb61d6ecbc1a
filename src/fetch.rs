//! Page fetching with exponential backoff retry logic.
//!
//! - [`FetchPage`]: core trait for fetching a page body by URL
//! - [`HttpFetcher`]: `reqwest`-backed implementation with a per-attempt
//!   timeout and transparent redirects
//! - [`RetryFetch`]: decorator that retries any [`FetchPage`]
//!
//! # Retry Strategy
//!
//! Attempt `n` (0-based) that fails sleeps `unit * 2^n` before attempt
//! `n + 1`: 1, 2, 4 units and so on. No jitter is added, so the schedule is
//! reproducible. The last failed attempt does not sleep.

use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::{debug, error, instrument, warn};

use crate::config::FetchConfig;
use crate::error::FetchError;

/// Fetch a page body by URL.
///
/// Implemented by the HTTP fetcher and by decorators such as [`RetryFetch`],
/// so the pipeline can be driven by in-memory pages in tests.
pub trait FetchPage {
    /// Fetch the body of `url` as text.
    ///
    /// # Arguments
    ///
    /// * `url` - Absolute URL of the page
    ///
    /// # Returns
    ///
    /// The decoded body on a 2xx response, or the [`FetchError`] describing
    /// the network, timeout or status failure.
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// HTTP fetcher holding one connection pool for the whole run.
///
/// The pool is released when the fetcher is dropped.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client })
    }
}

impl FetchPage for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let request_error = |source| FetchError::Request {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(request_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response.text().await.map_err(request_error)?;
        debug!(bytes = body.len(), "Fetched page");
        Ok(body)
    }
}

/// Delay after failed attempt `attempt` (0-based): `unit * 2^attempt`.
pub fn backoff_delay(attempt: u32, unit: Duration) -> Duration {
    unit.saturating_mul(2u32.saturating_pow(attempt))
}

/// Fetch `url`, retrying up to `max_attempts` times in total.
///
/// # Arguments
///
/// * `fetcher` - The fetcher each attempt goes through
/// * `url` - Page to fetch
/// * `max_attempts` - Total attempts, including the first (zero counts as one)
/// * `backoff_unit` - Base delay; failed attempt `n` waits `unit * 2^n`
///
/// # Returns
///
/// The body from the first successful attempt, or [`FetchError::Exhausted`]
/// carrying the last failure once every attempt has failed.
#[instrument(level = "info", skip(fetcher, backoff_unit))]
pub async fn fetch_with_retry<F: FetchPage>(
    fetcher: &F,
    url: &str,
    max_attempts: u32,
    backoff_unit: Duration,
) -> Result<String, FetchError> {
    let max_attempts = max_attempts.max(1);
    let total_t0 = Instant::now();
    let mut attempt = 0u32;

    loop {
        match fetcher.fetch(url).await {
            Ok(body) => return Ok(body),
            Err(e) => {
                let elapsed_ms_total = total_t0.elapsed().as_millis();

                if attempt + 1 >= max_attempts {
                    error!(
                        attempts = max_attempts,
                        elapsed_ms_total,
                        error = %e,
                        "fetch exhausted retries"
                    );
                    return Err(FetchError::Exhausted {
                        url: url.to_string(),
                        attempts: max_attempts,
                        source: Box::new(e),
                    });
                }

                let delay = backoff_delay(attempt, backoff_unit);
                warn!(
                    attempt,
                    max = max_attempts,
                    elapsed_ms_total,
                    ?delay,
                    error = %e,
                    "fetch attempt failed; backing off"
                );
                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// Decorator adding [`fetch_with_retry`] to any [`FetchPage`].
#[derive(Debug, Clone)]
pub struct RetryFetch<T> {
    inner: T,
    max_attempts: u32,
    backoff_unit: Duration,
}

impl<T: FetchPage> RetryFetch<T> {
    pub fn new(inner: T, max_attempts: u32, backoff_unit: Duration) -> Self {
        Self {
            inner,
            max_attempts,
            backoff_unit,
        }
    }

    pub fn from_config(inner: T, config: &FetchConfig) -> Self {
        Self::new(inner, config.max_attempts, config.backoff_unit())
    }
}

impl<T: FetchPage> FetchPage for RetryFetch<T> {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        fetch_with_retry(&self.inner, url, self.max_attempts, self.backoff_unit).await
    }
}
