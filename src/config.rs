//! Run configuration loaded from an optional YAML file.
//!
//! Every field has a default, so an empty or missing file yields a working
//! configuration. Command-line flags are applied on top in [`AppConfig::apply_cli`].
//!
//! ```yaml
//! llm:
//!   api_base: https://generativelanguage.googleapis.com/v1beta/openai
//!   model: gemini-2.0-flash
//! rate_limit:
//!   requests_per_period: 1
//!   period_seconds: 10
//! fetch:
//!   max_attempts: 3
//!   timeout_seconds: 30
//! content:
//!   max_chars: 8000
//! calendar:
//!   year: 2024
//!   month: 12
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::cli::Cli;
use crate::error::ConfigError;
use crate::models::CalendarPeriod;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub rate_limit: RateLimitConfig,
    pub fetch: FetchConfig,
    pub content: ContentConfig,
    pub calendar: CalendarPeriod,
}

/// OpenAI-compatible chat-completions endpoint.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_base: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
            model: "gemini-2.0-flash".to_string(),
            api_key: None,
            timeout_seconds: 120,
        }
    }
}

// Keeps the API key out of logs.
impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Negative and NaN clamp to zero, too large or infinite saturates.
/// [`AppConfig::validate`] rejects those values before they get here.
fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value.max(0.0)).unwrap_or(Duration::MAX)
}

/// Sliding-window limit on LLM calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub requests_per_period: usize,
    pub period_seconds: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_period: 1,
            period_seconds: 10.0,
        }
    }
}

impl RateLimitConfig {
    pub fn period(&self) -> Duration {
        seconds(self.period_seconds)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FetchConfig {
    pub max_attempts: u32,
    pub timeout_seconds: u64,
    /// Backoff after failed attempt `n` is `backoff_unit_seconds * 2^n`.
    pub backoff_unit_seconds: f64,
    /// Pause before every article fetch.
    pub request_delay_seconds: f64,
    pub max_redirects: usize,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            timeout_seconds: 30,
            backoff_unit_seconds: 1.0,
            request_delay_seconds: 1.0,
            max_redirects: 10,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn backoff_unit(&self) -> Duration {
        seconds(self.backoff_unit_seconds)
    }

    pub fn request_delay(&self) -> Duration {
        seconds(self.request_delay_seconds)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Hard cut for extracted body text, in characters.
    pub max_chars: usize,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self { max_chars: 8000 }
    }
}

impl AppConfig {
    /// Load configuration from `path`, or defaults when no path is given.
    #[instrument(level = "info")]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            info!("No config file given; using defaults");
            return Ok(Self::default());
        };

        let shown = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: shown.clone(),
            source,
        })?;
        let config = Self::from_yaml(&raw).map_err(|source| ConfigError::Yaml {
            path: shown.clone(),
            source,
        })?;
        config.validate()?;
        info!(path = %shown, "Loaded configuration");
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }

    /// Apply command-line overrides and validate the calendar period.
    pub fn apply_cli(mut self, cli: &Cli) -> Result<Self, ConfigError> {
        if let Some(key) = &cli.api_key {
            self.llm.api_key = Some(key.clone());
        }
        if let Some(model) = &cli.model {
            self.llm.model = model.clone();
        }
        if let Some(api_base) = &cli.api_base {
            self.llm.api_base = api_base.clone();
        }
        let year = cli.year.unwrap_or(self.calendar.year);
        let month = cli.month.unwrap_or(self.calendar.month);
        self.calendar = CalendarPeriod::new(year, month)?;
        self.validate()?;
        Ok(self)
    }

    /// Reject second counts that cannot become a [`Duration`].
    ///
    /// # Returns
    ///
    /// `ConfigError::InvalidDuration` naming the first offending key, for
    /// negative, NaN, infinite or overflowing values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            ("rate_limit.period_seconds", self.rate_limit.period_seconds),
            ("fetch.backoff_unit_seconds", self.fetch.backoff_unit_seconds),
            ("fetch.request_delay_seconds", self.fetch.request_delay_seconds),
        ];
        for (field, value) in checks {
            if Duration::try_from_secs_f64(value).is_err() {
                return Err(ConfigError::InvalidDuration { field, value });
            }
        }
        Ok(())
    }
}
