//! Typed errors for each stage of the calendar pipeline.
//!
//! Fatal errors (`ConfigError`, `ParseError`, a `FetchError` on the calendar
//! page) abort the run through [`PipelineError`]. Per-article errors are
//! logged where they happen and never reach the caller.

use thiserror::Error;

/// The calendar page did not contain the structure a parser relies on.
///
/// "Structure found but zero entries" is not an error; parsers return an
/// empty list in that case.
#[derive(Debug, Error)]
#[error("failed to parse {site} calendar page: {reason}")]
pub struct ParseError {
    pub site: &'static str,
    pub reason: String,
}

impl ParseError {
    pub fn new(site: &'static str, reason: impl Into<String>) -> Self {
        Self {
            site,
            reason: reason.into(),
        }
    }
}

/// Network, timeout or non-2xx failure while fetching a page.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} responded with {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("giving up on {url} after {attempts} attempts: {source}")]
    Exhausted {
        url: String,
        attempts: u32,
        #[source]
        source: Box<FetchError>,
    },
}

/// Why a single article could not be classified.
///
/// Only ever logged: `Classifier::classify` converts every variant into the
/// sentinel pair.
#[derive(Debug, Error)]
pub enum ClassificationError {
    #[error("article has no content to analyze")]
    MissingContent,

    #[error("completion request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("completion endpoint responded with {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("completion response was empty")]
    EmptyResponse,

    #[error("completion content is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("completion JSON is missing `{0}`")]
    MissingField(&'static str),
}

impl ClassificationError {
    /// Short, stable label used as a structured log field.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MissingContent => "missing_content",
            Self::Request(_) | Self::Api { .. } => "request_failed",
            Self::EmptyResponse => "empty_response",
            Self::InvalidJson(_) => "invalid_json",
            Self::MissingField(_) => "missing_field",
        }
    }
}

/// Problems with the run's inputs, detected before any network traffic.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid calendar URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported calendar host: {0}")]
    UnsupportedHost(String),

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid calendar period {year}-{month}")]
    InvalidPeriod { year: i32, month: u32 },

    #[error("{field} must be a finite, non-negative number of seconds, got {value}")]
    InvalidDuration { field: &'static str, value: f64 },
}

/// Errors that abort the whole run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("failed to write CSV to {path}: {source}")]
    Output {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}
