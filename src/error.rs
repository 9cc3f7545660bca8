//! Error types for the meta search engine.

use thiserror::Error;

use crate::result::{AdapterReport, AdapterStatus};

/// Result type alias for search operations.
pub type Result<T> = std::result::Result<T, SearchError>;

/// Errors that can occur during search operations.
#[derive(Error, Debug)]
pub enum SearchError {
    /// URL could not be canonicalized.
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Adapter call exceeded its deadline.
    #[error("Adapter timed out: {0}")]
    AdapterTimeout(String),

    /// Provider refused the request because of rate limiting.
    #[error("Rate limited: {0}")]
    AdapterRateLimited(String),

    /// Adapter cannot run in this environment (missing key or binary).
    #[error("Adapter unavailable: {0}")]
    AdapterUnavailable(String),

    /// Adapter-internal failure.
    #[error("Adapter '{adapter}' failed: {detail}")]
    AdapterError { adapter: String, detail: String },

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider answered with a non-success HTTP status.
    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// External process could not be run or exited unsuccessfully.
    #[error("Process error: {0}")]
    Process(String),

    /// Invalid query.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Invalid search configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// No adapter registered under this identifier.
    #[error("Unknown adapter '{0}'")]
    UnknownAdapter(String),

    /// Configuration selected no adapters at all.
    #[error("No search adapters selected")]
    NoAdapters,

    /// Caller-supplied overall deadline exceeded.
    #[error("Search timeout exceeded")]
    Timeout,

    /// Every selected adapter failed or was unavailable.
    #[error("All adapters failed: {}", summarize(.reports))]
    AllAdaptersFailed { reports: Vec<AdapterReport> },
}

impl SearchError {
    pub(crate) fn adapter(adapter: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::AdapterError {
            adapter: adapter.into(),
            detail: detail.into(),
        }
    }

    /// Classifies an adapter failure into the status recorded for it.
    pub fn status(&self) -> AdapterStatus {
        match self {
            Self::AdapterTimeout(_) | Self::Timeout => AdapterStatus::Timeout,
            Self::AdapterRateLimited(_) => AdapterStatus::RateLimited,
            Self::AdapterUnavailable(_) => AdapterStatus::Unavailable,
            Self::Http(e) if e.is_timeout() => AdapterStatus::Timeout,
            Self::Http(e) if e.status() == Some(reqwest::StatusCode::TOO_MANY_REQUESTS) => {
                AdapterStatus::RateLimited
            }
            _ => AdapterStatus::Error,
        }
    }
}

fn summarize(reports: &[AdapterReport]) -> String {
    if reports.is_empty() {
        return "no adapters attempted".to_string();
    }
    reports
        .iter()
        .map(|r| match &r.error {
            Some(detail) => format!("{} ({}): {}", r.adapter_id, r.status, detail),
            None => format!("{} ({})", r.adapter_id, r.status),
        })
        .collect::<Vec<_>>()
        .join("; ")
}
