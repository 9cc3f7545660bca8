//! Search result types.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single hit returned by one adapter, before merging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Result title.
    pub title: String,
    /// Result URL, exactly as the provider returned it.
    pub url: String,
    /// Result description/snippet. May be empty.
    pub snippet: String,
    /// Identifier of the adapter that produced this result.
    pub source_adapter: String,
    /// 1-based position within the adapter's own result list.
    pub rank: u32,
}

impl SearchResult {
    /// Creates a new search result.
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        snippet: impl Into<String>,
        source_adapter: impl Into<String>,
        rank: u32,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            snippet: snippet.into(),
            source_adapter: source_adapter.into(),
            rank,
        }
    }
}

/// One entry of the final, merged response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedResult {
    /// Canonical form of the URL, unique within one deduplicated response.
    pub canonical_url: String,
    /// Title taken from the best-ranked constituent.
    pub title: String,
    /// Snippet taken from the best-ranked constituent.
    pub snippet: String,
    /// Every adapter that independently returned this URL.
    pub source_adapters: BTreeSet<String>,
    /// Smallest rank across constituents.
    pub first_seen_rank: u32,
    /// Ranking score.
    pub score: i64,
}

/// Terminal status of one adapter within one orchestration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterStatus {
    Success,
    Timeout,
    Error,
    RateLimited,
    /// Never attempted: `is_available()` was false or the adapter is not registered.
    Unavailable,
}

impl AdapterStatus {
    /// Returns true for statuses that count as an attempted-but-failed call.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Timeout | Self::Error | Self::RateLimited)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Timeout => "timeout",
            Self::Error => "error",
            Self::RateLimited => "rate_limited",
            Self::Unavailable => "unavailable",
        }
    }
}

impl fmt::Display for AdapterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The result of attempting one adapter in one orchestration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdapterOutcome {
    pub adapter_id: String,
    pub status: AdapterStatus,
    /// Empty unless `status` is `Success`.
    pub results: Vec<SearchResult>,
    pub elapsed_ms: u64,
    /// Present only on non-success.
    pub error_detail: Option<String>,
}

impl AdapterOutcome {
    /// Creates a successful outcome.
    pub fn success(adapter_id: impl Into<String>, results: Vec<SearchResult>, elapsed_ms: u64) -> Self {
        Self {
            adapter_id: adapter_id.into(),
            status: AdapterStatus::Success,
            results,
            elapsed_ms,
            error_detail: None,
        }
    }

    /// Creates a failed outcome. Results are always empty.
    pub fn failure(
        adapter_id: impl Into<String>,
        status: AdapterStatus,
        elapsed_ms: u64,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            adapter_id: adapter_id.into(),
            status,
            results: Vec::new(),
            elapsed_ms,
            error_detail: Some(detail.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == AdapterStatus::Success
    }

    /// Condenses this outcome into its status report entry.
    pub fn report(&self) -> AdapterReport {
        AdapterReport {
            adapter_id: self.adapter_id.clone(),
            status: self.status,
            result_count: self.results.len(),
            elapsed_ms: self.elapsed_ms,
            error: self.error_detail.clone(),
        }
    }
}

/// Per-adapter entry of the status report returned with every search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterReport {
    pub adapter_id: String,
    pub status: AdapterStatus,
    pub result_count: usize,
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AdapterReport {
    /// Report entry for an adapter that was never attempted.
    pub fn skipped(adapter_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            adapter_id: adapter_id.into(),
            status: AdapterStatus::Unavailable,
            result_count: 0,
            elapsed_ms: 0,
            error: Some(reason.into()),
        }
    }

    /// Report entry for an attempted call that failed.
    pub fn failed(
        adapter_id: impl Into<String>,
        status: AdapterStatus,
        elapsed_ms: u64,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            adapter_id: adapter_id.into(),
            status,
            result_count: 0,
            elapsed_ms,
            error: Some(detail.into()),
        }
    }
}

/// Response of one orchestration run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Ranked, deduplicated results.
    pub results: Vec<MergedResult>,
    /// Status of every adapter that was dispatched or skipped as unavailable,
    /// keyed by identifier. Adaptive fallbacks that never ran have no entry.
    pub engine_stats: BTreeMap<String, AdapterReport>,
    /// Raw results dropped because their URL could not be canonicalized.
    pub malformed_urls: usize,
    /// Wall-clock duration of the run in milliseconds.
    pub duration_ms: u64,
}

impl SearchResponse {
    /// Returns the merged results.
    pub fn items(&self) -> &[MergedResult] {
        &self.results
    }

    /// Returns the status report entry for one adapter.
    pub fn report(&self, adapter_id: &str) -> Option<&AdapterReport> {
        self.engine_stats.get(adapter_id)
    }

    /// Number of adapters that returned results successfully.
    pub fn succeeded(&self) -> usize {
        self.engine_stats
            .values()
            .filter(|r| r.status == AdapterStatus::Success)
            .count()
    }
}
