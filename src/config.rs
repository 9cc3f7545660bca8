//! Per-run search configuration and dispatch strategy.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Result, SearchError};

/// How adapters are dispatched within one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchStrategy {
    /// All selected adapters concurrently.
    #[default]
    Parallel,
    /// One adapter at a time, preferred adapters first.
    Sequential,
    /// Preferred adapters first, fallback adapters only if they under-deliver.
    Adaptive,
}

impl fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Parallel => "parallel",
            Self::Sequential => "sequential",
            Self::Adaptive => "adaptive",
        };
        f.write_str(s)
    }
}

impl FromStr for SearchStrategy {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "parallel" => Ok(Self::Parallel),
            "sequential" => Ok(Self::Sequential),
            "adaptive" => Ok(Self::Adaptive),
            other => Err(SearchError::Config(format!("unknown strategy '{}'", other))),
        }
    }
}

/// Configuration for one orchestration run.
///
/// Passed by value into [`Orchestrator::search`](crate::Orchestrator::search)
/// and never mutated by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Results requested from each adapter.
    #[serde(default = "default_max_results_per_adapter")]
    pub max_results_per_adapter: usize,
    /// Per-adapter deadline in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Group results by canonical URL.
    #[serde(default = "default_true")]
    pub enable_deduplication: bool,
    /// Sort merged results by score.
    #[serde(default = "default_true")]
    pub enable_ranking: bool,
    /// Adapters run first, in order.
    #[serde(default = "default_preferred_adapters")]
    pub preferred_adapters: Vec<String>,
    /// Adapters run only when the preferred ones under-deliver (adaptive).
    #[serde(default = "default_fallback_adapters")]
    pub fallback_adapters: Vec<String>,
    /// Snippets at least this long (in characters) earn a ranking bonus.
    #[serde(default = "default_min_snippet_length")]
    pub min_snippet_length: usize,
    /// Length cap of the final merged list.
    #[serde(default = "default_max_total_results")]
    pub max_total_results: usize,
}

fn default_max_results_per_adapter() -> usize {
    10
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_true() -> bool {
    true
}

fn default_preferred_adapters() -> Vec<String> {
    vec!["duckduckgo".to_string(), "lynx".to_string(), "curl".to_string()]
}

fn default_fallback_adapters() -> Vec<String> {
    vec!["google".to_string(), "bing".to_string()]
}

fn default_min_snippet_length() -> usize {
    20
}

fn default_max_total_results() -> usize {
    50
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results_per_adapter: default_max_results_per_adapter(),
            timeout_ms: default_timeout_ms(),
            enable_deduplication: true,
            enable_ranking: true,
            preferred_adapters: default_preferred_adapters(),
            fallback_adapters: default_fallback_adapters(),
            min_snippet_length: default_min_snippet_length(),
            max_total_results: default_max_total_results(),
        }
    }
}

impl SearchConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| SearchError::Config(format!("invalid JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| SearchError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    /// Returns the per-adapter deadline.
    pub fn timeout_per_adapter(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Result-count floor below which the adaptive strategy runs its second wave.
    pub fn adaptive_floor(&self) -> usize {
        (self.max_total_results / 2).max(1)
    }

    /// Selection order: preferred adapters, then fallback adapters, without repeats.
    pub fn selection_order(&self) -> Vec<&str> {
        let mut order: Vec<&str> = Vec::new();
        for id in self.preferred_adapters.iter().chain(&self.fallback_adapters) {
            if !order.contains(&id.as_str()) {
                order.push(id.as_str());
            }
        }
        order
    }

    /// Position of an adapter in `preferred_adapters`, used for tie-breaks.
    pub fn preference_index(&self, adapter_id: &str) -> Option<usize> {
        self.preferred_adapters.iter().position(|id| id == adapter_id)
    }

    /// Validates this configuration.
    ///
    /// Checks:
    /// - `max_results_per_adapter` must be greater than 0
    /// - `timeout_ms` must be greater than 0
    /// - `max_total_results` must be greater than 0
    pub fn validate(&self) -> Result<()> {
        if self.max_results_per_adapter == 0 {
            return Err(SearchError::Config(
                "max_results_per_adapter must be greater than 0".into(),
            ));
        }
        if self.timeout_ms == 0 {
            return Err(SearchError::Config("timeout_ms must be greater than 0".into()));
        }
        if self.max_total_results == 0 {
            return Err(SearchError::Config(
                "max_total_results must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Sets the number of results requested per adapter.
    pub fn with_max_results_per_adapter(mut self, max: usize) -> Self {
        self.max_results_per_adapter = max;
        self
    }

    /// Sets the per-adapter deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Enables or disables deduplication.
    pub fn with_deduplication(mut self, enabled: bool) -> Self {
        self.enable_deduplication = enabled;
        self
    }

    /// Enables or disables ranking.
    pub fn with_ranking(mut self, enabled: bool) -> Self {
        self.enable_ranking = enabled;
        self
    }

    /// Sets the preferred adapters.
    pub fn with_preferred_adapters<I, S>(mut self, adapters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preferred_adapters = adapters.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the fallback adapters.
    pub fn with_fallback_adapters<I, S>(mut self, adapters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fallback_adapters = adapters.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the snippet length that earns the ranking bonus.
    pub fn with_min_snippet_length(mut self, len: usize) -> Self {
        self.min_snippet_length = len;
        self
    }

    /// Sets the final result cap.
    pub fn with_max_total_results(mut self, max: usize) -> Self {
        self.max_total_results = max;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SearchConfig::default();
        assert_eq!(config.max_results_per_adapter, 10);
        assert_eq!(config.timeout_per_adapter(), Duration::from_secs(30));
        assert!(config.enable_deduplication);
        assert!(config.enable_ranking);
        assert_eq!(config.preferred_adapters, vec!["duckduckgo", "lynx", "curl"]);
        assert_eq!(config.fallback_adapters, vec!["google", "bing"]);
        assert_eq!(config.min_snippet_length, 20);
        assert_eq!(config.max_total_results, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_chain() {
        let config = SearchConfig::new()
            .with_max_results_per_adapter(5)
            .with_timeout(Duration::from_millis(250))
            .with_deduplication(false)
            .with_ranking(false)
            .with_preferred_adapters(["a", "b"])
            .with_fallback_adapters(["c"])
            .with_min_snippet_length(0)
            .with_max_total_results(7);

        assert_eq!(config.max_results_per_adapter, 5);
        assert_eq!(config.timeout_ms, 250);
        assert!(!config.enable_deduplication);
        assert!(!config.enable_ranking);
        assert_eq!(config.preferred_adapters, vec!["a", "b"]);
        assert_eq!(config.fallback_adapters, vec!["c"]);
        assert_eq!(config.min_snippet_length, 0);
        assert_eq!(config.max_total_results, 7);
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        assert!(SearchConfig::new().with_max_results_per_adapter(0).validate().is_err());
        assert!(SearchConfig::new().with_timeout(Duration::ZERO).validate().is_err());
        assert!(SearchConfig::new().with_max_total_results(0).validate().is_err());
    }

    #[test]
    fn test_adaptive_floor() {
        assert_eq!(SearchConfig::new().adaptive_floor(), 25);
        assert_eq!(SearchConfig::new().with_max_total_results(7).adaptive_floor(), 3);
        assert_eq!(SearchConfig::new().with_max_total_results(1).adaptive_floor(), 1);
    }

    #[test]
    fn test_selection_order_dedups() {
        let config = SearchConfig::new()
            .with_preferred_adapters(["a", "b"])
            .with_fallback_adapters(["b", "c", "a"]);
        assert_eq!(config.selection_order(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_preference_index() {
        let config = SearchConfig::new().with_preferred_adapters(["x", "y"]);
        assert_eq!(config.preference_index("y"), Some(1));
        assert_eq!(config.preference_index("z"), None);
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config = SearchConfig::from_json(r#"{"max_total_results": 5, "preferred_adapters": ["bing"]}"#)
            .unwrap();
        assert_eq!(config.max_total_results, 5);
        assert_eq!(config.preferred_adapters, vec!["bing"]);
        assert_eq!(config.max_results_per_adapter, 10);
        assert_eq!(config.fallback_adapters, vec!["google", "bing"]);
    }

    #[test]
    fn test_from_json_rejects_invalid() {
        assert!(matches!(
            SearchConfig::from_json("{not json"),
            Err(SearchError::Config(_))
        ));
        assert!(matches!(
            SearchConfig::from_json(r#"{"timeout_ms": 0}"#),
            Err(SearchError::Config(_))
        ));
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("parallel".parse::<SearchStrategy>().unwrap(), SearchStrategy::Parallel);
        assert_eq!("SEQUENTIAL".parse::<SearchStrategy>().unwrap(), SearchStrategy::Sequential);
        assert_eq!("Adaptive".parse::<SearchStrategy>().unwrap(), SearchStrategy::Adaptive);
        assert!("random".parse::<SearchStrategy>().is_err());
    }

    #[test]
    fn test_strategy_display_roundtrip() {
        for strategy in [SearchStrategy::Parallel, SearchStrategy::Sequential, SearchStrategy::Adaptive] {
            assert_eq!(strategy.to_string().parse::<SearchStrategy>().unwrap(), strategy);
        }
    }

    #[test]
    fn test_strategy_serialization() {
        assert_eq!(serde_json::to_string(&SearchStrategy::Adaptive).unwrap(), "\"adaptive\"");
    }
}
