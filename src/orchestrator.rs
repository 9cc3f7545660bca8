//! Search orchestration across adapters.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::stats::{SearchStatistics, StatisticsSnapshot};
use crate::{
    AdapterOutcome, AdapterRegistry, AdapterReport, AdapterStatus, Merger, Result, SearchAdapter,
    SearchConfig, SearchError, SearchResponse, SearchStrategy,
};

/// Adapters chosen for one run, split by where the configuration named them.
#[derive(Default)]
struct Selection {
    preferred: Vec<Arc<dyn SearchAdapter>>,
    fallback: Vec<Arc<dyn SearchAdapter>>,
    skipped: Vec<AdapterReport>,
    /// Report keys in configuration order.
    order: Vec<String>,
}

impl Selection {
    fn all(&self) -> Vec<Arc<dyn SearchAdapter>> {
        self.preferred.iter().chain(&self.fallback).cloned().collect()
    }

    fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Meta search orchestrator.
///
/// Dispatches one query to the configured adapters, tolerates individual
/// failures, merges the results and keeps running statistics. `search`
/// takes `&self`, so one orchestrator can serve concurrent callers.
pub struct Orchestrator {
    registry: Arc<AdapterRegistry>,
    merger: Merger,
    stats: Arc<SearchStatistics>,
}

impl Orchestrator {
    /// Creates an orchestrator with fresh statistics.
    pub fn new(registry: AdapterRegistry) -> Self {
        Self::with_statistics(Arc::new(registry), Arc::new(SearchStatistics::new()))
    }

    /// Creates an orchestrator sharing an existing registry and statistics aggregate.
    pub fn with_statistics(registry: Arc<AdapterRegistry>, stats: Arc<SearchStatistics>) -> Self {
        Self {
            registry,
            merger: Merger::new(),
            stats,
        }
    }

    /// Returns the adapter registry.
    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    /// Returns a snapshot of the running statistics.
    pub fn statistics(&self) -> StatisticsSnapshot {
        self.stats.snapshot()
    }

    /// Clears the running statistics.
    pub fn reset_statistics(&self) {
        self.stats.reset();
    }

    /// Runs one search.
    ///
    /// Returns the merged results with a status report for every adapter
    /// that was dispatched or skipped as unavailable. Under the adaptive
    /// strategy, fallback adapters left out of the second wave have no
    /// entry. Fails with [`SearchError::AllAdaptersFailed`] only when no
    /// selected adapter succeeded; a run where adapters succeed with zero
    /// results is not an error.
    pub async fn search(
        &self,
        query: &str,
        strategy: SearchStrategy,
        config: &SearchConfig,
    ) -> Result<SearchResponse> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::InvalidQuery("Query cannot be empty".into()));
        }
        config.validate()?;
        let config = &self.resolve_preferences(config);

        let selection = self.select(config);
        if selection.is_empty() {
            return Err(SearchError::NoAdapters);
        }

        let start = Instant::now();
        debug!(
            "Searching '{}' with {} strategy across {} adapters ({} skipped)",
            query,
            strategy,
            selection.preferred.len() + selection.fallback.len(),
            selection.skipped.len()
        );

        let outcomes = match strategy {
            SearchStrategy::Parallel => run_parallel(&selection.all(), query, config).await,
            SearchStrategy::Sequential => run_sequential(&selection.all(), query, config).await,
            SearchStrategy::Adaptive => self.run_adaptive(&selection, query, config).await,
        };

        let merged = self.merger.merge_and_rank(&outcomes, config);
        let duration_ms = start.elapsed().as_millis() as u64;
        let succeeded = outcomes.iter().any(AdapterOutcome::is_success);

        self.stats
            .record_run(&outcomes, &selection.skipped, succeeded, duration_ms);

        let mut engine_stats: BTreeMap<String, AdapterReport> = selection
            .skipped
            .iter()
            .map(|r| (r.adapter_id.clone(), r.clone()))
            .collect();
        for outcome in &outcomes {
            engine_stats.insert(outcome.adapter_id.clone(), outcome.report());
        }

        if !succeeded {
            let reports = selection
                .order
                .iter()
                .filter_map(|id| engine_stats.remove(id))
                .collect();
            warn!("All adapters failed for '{}'", query);
            return Err(SearchError::AllAdaptersFailed { reports });
        }

        info!(
            "Search '{}' returned {} results from {}/{} adapters in {}ms",
            query,
            merged.results.len(),
            outcomes.iter().filter(|o| o.is_success()).count(),
            outcomes.len(),
            duration_ms
        );

        Ok(SearchResponse {
            results: merged.results,
            engine_stats,
            malformed_urls: merged.malformed_urls,
            duration_ms,
        })
    }

    /// Runs one search under an overall deadline.
    ///
    /// When the deadline expires every in-flight adapter call is cancelled and
    /// the run is recorded as failed.
    pub async fn search_with_deadline(
        &self,
        query: &str,
        strategy: SearchStrategy,
        config: &SearchConfig,
        deadline: Duration,
    ) -> Result<SearchResponse> {
        let start = Instant::now();
        match timeout(deadline, self.search(query, strategy, config)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Search '{}' abandoned after {:?}", query, deadline);
                self.stats
                    .record_abandoned(start.elapsed().as_millis() as u64);
                Err(SearchError::Timeout)
            }
        }
    }

    /// Searches a single adapter, sequentially.
    pub async fn quick_search(&self, query: &str, adapter: &str) -> Result<SearchResponse> {
        let config = SearchConfig::new()
            .with_preferred_adapters([adapter])
            .with_fallback_adapters(Vec::<String>::new());
        self.search(query, SearchStrategy::Sequential, &config).await
    }

    /// Exploratory search over the default adapter lists using the adaptive strategy.
    pub async fn research_search(&self, query: &str, max_results: usize) -> Result<SearchResponse> {
        let config = SearchConfig::new()
            .with_max_total_results(max_results)
            .with_max_results_per_adapter((max_results / 2).max(1));
        self.search(query, SearchStrategy::Adaptive, &config).await
    }

    /// Rewrites `preferred_adapters` so aliases name the adapter they resolve to.
    ///
    /// The merger breaks ties by preference using real adapter identifiers.
    fn resolve_preferences(&self, config: &SearchConfig) -> SearchConfig {
        let preferred: Vec<String> = config
            .preferred_adapters
            .iter()
            .map(|name| match self.registry.get(name) {
                Some(adapter) => adapter.identifier().to_string(),
                None => name.clone(),
            })
            .collect();
        config.clone().with_preferred_adapters(preferred)
    }

    fn select(&self, config: &SearchConfig) -> Selection {
        let mut selection = Selection::default();

        for name in config.selection_order() {
            let from_preferred = config.preference_index(name).is_some();

            let Some(adapter) = self.registry.get(name) else {
                if !selection.order.iter().any(|id| id == name) {
                    warn!("Adapter {} is not registered", name);
                    selection.order.push(name.to_string());
                    selection
                        .skipped
                        .push(AdapterReport::skipped(name, "not registered"));
                }
                continue;
            };

            let id = adapter.identifier().to_string();
            if selection.order.contains(&id) {
                continue;
            }
            selection.order.push(id.clone());

            if !adapter.is_available() {
                warn!("Adapter {} is unavailable, skipping", id);
                selection
                    .skipped
                    .push(AdapterReport::skipped(id, "not available"));
            } else if from_preferred {
                selection.preferred.push(adapter);
            } else {
                selection.fallback.push(adapter);
            }
        }

        selection
    }

    async fn run_adaptive(
        &self,
        selection: &Selection,
        query: &str,
        config: &SearchConfig,
    ) -> Vec<AdapterOutcome> {
        let mut outcomes = run_parallel(&selection.preferred, query, config).await;
        if selection.fallback.is_empty() {
            return outcomes;
        }

        let merged = self.merger.merge_and_rank(&outcomes, config).results.len();
        let floor = config.adaptive_floor();
        let any_failed = outcomes.iter().any(|o| !o.is_success());

        if merged < floor || any_failed {
            debug!(
                "Adaptive second wave: {} merged results (floor {}), preferred failure: {}",
                merged, floor, any_failed
            );
            outcomes.extend(run_parallel(&selection.fallback, query, config).await);
        } else {
            debug!("Adaptive first wave sufficient with {} results", merged);
        }

        outcomes
    }
}

/// Runs every adapter concurrently. Outcomes keep the input order.
async fn run_parallel(
    adapters: &[Arc<dyn SearchAdapter>],
    query: &str,
    config: &SearchConfig,
) -> Vec<AdapterOutcome> {
    join_all(
        adapters
            .iter()
            .map(|adapter| run_adapter(Arc::clone(adapter), query, config)),
    )
    .await
}

async fn run_sequential(
    adapters: &[Arc<dyn SearchAdapter>],
    query: &str,
    config: &SearchConfig,
) -> Vec<AdapterOutcome> {
    let mut outcomes = Vec::with_capacity(adapters.len());
    for adapter in adapters {
        outcomes.push(run_adapter(Arc::clone(adapter), query, config).await);
    }
    outcomes
}

/// Calls one adapter under the per-adapter deadline and classifies the result.
async fn run_adapter(
    adapter: Arc<dyn SearchAdapter>,
    query: &str,
    config: &SearchConfig,
) -> AdapterOutcome {
    let id = adapter.identifier().to_string();
    let limit = config.max_results_per_adapter;
    let started = Instant::now();

    let result = timeout(config.timeout_per_adapter(), adapter.search(query, limit)).await;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match result {
        Ok(Ok(mut results)) => {
            results.truncate(limit);
            debug!("Adapter {} returned {} results in {}ms", id, results.len(), elapsed_ms);
            AdapterOutcome::success(id, results, elapsed_ms)
        }
        Ok(Err(e)) => {
            // Attempted calls never report `unavailable`.
            let status = match e.status() {
                AdapterStatus::Unavailable | AdapterStatus::Success => AdapterStatus::Error,
                status => status,
            };
            warn!("Adapter {} failed: {}", id, e);
            AdapterOutcome::failure(id, status, elapsed_ms, e.to_string())
        }
        Err(_) => {
            warn!("Adapter {} timed out after {}ms", id, config.timeout_ms);
            AdapterOutcome::failure(
                id,
                AdapterStatus::Timeout,
                elapsed_ms,
                format!("no response within {}ms", config.timeout_ms),
            )
        }
    }
}

/// Searches one adapter from the built-in registry.
pub async fn quick_search(query: &str, adapter: &str) -> Result<SearchResponse> {
    Orchestrator::new(AdapterRegistry::with_defaults())
        .quick_search(query, adapter)
        .await
}

/// Adaptive search over the built-in registry with limits derived from `max_results`.
pub async fn research_search(query: &str, max_results: usize) -> Result<SearchResponse> {
    Orchestrator::new(AdapterRegistry::with_defaults())
        .research_search(query, max_results)
        .await
}
