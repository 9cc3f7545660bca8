//! Running search statistics shared across orchestration runs.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::{AdapterOutcome, AdapterReport, AdapterStatus};

#[derive(Debug, Default, Clone)]
struct AdapterCounters {
    attempts: u64,
    successes: u64,
    skipped: u64,
    total_ms: u64,
}

#[derive(Debug, Default)]
struct Counters {
    total_searches: u64,
    successful_searches: u64,
    total_ms: u64,
    adapters: HashMap<String, AdapterCounters>,
}

/// Process-wide running aggregate of search performance.
///
/// Owned by whoever constructs the [`Orchestrator`](crate::Orchestrator) and
/// passed in, so tests can use a fresh instance. Updated once per run, after
/// its outcomes are known. Informational only: nothing reads it back into
/// scoring.
#[derive(Debug, Default)]
pub struct SearchStatistics {
    inner: Mutex<Counters>,
}

/// Per-adapter view of the statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterStatistics {
    pub attempts: u64,
    pub successes: u64,
    /// Runs in which the adapter was selected but unavailable.
    pub skipped: u64,
    pub success_rate: f64,
    pub average_ms: f64,
}

/// Point-in-time copy of [`SearchStatistics`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsSnapshot {
    pub total_searches: u64,
    pub successful_searches: u64,
    pub failed_searches: u64,
    pub success_rate: f64,
    pub average_response_time_ms: f64,
    pub per_adapter: BTreeMap<String, AdapterStatistics>,
}

impl SearchStatistics {
    /// Creates an empty aggregate.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Counters> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Folds one completed run into the aggregate.
    ///
    /// `skipped` lists adapters that were selected but never attempted.
    pub fn record_run(
        &self,
        outcomes: &[AdapterOutcome],
        skipped: &[AdapterReport],
        succeeded: bool,
        elapsed_ms: u64,
    ) {
        let mut counters = self.lock();
        counters.total_searches += 1;
        counters.total_ms += elapsed_ms;
        if succeeded {
            counters.successful_searches += 1;
        }

        for outcome in outcomes {
            let entry = counters.adapters.entry(outcome.adapter_id.clone()).or_default();
            entry.attempts += 1;
            entry.total_ms += outcome.elapsed_ms;
            if outcome.status == AdapterStatus::Success {
                entry.successes += 1;
            }
        }

        for report in skipped {
            counters
                .adapters
                .entry(report.adapter_id.clone())
                .or_default()
                .skipped += 1;
        }
    }

    /// Records a run abandoned before any outcome was known.
    pub fn record_abandoned(&self, elapsed_ms: u64) {
        self.record_run(&[], &[], false, elapsed_ms);
    }

    /// Returns a consistent copy of the current aggregate.
    pub fn snapshot(&self) -> StatisticsSnapshot {
        let counters = self.lock();
        let total = counters.total_searches;

        let per_adapter = counters
            .adapters
            .iter()
            .map(|(id, c)| {
                let stats = AdapterStatistics {
                    attempts: c.attempts,
                    successes: c.successes,
                    skipped: c.skipped,
                    success_rate: ratio(c.successes as f64, c.attempts),
                    average_ms: ratio(c.total_ms as f64, c.attempts),
                };
                (id.clone(), stats)
            })
            .collect();

        StatisticsSnapshot {
            total_searches: total,
            successful_searches: counters.successful_searches,
            failed_searches: total - counters.successful_searches,
            success_rate: ratio(counters.successful_searches as f64, total),
            average_response_time_ms: ratio(counters.total_ms as f64, total),
            per_adapter,
        }
    }

    /// Clears all counters.
    pub fn reset(&self) {
        *self.lock() = Counters::default();
    }
}

fn ratio(value: f64, count: u64) -> f64 {
    if count == 0 {
        0.0
    } else {
        value / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_empty_snapshot() {
        let stats = SearchStatistics::new();
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.total_searches, 0);
        assert_eq!(snapshot.success_rate, 0.0);
        assert_eq!(snapshot.average_response_time_ms, 0.0);
        assert!(snapshot.per_adapter.is_empty());
    }

    #[test]
    fn test_record_run() {
        let stats = SearchStatistics::new();
        let outcomes = vec![
            AdapterOutcome::success("a", vec![], 100),
            AdapterOutcome::failure("b", AdapterStatus::Timeout, 300, "deadline"),
        ];
        stats.record_run(&outcomes, &[AdapterReport::skipped("c", "no key")], true, 320);
        stats.record_run(&[AdapterOutcome::success("a", vec![], 200)], &[], true, 200);
        stats.record_abandoned(80);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.total_searches, 3);
        assert_eq!(snapshot.successful_searches, 2);
        assert_eq!(snapshot.failed_searches, 1);
        assert!((snapshot.success_rate - 2.0 / 3.0).abs() < 1e-9);
        assert!((snapshot.average_response_time_ms - 200.0).abs() < 1e-9);

        let a = &snapshot.per_adapter["a"];
        assert_eq!(a.attempts, 2);
        assert_eq!(a.successes, 2);
        assert_eq!(a.average_ms, 150.0);
        assert_eq!(a.success_rate, 1.0);

        let b = &snapshot.per_adapter["b"];
        assert_eq!(b.attempts, 1);
        assert_eq!(b.successes, 0);
        assert_eq!(b.success_rate, 0.0);

        let c = &snapshot.per_adapter["c"];
        assert_eq!(c.attempts, 0);
        assert_eq!(c.skipped, 1);
        assert_eq!(c.average_ms, 0.0);
    }

    #[test]
    fn test_reset() {
        let stats = SearchStatistics::new();
        stats.record_run(&[AdapterOutcome::success("a", vec![], 10)], &[], true, 10);
        stats.reset();
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.total_searches, 0);
        assert!(snapshot.per_adapter.is_empty());
    }

    #[test]
    fn test_concurrent_updates() {
        let stats = Arc::new(SearchStatistics::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let stats = Arc::clone(&stats);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        stats.record_run(&[AdapterOutcome::success("a", vec![], 1)], &[], true, 1);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.total_searches, 800);
        assert_eq!(snapshot.per_adapter["a"].attempts, 800);
    }

    #[test]
    fn test_snapshot_serialization() {
        let stats = SearchStatistics::new();
        stats.record_run(&[AdapterOutcome::success("ddg", vec![], 10)], &[], true, 10);
        let json = serde_json::to_string(&stats.snapshot()).unwrap();
        assert!(json.contains("\"total_searches\":1"));
        assert!(json.contains("\"ddg\""));
    }
}
