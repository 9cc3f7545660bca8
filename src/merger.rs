//! Result deduplication and ranking.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::canonical::canonicalize;
use crate::{AdapterOutcome, MergedResult, SearchConfig, SearchResult};

/// Points per contributing adapter.
const SOURCE_WEIGHT: i64 = 10;
/// Bonus for a snippet of at least `min_snippet_length` characters.
const SNIPPET_BONUS: i64 = 2;

/// Output of one merge pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutput {
    /// Merged results, ranked and truncated.
    pub results: Vec<MergedResult>,
    /// Raw results dropped because their URL failed canonicalization.
    pub malformed_urls: usize,
}

/// Deduplicates and ranks raw results from multiple adapters.
///
/// Pure with respect to its inputs: the same outcomes and configuration
/// always produce the same ordering.
#[derive(Debug, Default, Clone, Copy)]
pub struct Merger;

struct Group<'a> {
    canonical_url: String,
    members: Vec<(&'a str, &'a SearchResult)>,
}

impl Merger {
    /// Creates a new merger.
    pub fn new() -> Self {
        Self
    }

    /// Merges the successful outcomes into one ranked list.
    ///
    /// This performs:
    /// 1. Canonicalization of every URL (failures are counted and dropped)
    /// 2. Grouping by canonical URL, unless deduplication is disabled
    /// 3. Selection of title and snippet from the best-ranked constituent
    /// 4. Scoring: `sources * 10 - first_seen_rank + snippet bonus`
    /// 5. Stable sort by score, if ranking is enabled
    /// 6. Truncation to `max_total_results`
    pub fn merge_and_rank(&self, outcomes: &[AdapterOutcome], config: &SearchConfig) -> MergeOutput {
        let mut groups: Vec<Group<'_>> = Vec::new();
        let mut by_url: HashMap<String, usize> = HashMap::new();
        let mut malformed_urls = 0;

        for outcome in outcomes.iter().filter(|o| o.is_success()) {
            for result in &outcome.results {
                let canonical_url = match canonicalize(&result.url) {
                    Ok(url) => url,
                    Err(e) => {
                        debug!("Dropping result from {}: {}", outcome.adapter_id, e);
                        malformed_urls += 1;
                        continue;
                    }
                };

                let member = (outcome.adapter_id.as_str(), result);
                if config.enable_deduplication {
                    if let Some(&index) = by_url.get(&canonical_url) {
                        groups[index].members.push(member);
                        continue;
                    }
                    by_url.insert(canonical_url.clone(), groups.len());
                }
                groups.push(Group {
                    canonical_url,
                    members: vec![member],
                });
            }
        }

        let mut results: Vec<MergedResult> = groups
            .into_iter()
            .filter_map(|group| build_merged(group, config))
            .collect();

        if config.enable_ranking {
            results.sort_by(|a, b| b.score.cmp(&a.score));
        }
        results.truncate(config.max_total_results);

        MergeOutput {
            results,
            malformed_urls,
        }
    }
}

fn build_merged(group: Group<'_>, config: &SearchConfig) -> Option<MergedResult> {
    let (_, best) = group.members.iter().copied().min_by(|a, b| {
        let key = |(adapter, result): (&str, &SearchResult)| {
            (
                result.rank,
                config.preference_index(adapter).unwrap_or(usize::MAX),
                adapter.to_string(),
            )
        };
        key(*a).cmp(&key(*b))
    })?;

    let source_adapters: BTreeSet<String> = group
        .members
        .iter()
        .map(|(adapter, _)| adapter.to_string())
        .collect();

    let first_seen_rank = best.rank;
    let score = score(source_adapters.len(), first_seen_rank, &best.snippet, config);

    Some(MergedResult {
        canonical_url: group.canonical_url,
        title: best.title.clone(),
        snippet: best.snippet.clone(),
        source_adapters,
        first_seen_rank,
        score,
    })
}

/// Calculates the ranking score of a merged result.
///
/// URLs found by more adapters, and found earlier by any one of them, score higher.
pub fn score(sources: usize, first_seen_rank: u32, snippet: &str, config: &SearchConfig) -> i64 {
    let bonus = if snippet.chars().count() >= config.min_snippet_length {
        SNIPPET_BONUS
    } else {
        0
    };
    sources as i64 * SOURCE_WEIGHT - i64::from(first_seen_rank) + bonus
}
