//! # a3s-metasearch
//!
//! A meta search orchestration library.
//!
//! One query is dispatched to several independent search adapters, with
//! support for:
//!
//! - Parallel, sequential and adaptive dispatch strategies
//! - Per-adapter timeouts and failure isolation
//! - URL canonicalization and deduplication
//! - Deterministic score-based ranking
//! - Running per-adapter statistics
//!
//! ## Example
//!
//! ```rust,no_run
//! use a3s_metasearch::{AdapterRegistry, Orchestrator, SearchConfig, SearchStrategy};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let orchestrator = Orchestrator::new(AdapterRegistry::with_defaults());
//!     let config = SearchConfig::new().with_preferred_adapters(["duckduckgo", "wikipedia"]);
//!
//!     let response = orchestrator
//!         .search("rust programming", SearchStrategy::Parallel, &config)
//!         .await?;
//!
//!     for result in response.items() {
//!         println!("{}: {}", result.title, result.canonical_url);
//!     }
//!     Ok(())
//! }
//! ```

mod adapter;
mod canonical;
mod config;
mod error;
mod fetcher;
mod fetcher_http;
mod fetcher_shell;
mod merger;
mod orchestrator;
mod result;

pub mod adapters;
pub mod registry;
pub mod stats;

pub use adapter::{AdapterConfig, AdapterKind, SearchAdapter};
pub use canonical::{are_equivalent, canonicalize, TRACKING_PARAMS};
pub use config::{SearchConfig, SearchStrategy};
pub use error::{Result, SearchError};
pub use fetcher::PageFetcher;
pub use fetcher_http::HttpFetcher;
pub use fetcher_shell::{ShellClient, ShellFetcher};
pub use merger::{MergeOutput, Merger};
pub use orchestrator::{quick_search, research_search, Orchestrator};
pub use registry::AdapterRegistry;
pub use result::{
    AdapterOutcome, AdapterReport, AdapterStatus, MergedResult, SearchResponse, SearchResult,
};
pub use stats::{AdapterStatistics, SearchStatistics, StatisticsSnapshot};
