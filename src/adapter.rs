//! Search adapter trait and configuration.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Result, SearchResult};

/// How an adapter reaches its provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterKind {
    /// Official JSON API, usually keyed.
    Api,
    /// Scrapes an HTML results page.
    #[default]
    Scraper,
    /// Shells out to an external HTTP client binary.
    Shell,
}

/// Static description of an adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdapterConfig {
    /// Display name (e.g., "DuckDuckGo").
    pub name: String,
    /// Stable identifier used in configuration and statistics (e.g., "duckduckgo").
    pub identifier: String,
    /// Transport variant.
    #[serde(default)]
    pub kind: AdapterKind,
    /// Whether the adapter may be selected at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            identifier: String::new(),
            kind: AdapterKind::Scraper,
            enabled: true,
        }
    }
}

/// Trait implemented by every search provider.
///
/// Adapters are shared across concurrent runs, so `search` must not rely on
/// per-call mutable state. Failures are reported through the typed
/// [`SearchError`](crate::SearchError) variants so the orchestrator can
/// classify them.
#[async_trait]
pub trait SearchAdapter: Send + Sync {
    /// Returns the adapter configuration.
    fn config(&self) -> &AdapterConfig;

    /// Searches the provider, returning at most `limit` results ranked from 1.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>>;

    /// Returns the stable identifier.
    fn identifier(&self) -> &str {
        &self.config().identifier
    }

    /// Returns the display name.
    fn name(&self) -> &str {
        &self.config().name
    }

    /// Returns the transport variant.
    fn kind(&self) -> AdapterKind {
        self.config().kind
    }

    /// Cheap local check (key configured, binary present). Never touches the network.
    fn is_available(&self) -> bool {
        self.config().enabled
    }
}
