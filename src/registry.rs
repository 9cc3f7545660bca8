//! Adapter registry and factory.

use std::sync::Arc;

use tracing::debug;

use crate::adapters::{Bing, DuckDuckGo, Google, Wikipedia};
use crate::{Result, SearchAdapter, SearchError};

/// Identifiers of every built-in adapter, in registration order.
pub const BUILTIN_ADAPTERS: &[&str] = &["duckduckgo", "lynx", "curl", "google", "bing", "wikipedia"];

/// Maps a user-facing alias to its canonical adapter identifier.
///
/// Unknown names are returned unchanged.
pub fn canonical_identifier(name: &str) -> &str {
    match name {
        "ddg" => "duckduckgo",
        "g" => "google",
        "wiki" => "wikipedia",
        other => other,
    }
}

/// Constructs a built-in adapter by identifier or alias.
///
/// API adapters read their keys from the environment.
pub fn create(name: &str) -> Result<Arc<dyn SearchAdapter>> {
    let adapter: Arc<dyn SearchAdapter> = match canonical_identifier(name) {
        "duckduckgo" => Arc::new(DuckDuckGo::new()),
        "lynx" => Arc::new(DuckDuckGo::lynx()),
        "curl" => Arc::new(DuckDuckGo::curl()),
        "google" => Arc::new(Google::from_env()),
        "bing" => Arc::new(Bing::from_env()),
        "wikipedia" => Arc::new(Wikipedia::new()),
        _ => return Err(SearchError::UnknownAdapter(name.to_string())),
    };
    Ok(adapter)
}

/// Adapters available to an orchestrator, looked up by identifier.
///
/// Registration order is kept; registering an identifier twice replaces the
/// earlier adapter in place.
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: Vec<Arc<dyn SearchAdapter>>,
}

impl AdapterRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every built-in adapter.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for id in BUILTIN_ADAPTERS {
            match create(id) {
                Ok(adapter) => registry.register_arc(adapter),
                Err(e) => debug!("Skipping built-in adapter {}: {}", id, e),
            }
        }
        registry
    }

    /// Registers an adapter.
    pub fn register<A: SearchAdapter + 'static>(&mut self, adapter: A) {
        self.register_arc(Arc::new(adapter));
    }

    /// Registers a shared adapter.
    pub fn register_arc(&mut self, adapter: Arc<dyn SearchAdapter>) {
        let id = adapter.identifier().to_string();
        match self.adapters.iter_mut().find(|a| a.identifier() == id) {
            Some(slot) => {
                debug!("Replacing adapter {}", id);
                *slot = adapter;
            }
            None => self.adapters.push(adapter),
        }
    }

    /// Looks up an adapter by identifier or alias.
    pub fn get(&self, name: &str) -> Option<Arc<dyn SearchAdapter>> {
        let direct = self.adapters.iter().find(|a| a.identifier() == name);
        direct
            .or_else(|| {
                let id = canonical_identifier(name);
                self.adapters.iter().find(|a| a.identifier() == id)
            })
            .cloned()
    }

    /// Like [`get`](Self::get), but unknown names are an error.
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn SearchAdapter>> {
        self.get(name)
            .ok_or_else(|| SearchError::UnknownAdapter(name.to_string()))
    }

    /// Returns true if an adapter answers to this identifier or alias.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Identifiers of every registered adapter, in registration order.
    pub fn identifiers(&self) -> Vec<&str> {
        self.adapters.iter().map(|a| a.identifier()).collect()
    }

    /// Identifiers of the adapters whose local availability check passes.
    pub fn available(&self) -> Vec<&str> {
        self.adapters
            .iter()
            .filter(|a| a.is_available())
            .map(|a| a.identifier())
            .collect()
    }

    /// Iterates over registered adapters.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn SearchAdapter>> {
        self.adapters.iter()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AdapterConfig, AdapterKind, SearchResult};
    use async_trait::async_trait;

    struct NamedAdapter {
        config: AdapterConfig,
    }

    impl NamedAdapter {
        fn new(id: &str, enabled: bool) -> Self {
            Self {
                config: AdapterConfig {
                    name: id.to_uppercase(),
                    identifier: id.to_string(),
                    kind: AdapterKind::Api,
                    enabled,
                },
            }
        }
    }

    #[async_trait]
    impl SearchAdapter for NamedAdapter {
        fn config(&self) -> &AdapterConfig {
            &self.config
        }

        async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<SearchResult>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_canonical_identifier() {
        assert_eq!(canonical_identifier("ddg"), "duckduckgo");
        assert_eq!(canonical_identifier("g"), "google");
        assert_eq!(canonical_identifier("wiki"), "wikipedia");
        assert_eq!(canonical_identifier("lynx"), "lynx");
        assert_eq!(canonical_identifier("unknown"), "unknown");
    }

    #[test]
    fn test_create_builtins() {
        for id in BUILTIN_ADAPTERS {
            let adapter = create(id).unwrap();
            assert_eq!(adapter.identifier(), *id);
        }
        assert_eq!(create("ddg").unwrap().identifier(), "duckduckgo");
    }

    #[test]
    fn test_create_unknown() {
        let err = create("altavista").err().unwrap();
        assert!(matches!(err, SearchError::UnknownAdapter(ref id) if id == "altavista"));
    }

    #[test]
    fn test_registry_new_is_empty() {
        let registry = AdapterRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
        assert!(registry.identifiers().is_empty());
    }

    #[test]
    fn test_with_defaults() {
        let registry = AdapterRegistry::with_defaults();
        assert_eq!(registry.identifiers(), BUILTIN_ADAPTERS.to_vec());
        assert!(registry.contains("ddg"));
        assert!(registry.available().contains(&"duckduckgo"));
        assert!(registry.available().contains(&"wikipedia"));
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = AdapterRegistry::new();
        registry.register(NamedAdapter::new("a", true));
        registry.register(NamedAdapter::new("b", true));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.identifiers(), vec!["a", "b"]);
        assert_eq!(registry.get("b").unwrap().name(), "B");
        assert!(registry.get("c").is_none());
    }

    #[test]
    fn test_register_replaces_same_identifier() {
        let mut registry = AdapterRegistry::new();
        registry.register(NamedAdapter::new("a", true));
        registry.register(NamedAdapter::new("b", true));
        registry.register(NamedAdapter::new("a", false));

        assert_eq!(registry.identifiers(), vec!["a", "b"]);
        assert!(!registry.get("a").unwrap().is_available());
    }

    #[test]
    fn test_get_by_alias() {
        let mut registry = AdapterRegistry::new();
        registry.register(NamedAdapter::new("duckduckgo", true));
        assert_eq!(registry.get("ddg").unwrap().identifier(), "duckduckgo");
    }

    #[test]
    fn test_resolve_unknown() {
        let registry = AdapterRegistry::new();
        assert!(matches!(registry.resolve("x"), Err(SearchError::UnknownAdapter(_))));
    }

    #[test]
    fn test_available_filters_disabled() {
        let mut registry = AdapterRegistry::new();
        registry.register(NamedAdapter::new("on", true));
        registry.register(NamedAdapter::new("off", false));
        assert_eq!(registry.available(), vec!["on"]);
        assert_eq!(registry.iter().count(), 2);
    }
}
