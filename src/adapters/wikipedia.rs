//! Wikipedia adapter using the keyless MediaWiki search API.

use async_trait::async_trait;
use reqwest::Client;
use scraper::Html;
use serde::Deserialize;

use super::clean_text;
use crate::fetcher_http::{build_client, check_status};
use crate::{AdapterConfig, AdapterKind, Result, SearchAdapter, SearchError, SearchResult};

/// MediaWiki caps `srlimit` for anonymous clients.
const MAX_LIMIT: usize = 50;

/// Wikipedia search adapter.
pub struct Wikipedia {
    config: AdapterConfig,
    client: Client,
    language: String,
}

impl Wikipedia {
    /// Creates a new Wikipedia adapter for English Wikipedia.
    pub fn new() -> Self {
        Self {
            config: AdapterConfig {
                name: "Wikipedia".to_string(),
                identifier: "wikipedia".to_string(),
                kind: AdapterKind::Api,
                enabled: true,
            },
            client: build_client(),
            language: "en".to_string(),
        }
    }

    /// Sets the Wikipedia language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Creates with custom configuration.
    pub fn with_config(mut self, config: AdapterConfig) -> Self {
        self.config = config;
        self
    }

    fn search_url(&self, query: &str, limit: usize) -> String {
        format!(
            "https://{}.wikipedia.org/w/api.php?action=query&list=search&srsearch={}&format=json&srlimit={}",
            self.language,
            urlencoding::encode(query),
            limit.clamp(1, MAX_LIMIT)
        )
    }

    fn article_url(&self, title: &str) -> String {
        format!(
            "https://{}.wikipedia.org/wiki/{}",
            self.language,
            urlencoding::encode(&title.replace(' ', "_"))
        )
    }

    fn parse_response(&self, body: &str, limit: usize) -> Result<Vec<SearchResult>> {
        let response: WikiResponse = serde_json::from_str(body)
            .map_err(|e| SearchError::adapter(self.identifier(), format!("invalid response: {}", e)))?;

        let results = response
            .query
            .map(|q| {
                q.search
                    .into_iter()
                    .take(limit)
                    .enumerate()
                    .map(|(i, item)| {
                        SearchResult::new(
                            item.title.clone(),
                            self.article_url(&item.title),
                            strip_markup(&item.snippet),
                            self.identifier(),
                            i as u32 + 1,
                        )
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(results)
    }
}

impl Default for Wikipedia {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Deserialize)]
struct WikiResponse {
    query: Option<WikiQuery>,
}

#[derive(Deserialize)]
struct WikiQuery {
    search: Vec<WikiSearchResult>,
}

#[derive(Deserialize)]
struct WikiSearchResult {
    title: String,
    #[serde(default)]
    snippet: String,
}

#[async_trait]
impl SearchAdapter for Wikipedia {
    fn config(&self) -> &AdapterConfig {
        &self.config
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        let url = self.search_url(query, limit);
        let response = self.client.get(&url).send().await?;
        check_status(&url, response.status())?;
        let body = response.text().await?;
        self.parse_response(&body, limit)
    }
}

/// Search snippets carry `<span class="searchmatch">` highlights.
fn strip_markup(snippet: &str) -> String {
    let fragment = Html::parse_fragment(snippet);
    clean_text(&fragment.root_element().text().collect::<String>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AdapterStatus;

    const RESPONSE: &str = r#"{
        "batchcomplete": "",
        "query": {
            "searchinfo": {"totalhits": 3},
            "search": [
                {"ns": 0, "title": "Rust (programming language)", "pageid": 29414838,
                 "snippet": "<span class=\"searchmatch\">Rust</span> is a general-purpose &quot;systems&quot; language"},
                {"ns": 0, "title": "Rust", "pageid": 26477,
                 "snippet": "<span class=\"searchmatch\">Rust</span> is an iron oxide"},
                {"ns": 0, "title": "Rust Belt", "pageid": 26478, "snippet": ""}
            ]
        }
    }"#;

    #[test]
    fn test_wikipedia_new() {
        let adapter = Wikipedia::new();
        assert_eq!(adapter.name(), "Wikipedia");
        assert_eq!(adapter.identifier(), "wikipedia");
        assert_eq!(adapter.kind(), AdapterKind::Api);
        assert!(adapter.is_available());
        assert_eq!(adapter.language, "en");
    }

    #[test]
    fn test_wikipedia_with_language() {
        let adapter = Wikipedia::new().with_language("de");
        assert_eq!(adapter.language, "de");
        assert!(adapter.search_url("rust", 5).starts_with("https://de.wikipedia.org/"));
    }

    #[test]
    fn test_wikipedia_with_config() {
        let adapter = Wikipedia::new().with_config(AdapterConfig {
            name: "Wiki".to_string(),
            identifier: "wiki".to_string(),
            kind: AdapterKind::Api,
            enabled: false,
        });
        assert_eq!(adapter.identifier(), "wiki");
        assert!(!adapter.is_available());
    }

    #[test]
    fn test_search_url_limits() {
        let adapter = Wikipedia::new();
        assert!(adapter.search_url("rust lang", 5).ends_with("srsearch=rust%20lang&format=json&srlimit=5"));
        assert!(adapter.search_url("rust", 500).ends_with("srlimit=50"));
        assert!(adapter.search_url("rust", 0).ends_with("srlimit=1"));
    }

    #[test]
    fn test_article_url() {
        let adapter = Wikipedia::new();
        assert_eq!(
            adapter.article_url("Rust (programming language)"),
            "https://en.wikipedia.org/wiki/Rust_%28programming_language%29"
        );
    }

    #[test]
    fn test_strip_markup() {
        assert_eq!(strip_markup("<b>Hello</b> World"), "Hello World");
        assert_eq!(strip_markup("No tags"), "No tags");
        assert_eq!(strip_markup("<span class=\"searchmatch\">A</span>  &amp; B"), "A & B");
        assert_eq!(strip_markup(""), "");
    }

    #[test]
    fn test_parse_response() {
        let adapter = Wikipedia::new();
        let results = adapter.parse_response(RESPONSE, 10).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].title, "Rust (programming language)");
        assert_eq!(results[0].snippet, "Rust is a general-purpose \"systems\" language");
        assert_eq!(results[0].rank, 1);
        assert_eq!(results[0].source_adapter, "wikipedia");
        assert_eq!(results[1].url, "https://en.wikipedia.org/wiki/Rust");
        assert_eq!(results[2].rank, 3);
        assert_eq!(results[2].snippet, "");
    }

    #[test]
    fn test_parse_response_truncates() {
        let adapter = Wikipedia::new();
        let results = adapter.parse_response(RESPONSE, 2).unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_parse_response_without_query() {
        let adapter = Wikipedia::new();
        let results = adapter.parse_response(r#"{"batchcomplete": ""}"#, 10).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_parse_response_invalid_json() {
        let adapter = Wikipedia::new();
        let err = adapter.parse_response("<html>", 10).unwrap_err();
        assert!(matches!(err, SearchError::AdapterError { ref adapter, .. } if adapter == "wikipedia"));
        assert_eq!(err.status(), AdapterStatus::Error);
    }
}
