//! Bing adapter.
//!
//! Uses the Bing Web Search v7 API when a subscription key is configured and
//! scrapes bing.com otherwise.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use scraper::Html;
use serde::Deserialize;
use tracing::debug;

use super::google::read_env;
use super::{clean_text, selector};
use crate::fetcher::PageFetcher;
use crate::fetcher_http::{build_client, check_status, HttpFetcher};
use crate::{AdapterConfig, AdapterKind, Result, SearchAdapter, SearchError, SearchResult};

/// Environment variable holding the subscription key.
pub const API_KEY_ENV: &str = "BING_SEARCH_API_KEY";

const ENDPOINT: &str = "https://api.bing.microsoft.com/v7.0/search";
const MAX_LIMIT: usize = 50;

enum Backend {
    Api { client: Client, api_key: String },
    Scraper(Arc<dyn PageFetcher>),
}

/// Bing search adapter.
pub struct Bing {
    config: AdapterConfig,
    backend: Backend,
}

impl Bing {
    /// Creates an API adapter with an explicit subscription key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            config: Self::default_config(AdapterKind::Api),
            backend: Backend::Api {
                client: build_client(),
                api_key: api_key.into(),
            },
        }
    }

    /// Creates an adapter from `BING_SEARCH_API_KEY`, scraping when it is unset.
    pub fn from_env() -> Self {
        Self::from_key(read_env(API_KEY_ENV))
    }

    fn from_key(api_key: Option<String>) -> Self {
        match api_key {
            Some(api_key) => Self::new(api_key),
            None => {
                debug!("{} not set, Bing falls back to scraping", API_KEY_ENV);
                Self::scraper()
            }
        }
    }

    /// Creates the keyless variant that scrapes bing.com with reqwest.
    pub fn scraper() -> Self {
        Self::with_fetcher(Arc::new(HttpFetcher::new()))
    }

    /// Creates a keyless variant that fetches the results page with a custom fetcher.
    pub fn with_fetcher(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            config: Self::default_config(AdapterKind::Scraper),
            backend: Backend::Scraper(fetcher),
        }
    }

    fn default_config(kind: AdapterKind) -> AdapterConfig {
        AdapterConfig {
            name: "Bing".to_string(),
            identifier: "bing".to_string(),
            kind,
            enabled: true,
        }
    }

    /// Creates with custom configuration.
    pub fn with_config(mut self, config: AdapterConfig) -> Self {
        self.config = config;
        self
    }

    fn search_url(query: &str, limit: usize) -> String {
        format!(
            "https://www.bing.com/search?q={}&count={}",
            urlencoding::encode(query),
            limit
        )
    }

    fn parse_response(&self, body: &str, limit: usize) -> Result<Vec<SearchResult>> {
        let response: BingResponse = serde_json::from_str(body)
            .map_err(|e| SearchError::adapter(self.identifier(), format!("invalid response: {}", e)))?;

        Ok(response
            .web_pages
            .map(|pages| pages.value)
            .unwrap_or_default()
            .into_iter()
            .filter(|page| !page.url.is_empty())
            .take(limit)
            .enumerate()
            .map(|(i, page)| {
                SearchResult::new(
                    clean_text(&page.name),
                    page.url,
                    clean_text(&page.snippet),
                    self.identifier(),
                    i as u32 + 1,
                )
            })
            .collect())
    }
}

#[derive(Deserialize)]
struct BingResponse {
    #[serde(rename = "webPages")]
    web_pages: Option<BingWebPages>,
}

#[derive(Deserialize)]
struct BingWebPages {
    #[serde(default)]
    value: Vec<BingPage>,
}

#[derive(Deserialize)]
struct BingPage {
    #[serde(default)]
    name: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    snippet: String,
}

#[async_trait]
impl SearchAdapter for Bing {
    fn config(&self) -> &AdapterConfig {
        &self.config
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        match &self.backend {
            Backend::Api { client, api_key } => {
                let count = limit.clamp(1, MAX_LIMIT).to_string();
                let response = client
                    .get(ENDPOINT)
                    .header("Ocp-Apim-Subscription-Key", api_key)
                    .query(&[
                        ("q", query),
                        ("count", count.as_str()),
                        ("responseFilter", "Webpages"),
                        ("textFormat", "Raw"),
                    ])
                    .send()
                    .await?;
                check_status(ENDPOINT, response.status())?;
                let body = response.text().await?;
                self.parse_response(&body, limit)
            }
            Backend::Scraper(fetcher) => {
                let html = fetcher.fetch(&Self::search_url(query, limit)).await?;
                parse_results_page(&html, self.identifier(), limit)
            }
        }
    }

    fn is_available(&self) -> bool {
        match &self.backend {
            Backend::Api { .. } => self.config.enabled,
            Backend::Scraper(fetcher) => self.config.enabled && fetcher.is_available(),
        }
    }
}

fn parse_results_page(html: &str, adapter_id: &str, limit: usize) -> Result<Vec<SearchResult>> {
    let document = Html::parse_document(html);

    let result_selector = selector("li.b_algo")?;
    let title_selector = selector("h2 a")?;
    let snippet_selector = selector(".b_caption p, .b_algoSlug, p")?;

    let mut results = Vec::new();

    for element in document.select(&result_selector) {
        if results.len() >= limit {
            break;
        }

        let Some(title_elem) = element.select(&title_selector).next() else {
            continue;
        };

        let title = clean_text(&title_elem.text().collect::<String>());
        let url = title_elem
            .value()
            .attr("href")
            .filter(|href| href.starts_with("http://") || href.starts_with("https://"))
            .unwrap_or_default()
            .to_string();
        let snippet = element
            .select(&snippet_selector)
            .next()
            .map(|e| clean_text(&e.text().collect::<String>()))
            .unwrap_or_default();

        if !url.is_empty() && !title.is_empty() {
            let rank = results.len() as u32 + 1;
            results.push(SearchResult::new(title, url, snippet, adapter_id, rank));
        }
    }

    Ok(results)
}
