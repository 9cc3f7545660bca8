//! Google adapter.
//!
//! With an API key and a programmable search engine id the adapter queries the
//! Custom Search JSON API. Without them it falls back to scraping the public
//! results page through a [`PageFetcher`].

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use scraper::Html;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::{clean_text, selector};
use crate::fetcher::PageFetcher;
use crate::fetcher_http::{build_client, check_status, HttpFetcher};
use crate::{AdapterConfig, AdapterKind, Result, SearchAdapter, SearchError, SearchResult};

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";
/// Environment variable holding the search engine id.
pub const ENGINE_ID_ENV: &str = "GOOGLE_CSE_ID";

const ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";
/// The API returns at most ten items per request.
const MAX_LIMIT: usize = 10;

enum Backend {
    Api {
        client: Client,
        api_key: String,
        engine_id: String,
    },
    Scraper(Arc<dyn PageFetcher>),
}

/// Google search adapter.
pub struct Google {
    config: AdapterConfig,
    backend: Backend,
}

impl Google {
    /// Creates an API adapter with explicit credentials.
    pub fn new(api_key: impl Into<String>, engine_id: impl Into<String>) -> Self {
        Self {
            config: Self::default_config(AdapterKind::Api),
            backend: Backend::Api {
                client: build_client(),
                api_key: api_key.into(),
                engine_id: engine_id.into(),
            },
        }
    }

    /// Creates an adapter from `GOOGLE_API_KEY` and `GOOGLE_CSE_ID`, scraping
    /// the results page when either is missing.
    pub fn from_env() -> Self {
        Self::from_credentials(read_env(API_KEY_ENV), read_env(ENGINE_ID_ENV))
    }

    fn from_credentials(api_key: Option<String>, engine_id: Option<String>) -> Self {
        match (api_key, engine_id) {
            (Some(api_key), Some(engine_id)) => Self::new(api_key, engine_id),
            _ => {
                debug!("{} / {} not set, Google falls back to scraping", API_KEY_ENV, ENGINE_ID_ENV);
                Self::scraper()
            }
        }
    }

    /// Creates the keyless variant that scrapes google.com with reqwest.
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
            name: "Google".to_string(),
            identifier: "google".to_string(),
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
            "https://www.google.com/search?q={}&num={}&hl=en",
            urlencoding::encode(query),
            limit
        )
    }

    fn parse_response(&self, body: &str, limit: usize) -> Result<Vec<SearchResult>> {
        let response: GoogleResponse = serde_json::from_str(body)
            .map_err(|e| SearchError::adapter(self.identifier(), format!("invalid response: {}", e)))?;

        Ok(response
            .items
            .into_iter()
            .filter(|item| !item.link.is_empty())
            .take(limit)
            .enumerate()
            .map(|(i, item)| {
                SearchResult::new(
                    clean_text(&item.title),
                    item.link,
                    clean_text(&item.snippet),
                    self.identifier(),
                    i as u32 + 1,
                )
            })
            .collect())
    }
}

pub(crate) fn read_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[derive(Deserialize)]
struct GoogleResponse {
    #[serde(default)]
    items: Vec<GoogleItem>,
}

#[derive(Deserialize)]
struct GoogleItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

#[async_trait]
impl SearchAdapter for Google {
    fn config(&self) -> &AdapterConfig {
        &self.config
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        match &self.backend {
            Backend::Api {
                client,
                api_key,
                engine_id,
            } => {
                let num = limit.clamp(1, MAX_LIMIT).to_string();
                let response = client
                    .get(ENDPOINT)
                    .query(&[
                        ("key", api_key.as_str()),
                        ("cx", engine_id.as_str()),
                        ("q", query),
                        ("num", num.as_str()),
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
    if html.contains("/sorry/index") || html.contains("recaptcha") {
        return Err(SearchError::AdapterRateLimited(
            "Google served a CAPTCHA".to_string(),
        ));
    }

    let document = Html::parse_document(html);
    let result_selector = selector("div.g")?;
    let title_selector = selector("h3")?;
    let link_selector = selector("a[href]")?;
    let snippet_selector = selector("div[data-sncf], div.VwiC3b, div.s3v9rd")?;

    let mut results = Vec::new();

    for element in document.select(&result_selector) {
        if results.len() >= limit {
            break;
        }

        let Some(title_elem) = element.select(&title_selector).next() else {
            continue;
        };
        let title = clean_text(&title_elem.text().collect::<String>());

        let url = element
            .select(&link_selector)
            .next()
            .and_then(|a| a.value().attr("href"))
            .and_then(resolve_href)
            .unwrap_or_default();

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

/// Resolves a result link, unwrapping Google's `/url?q=` redirects.
///
/// Other relative links point at Google itself and resolve to `None`.
fn resolve_href(href: &str) -> Option<String> {
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }
    if href.starts_with("/url?") {
        let url = Url::parse("https://www.google.com/").ok()?.join(href).ok()?;
        return url
            .query_pairs()
            .find(|(key, _)| key == "q" || key == "url")
            .map(|(_, value)| value.into_owned())
            .filter(|target| target.starts_with("http"));
    }
    None
}
