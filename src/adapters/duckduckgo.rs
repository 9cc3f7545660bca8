//! DuckDuckGo HTML results adapter.
//!
//! The same results page is reachable three ways: through reqwest (the
//! `duckduckgo` scraper), or by shelling out to `curl` or `lynx`. Only the
//! fetcher differs; parsing is shared.

use std::sync::Arc;

use async_trait::async_trait;
use scraper::Html;
use url::Url;

use super::{clean_text, selector};
use crate::fetcher::PageFetcher;
use crate::fetcher_http::HttpFetcher;
use crate::fetcher_shell::ShellFetcher;
use crate::{AdapterConfig, AdapterKind, Result, SearchAdapter, SearchError, SearchResult};

/// DuckDuckGo results-page adapter.
pub struct DuckDuckGo {
    config: AdapterConfig,
    fetcher: Arc<dyn PageFetcher>,
}

impl DuckDuckGo {
    /// Creates the scraper variant, fetching with reqwest.
    pub fn new() -> Self {
        Self::with_fetcher(Arc::new(HttpFetcher::new()))
    }

    /// Creates an adapter that fetches the results page with a custom fetcher.
    pub fn with_fetcher(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            config: AdapterConfig {
                name: "DuckDuckGo".to_string(),
                identifier: "duckduckgo".to_string(),
                kind: AdapterKind::Scraper,
                enabled: true,
            },
            fetcher,
        }
    }

    /// Creates the shell variant that fetches through `curl`.
    pub fn curl() -> Self {
        Self::with_fetcher(Arc::new(ShellFetcher::curl())).with_config(AdapterConfig {
            name: "DuckDuckGo via curl".to_string(),
            identifier: "curl".to_string(),
            kind: AdapterKind::Shell,
            enabled: true,
        })
    }

    /// Creates the shell variant that fetches through `lynx`.
    pub fn lynx() -> Self {
        Self::with_fetcher(Arc::new(ShellFetcher::lynx())).with_config(AdapterConfig {
            name: "DuckDuckGo via lynx".to_string(),
            identifier: "lynx".to_string(),
            kind: AdapterKind::Shell,
            enabled: true,
        })
    }

    /// Creates with custom configuration.
    pub fn with_config(mut self, config: AdapterConfig) -> Self {
        self.config = config;
        self
    }

    fn search_url(query: &str, limit: usize) -> String {
        format!(
            "https://html.duckduckgo.com/html/?q={}&s=0&dc={}",
            urlencoding::encode(query),
            limit
        )
    }
}

impl Default for DuckDuckGo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchAdapter for DuckDuckGo {
    fn config(&self) -> &AdapterConfig {
        &self.config
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        let html = self.fetcher.fetch(&Self::search_url(query, limit)).await?;
        parse_results(&html, self.identifier(), limit)
    }

    fn is_available(&self) -> bool {
        self.config.enabled && self.fetcher.is_available()
    }
}

fn parse_results(html: &str, adapter_id: &str, limit: usize) -> Result<Vec<SearchResult>> {
    let document = Html::parse_document(html);

    let challenge_selector = selector(".anomaly-modal__modal, #challenge-form")?;
    if document.select(&challenge_selector).next().is_some() {
        return Err(SearchError::AdapterRateLimited(
            "DuckDuckGo served a bot challenge".to_string(),
        ));
    }

    let result_selector = selector("div.result:not(.result--ad)")?;
    let title_selector = selector("a.result__a")?;
    let snippet_selector = selector(".result__snippet")?;

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

/// Resolves a result link, unwrapping DuckDuckGo's `/l/?uddg=` redirects.
///
/// Links that stay on duckduckgo.com (ads, internal pages) resolve to `None`.
fn resolve_href(href: &str) -> Option<String> {
    if href.starts_with("http://") || href.starts_with("https://") {
        let url = Url::parse(href).ok()?;
        return (!is_duckduckgo_host(&url)).then(|| href.to_string());
    }

    let base = Url::parse("https://duckduckgo.com/").ok()?;
    let url = base.join(href).ok()?;
    if !is_duckduckgo_host(&url) {
        return Some(url.to_string());
    }
    if url.path() == "/l/" {
        return url
            .query_pairs()
            .find(|(key, _)| key == "uddg")
            .map(|(_, value)| value.into_owned());
    }
    None
}

fn is_duckduckgo_host(url: &Url) -> bool {
    matches!(url.host_str(), Some(host) if host == "duckduckgo.com" || host.ends_with(".duckduckgo.com"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::testing::StaticFetcher;
    use crate::AdapterStatus;

    const RESULTS_PAGE: &str = r##"
        <html><body>
        <div class="result results_links result--ad">
            <h2 class="result__title"><a class="result__a" href="https://duckduckgo.com/y.js?ad_domain=shop.com">Sponsored</a></h2>
            <a class="result__snippet">Buy things</a>
        </div>
        <div class="result results_links results_links_deep web-result">
            <h2 class="result__title">
                <a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fwww.rust-lang.org%2F&amp;rut=abc">Rust Programming   Language</a>
            </h2>
            <a class="result__snippet" href="#">A language empowering everyone to build reliable and efficient software.</a>
        </div>
        <div class="result results_links web-result">
            <h2 class="result__title">
                <a class="result__a" href="https://doc.rust-lang.org/book/">The Rust Book</a>
            </h2>
        </div>
        <div class="result results_links web-result">
            <h2 class="result__title"><a class="result__a" href="">No link</a></h2>
        </div>
        <div class="result results_links web-result">
            <h2 class="result__title"><a class="result__a" href="https://crates.io/">crates.io</a></h2>
            <a class="result__snippet">The Rust community's crate registry</a>
        </div>
        </body></html>
    "##;

    #[test]
    fn test_duckduckgo_new() {
        let adapter = DuckDuckGo::new();
        assert_eq!(adapter.name(), "DuckDuckGo");
        assert_eq!(adapter.identifier(), "duckduckgo");
        assert_eq!(adapter.kind(), AdapterKind::Scraper);
        assert!(adapter.is_available());
    }

    #[test]
    fn test_shell_variants() {
        let curl = DuckDuckGo::curl();
        assert_eq!(curl.identifier(), "curl");
        assert_eq!(curl.kind(), AdapterKind::Shell);

        let lynx = DuckDuckGo::lynx();
        assert_eq!(lynx.identifier(), "lynx");
        assert_eq!(lynx.kind(), AdapterKind::Shell);
    }

    #[test]
    fn test_with_config() {
        let adapter = DuckDuckGo::new().with_config(AdapterConfig {
            name: "Custom DDG".to_string(),
            identifier: "cddg".to_string(),
            enabled: false,
            ..Default::default()
        });
        assert_eq!(adapter.name(), "Custom DDG");
        assert_eq!(adapter.identifier(), "cddg");
        assert!(!adapter.is_available());
    }

    #[test]
    fn test_unavailable_fetcher_makes_adapter_unavailable() {
        let adapter = DuckDuckGo::with_fetcher(Arc::new(StaticFetcher::unavailable()));
        assert!(!adapter.is_available());
    }

    #[test]
    fn test_search_url() {
        assert_eq!(
            DuckDuckGo::search_url("rust async", 10),
            "https://html.duckduckgo.com/html/?q=rust%20async&s=0&dc=10"
        );
    }

    #[test]
    fn test_resolve_redirect() {
        assert_eq!(
            resolve_href("//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com%2Fpage&rut=abc"),
            Some("https://example.com/page".to_string())
        );
        assert_eq!(
            resolve_href("/l/?uddg=https%3A%2F%2Fexample.com"),
            Some("https://example.com".to_string())
        );
    }

    #[test]
    fn test_resolve_direct_and_internal_links() {
        assert_eq!(
            resolve_href("https://example.com/a"),
            Some("https://example.com/a".to_string())
        );
        assert_eq!(resolve_href("https://duckduckgo.com/y.js?ad=1"), None);
        assert_eq!(resolve_href("/settings"), None);
    }

    #[test]
    fn test_parse_results_empty_html() {
        let results = parse_results("<html><body></body></html>", "duckduckgo", 10).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_parse_results_with_results() {
        let results = parse_results(RESULTS_PAGE, "duckduckgo", 10).unwrap();
        assert_eq!(results.len(), 3);

        assert_eq!(results[0].title, "Rust Programming Language");
        assert_eq!(results[0].url, "https://www.rust-lang.org/");
        assert_eq!(
            results[0].snippet,
            "A language empowering everyone to build reliable and efficient software."
        );
        assert_eq!(results[0].rank, 1);
        assert_eq!(results[0].source_adapter, "duckduckgo");

        assert_eq!(results[1].url, "https://doc.rust-lang.org/book/");
        assert_eq!(results[1].snippet, "");
        assert_eq!(results[1].rank, 2);

        assert_eq!(results[2].title, "crates.io");
        assert_eq!(results[2].rank, 3);
    }

    #[test]
    fn test_parse_results_respects_limit() {
        let results = parse_results(RESULTS_PAGE, "duckduckgo", 2).unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_parse_results_detects_challenge() {
        let html = r#"<html><body><div class="anomaly-modal__modal">Unfortunately, bots use DuckDuckGo too.</div></body></html>"#;
        let err = parse_results(html, "duckduckgo", 10).unwrap_err();
        assert_eq!(err.status(), AdapterStatus::RateLimited);
    }

    #[tokio::test]
    async fn test_search_uses_fetcher() {
        let fetcher = Arc::new(StaticFetcher::new(RESULTS_PAGE));
        let adapter = DuckDuckGo::with_fetcher(fetcher.clone()).with_config(AdapterConfig {
            name: "DuckDuckGo via curl".to_string(),
            identifier: "curl".to_string(),
            kind: AdapterKind::Shell,
            enabled: true,
        });

        let results = adapter.search("rust", 5).await.unwrap();
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.source_adapter == "curl"));
        assert_eq!(
            *fetcher.requested.lock().unwrap(),
            vec!["https://html.duckduckgo.com/html/?q=rust&s=0&dc=5"]
        );
    }

    #[tokio::test]
    async fn test_search_propagates_fetch_error() {
        let adapter = DuckDuckGo::with_fetcher(Arc::new(StaticFetcher::failing("exit 6")));
        let err = adapter.search("rust", 5).await.unwrap_err();
        assert_eq!(err.status(), AdapterStatus::Error);
    }
}
