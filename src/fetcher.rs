//! Page fetcher abstraction for retrieving results pages.

use async_trait::async_trait;

use crate::Result;

/// Trait for fetching the raw body of a URL.
///
/// Implementations may use an in-process HTTP client or shell out to an
/// external binary. All configuration (user agent, binary path) is set at
/// construction time; `fetch` is a simple URL-in, body-out interface.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches the body of the given URL.
    async fn fetch(&self, url: &str) -> Result<String>;

    /// Cheap local check that the fetcher can run at all.
    fn is_available(&self) -> bool {
        true
    }
}
