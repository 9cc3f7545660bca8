//! Built-in search adapter implementations.

use std::sync::OnceLock;

use regex::Regex;
use scraper::Selector;

use crate::{Result, SearchError};

// Results-page adapters (scraper and shell-backed variants)
mod duckduckgo;

// JSON API adapters, Google and Bing with a results-page fallback
mod bing;
mod google;
mod wikipedia;

pub use bing::Bing;
pub use duckduckgo::DuckDuckGo;
pub use google::Google;
pub use wikipedia::Wikipedia;

/// Parses a CSS selector used by a results-page parser.
pub(crate) fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| SearchError::Parse(format!("Failed to parse selector: {:?}", e)))
}

/// Collapses whitespace and decodes the few entities providers leave in plain-text fields.
pub(crate) fn clean_text(text: &str) -> String {
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    let whitespace = WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace regex"));

    let decoded = text
        .replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&");

    whitespace.replace_all(decoded.trim(), " ").into_owned()
}
