//! URL canonicalization for result deduplication.
//!
//! Two URLs are treated as the same resource iff their canonical forms are
//! byte-equal. The rule set is conservative: `http` and `https` stay distinct
//! and session identifiers are left alone.

use url::form_urlencoded;
use url::Url;

use crate::{Result, SearchError};

/// Query parameters removed during canonicalization (exact key match, case-insensitive).
pub const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "utm_id",
    "utm_source_platform",
    "utm_creative_format",
    "utm_marketing_tactic",
    "gclid",
    "gclsrc",
    "dclid",
    "fbclid",
    "msclkid",
    "twclid",
    "mc_cid",
    "mc_eid",
];

/// Canonicalizes a URL for identity comparison.
///
/// Rules, applied in order:
///
/// 1. Lowercase the scheme and host.
/// 2. Strip a leading `www.` from the host.
/// 3. Strip the fragment.
/// 4. Remove [`TRACKING_PARAMS`].
/// 5. Sort the remaining query parameters by key, then value.
/// 6. Strip trailing slashes from the path, unless the path is exactly `/`.
/// 7. Drop default ports (80 for http, 443 for https).
///
/// A root path with no query is rendered without its slash, so
/// `https://example.com/` and `https://example.com` share one form.
/// The function is idempotent.
///
/// # Errors
///
/// Returns [`SearchError::InvalidUrl`] if the input is not an absolute URL
/// with a host.
///
/// # Examples
///
/// ```
/// use a3s_metasearch::canonicalize;
///
/// let a = canonicalize("https://WWW.Example.com/path/?b=2&a=1#top").unwrap();
/// let b = canonicalize("https://example.com/path?a=1&b=2").unwrap();
/// assert_eq!(a, b);
/// ```
pub fn canonicalize(raw: &str) -> Result<String> {
    let parsed = Url::parse(raw.trim()).map_err(|e| invalid(raw, e.to_string()))?;

    let host = match parsed.host_str() {
        Some(host) if !host.is_empty() => host.to_ascii_lowercase(),
        _ => return Err(invalid(raw, "missing host")),
    };
    let scheme = parsed.scheme().to_ascii_lowercase();

    let mut out = String::with_capacity(raw.len());
    out.push_str(&scheme);
    out.push_str("://");

    if !parsed.username().is_empty() {
        out.push_str(parsed.username());
        if let Some(password) = parsed.password() {
            out.push(':');
            out.push_str(password);
        }
        out.push('@');
    }

    out.push_str(strip_www(&host));

    if let Some(port) = parsed.port() {
        if !is_default_port(&scheme, port) {
            out.push(':');
            out.push_str(&port.to_string());
        }
    }

    let query = canonical_query(&parsed);
    let path = parsed.path().trim_end_matches('/');
    if !path.is_empty() {
        out.push_str(path);
    } else if !query.is_empty() {
        out.push('/');
    }

    if !query.is_empty() {
        out.push('?');
        out.push_str(&query);
    }

    Ok(out)
}

/// Returns true if both URLs canonicalize to the same form.
///
/// URLs that fail to canonicalize are never equivalent to anything.
pub fn are_equivalent(a: &str, b: &str) -> bool {
    match (canonicalize(a), canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn strip_www(host: &str) -> &str {
    let mut host = host;
    while let Some(rest) = host.strip_prefix("www.") {
        if rest.is_empty() {
            break;
        }
        host = rest;
    }
    host
}

fn is_default_port(scheme: &str, port: u16) -> bool {
    matches!((scheme, port), ("http", 80) | ("https", 443))
}

fn canonical_query(url: &Url) -> String {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if params.is_empty() {
        return String::new();
    }

    params.sort();
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish()
}

fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS
        .iter()
        .any(|tracked| tracked.eq_ignore_ascii_case(key))
}

fn invalid(url: &str, reason: impl Into<String>) -> SearchError {
    SearchError::InvalidUrl {
        url: url.to_string(),
        reason: reason.into(),
    }
}
