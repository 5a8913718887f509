//! Classify storefront URLs: resource type, handle, locale prefix and host.
//!
//! The sitemap parser and the matcher both go through these functions so a
//! catalog entry and a legacy URL with the same path always classify the same.

use percent_encoding::percent_decode_str;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use url::Url;

/// Locale assigned to URLs without a language prefix.
pub const DEFAULT_LOCALE: &str = "default";

/// Storefront resource kind, derived from well-known path segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Product,
    Collection,
    Page,
    Blog,
    Other,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Product => "product",
            ResourceType::Collection => "collection",
            ResourceType::Page => "page",
            ResourceType::Blog => "blog",
            ResourceType::Other => "other",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resource path prefixes in classification priority order.
const RESOURCE_PREFIXES: [(&str, ResourceType); 4] = [
    ("/products/", ResourceType::Product),
    ("/collections/", ResourceType::Collection),
    ("/pages/", ResourceType::Page),
    ("/blogs/", ResourceType::Blog),
];

/// Classify a URL path into a resource type.
pub fn classify_path(path: &str) -> ResourceType {
    RESOURCE_PREFIXES
        .iter()
        .find(|(prefix, _)| path.contains(prefix))
        .map(|(_, kind)| *kind)
        .unwrap_or(ResourceType::Other)
}

fn locale_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^/([A-Za-z]{2}(?:-[A-Za-z]{2})?)/").expect("locale prefix regex is valid")
    })
}

fn locale_only_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^/[A-Za-z]{2}(?:-[A-Za-z]{2})?$").expect("locale-only regex is valid")
    })
}

/// Locale from the first path segment (`/fr/`, `/en-pt/`), lowercased.
///
/// The segment must be followed by more path; `/fr` alone is not a prefix.
/// Returns [`DEFAULT_LOCALE`] when there is none.
pub fn extract_locale(path: &str) -> String {
    locale_prefix_re()
        .captures(path)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_ascii_lowercase())
        .unwrap_or_else(|| DEFAULT_LOCALE.to_string())
}

/// Handle of a storefront URL path.
///
/// The locale prefix is dropped, then the segment following the
/// highest-priority resource prefix wins (`/en/blogs/news/post` yields
/// `news`, `/collections/sale/products/x` yields `x`). Otherwise the last
/// non-empty segment is used.
pub fn extract_handle(path: &str) -> String {
    let stripped = locale_prefix_re().replace(path, "/");
    for (prefix, _) in RESOURCE_PREFIXES {
        if let Some(idx) = stripped.find(prefix) {
            let segment = stripped[idx + prefix.len()..].split('/').next().unwrap_or("");
            if !segment.is_empty() {
                return segment.to_string();
            }
        }
    }
    basename(&stripped).to_string()
}

fn basename(path: &str) -> &str {
    path.trim_end_matches('/').rsplit('/').next().unwrap_or("")
}

/// Whether the path consists of nothing but a locale segment (`/tr`, `/en-gb/`).
pub fn is_locale_only_path(path: &str) -> bool {
    let trimmed = path.trim_end_matches('/');
    locale_only_re().is_match(trimmed)
}

/// Lowercase the host and drop a leading `www.`.
pub fn normalize_host(host: &str) -> String {
    let host = host.to_ascii_lowercase();
    match host.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => host,
    }
}

/// Trim trailing slashes; the root stays `/`.
pub fn trim_path(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

/// Whether the host is under the `.com` TLD.
pub fn is_com_domain(domain: &str) -> bool {
    domain.ends_with(".com")
}

/// A parsed absolute URL with the pieces the matcher compares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlParts {
    /// `scheme://host[:port]`.
    pub origin: String,
    /// Host as written (lowercased by the parser).
    pub host: String,
    /// Host without `www.`.
    pub domain: String,
    /// Percent-decoded path, at least `/`.
    pub path: String,
    /// Raw query string, if any.
    pub query: Option<String>,
}

impl UrlParts {
    /// Parse an absolute http(s) URL. Returns `None` for anything without a host.
    pub fn parse(raw: &str) -> Option<Self> {
        let url = Url::parse(raw.trim()).ok()?;
        let host = url.host_str()?.to_string();
        let path = percent_decode_str(url.path()).decode_utf8_lossy().into_owned();
        Some(Self {
            origin: url.origin().ascii_serialization(),
            domain: normalize_host(&host),
            host,
            path: if path.is_empty() { "/".to_string() } else { path },
            query: url.query().map(str::to_string),
        })
    }

    pub fn resource_type(&self) -> ResourceType {
        classify_path(&self.path)
    }

    pub fn locale(&self) -> String {
        extract_locale(&self.path)
    }

    pub fn handle(&self) -> String {
        extract_handle(&self.path)
    }

    /// Path plus `?query`, as used for the "from" column of a redirect.
    pub fn path_and_query(&self) -> String {
        match &self.query {
            Some(q) => format!("{}?{q}", self.path),
            None => self.path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_paths() {
        assert_eq!(classify_path("/products/widget"), ResourceType::Product);
        assert_eq!(classify_path("/de/collections/sale"), ResourceType::Collection);
        assert_eq!(classify_path("/pages/about-us"), ResourceType::Page);
        assert_eq!(classify_path("/blogs/news/launch"), ResourceType::Blog);
        assert_eq!(classify_path("/collections"), ResourceType::Other);
        assert_eq!(classify_path("/"), ResourceType::Other);
    }

    #[test]
    fn test_product_handle_ignores_locale_prefix() {
        for path in [
            "/products/blue-widget",
            "/fr/products/blue-widget",
            "/en-PT/products/blue-widget",
            "/collections/sale/products/blue-widget",
        ] {
            assert_eq!(classify_path(path), ResourceType::Product, "{path}");
            assert_eq!(extract_handle(path), "blue-widget", "{path}");
        }
    }

    #[test]
    fn test_handle_fallbacks() {
        assert_eq!(extract_handle("/blogs/news/launch-day"), "news");
        assert_eq!(extract_handle("/search/results/"), "results");
        assert_eq!(extract_handle("/de/"), "");
        assert_eq!(extract_handle("/"), "");
    }

    #[test]
    fn test_extract_locale() {
        assert_eq!(extract_locale("/fr/products/x"), "fr");
        assert_eq!(extract_locale("/EN-pt/products/x"), "en-pt");
        assert_eq!(extract_locale("/products/x"), DEFAULT_LOCALE);
        assert_eq!(extract_locale("/fr"), DEFAULT_LOCALE);
        assert_eq!(extract_locale("/fra/products/x"), DEFAULT_LOCALE);
    }

    #[test]
    fn test_locale_only_paths() {
        assert!(is_locale_only_path("/tr"));
        assert!(is_locale_only_path("/en-gb/"));
        assert!(!is_locale_only_path("/tr/products"));
        assert!(!is_locale_only_path("/"));
    }

    #[test]
    fn test_url_parts() {
        let parts = UrlParts::parse("https://WWW.Shop.com/fr/products/caf%C3%A9?variant=2").unwrap();
        assert_eq!(parts.origin, "https://www.shop.com");
        assert_eq!(parts.host, "www.shop.com");
        assert_eq!(parts.domain, "shop.com");
        assert_eq!(parts.path, "/fr/products/café");
        assert_eq!(parts.handle(), "café");
        assert_eq!(parts.locale(), "fr");
        assert_eq!(parts.path_and_query(), "/fr/products/café?variant=2");

        assert!(UrlParts::parse("not a url").is_none());
        assert!(UrlParts::parse("mailto:someone@example.com").is_none());
    }

    #[test]
    fn test_trim_path() {
        assert_eq!(trim_path("/collections/"), "/collections");
        assert_eq!(trim_path("/"), "/");
        assert_eq!(trim_path(""), "/");
    }
}
