//! Sitemap fetching and parsing.
//!
//! Handles `<urlset>` documents and `<sitemapindex>` documents (expanded
//! depth-first), gzip bodies, and `xhtml:link` hreflang alternates. Every
//! failure is soft: the document contributes nothing and a warning is logged.

use crate::acquisition::http_client::Fetcher;
use crate::cartography::rate_limiter::RateLimiter;
use crate::cartography::url_classifier::{classify_path, extract_locale, ResourceType, UrlParts};
use flate2::read::GzDecoder;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const XHTML_NS: &[u8] = b"http://www.w3.org/1999/xhtml";

/// Why a fetched body produced no document.
#[derive(Debug, Error)]
pub enum SitemapError {
    #[error("gzip decompression failed: {0}")]
    Decompress(#[source] std::io::Error),
    #[error("malformed XML: {0}")]
    Xml(String),
    #[error("document has no root element")]
    NoRoot,
}

/// Alternate-language links of one `<url>` entry, in document order.
///
/// A repeated hreflang replaces the earlier href but keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HreflangMap(Vec<(String, String)>);

impl HreflangMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, locale: &str, href: &str) {
        match self.0.iter_mut().find(|(l, _)| l == locale) {
            Some(slot) => slot.1 = href.to_string(),
            None => self.0.push((locale.to_string(), href.to_string())),
        }
    }

    pub fn get(&self, locale: &str) -> Option<&str> {
        self.0.iter().find(|(l, _)| l == locale).map(|(_, h)| h.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(l, h)| (l.as_str(), h.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<const N: usize> From<[(&str, &str); N]> for HreflangMap {
    fn from(pairs: [(&str, &str); N]) -> Self {
        let mut map = Self::new();
        for (locale, href) in pairs {
            map.insert(locale, href);
        }
        map
    }
}

/// One `<url>` entry as read from a sitemap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSitemapEntry {
    pub url: String,
    pub resource_type: ResourceType,
    pub locale: String,
    pub hreflang: HreflangMap,
}

impl RawSitemapEntry {
    /// Build an entry, classifying the location with the shared URL rules.
    pub fn new(url: &str, hreflang: HreflangMap) -> Self {
        let url = url.trim();
        let (resource_type, locale) = match UrlParts::parse(url) {
            Some(parts) => (parts.resource_type(), parts.locale()),
            None => (classify_path(url), extract_locale(url)),
        };
        Self {
            url: url.to_string(),
            resource_type,
            locale,
            hreflang,
        }
    }
}

/// A parsed sitemap document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapDocument {
    /// `<sitemapindex>`: child sitemap locations.
    Index(Vec<String>),
    /// `<urlset>`: page entries.
    UrlSet(Vec<RawSitemapEntry>),
}

/// Undo gzip compression when the body starts with the gzip magic bytes.
pub fn decode_body(body: Vec<u8>) -> Result<Vec<u8>, SitemapError> {
    if !body.starts_with(&GZIP_MAGIC) {
        return Ok(body);
    }
    let mut out = Vec::new();
    GzDecoder::new(body.as_slice())
        .read_to_end(&mut out)
        .map_err(SitemapError::Decompress)?;
    Ok(out)
}

/// Parse a sitemap or sitemap index.
///
/// `sample_limit` caps how many `<url>` entries are read; parsing stops as
/// soon as the cap is reached.
pub fn parse_document(xml: &[u8], sample_limit: Option<usize>) -> Result<SitemapDocument, SitemapError> {
    let mut reader = NsReader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let mut saw_root = false;
    let mut depth = 0usize;
    let mut in_url = false;
    let mut in_sitemap = false;
    let mut in_loc = false;
    let mut loc = String::new();
    let mut hreflang = HreflangMap::new();

    let mut urls = Vec::new();
    let mut children = Vec::new();

    loop {
        match reader.read_resolved_event_into(&mut buf) {
            Ok((ns, Event::Start(e))) => {
                saw_root = true;
                depth += 1;
                match e.local_name().as_ref() {
                    b"url" => {
                        in_url = true;
                        loc.clear();
                        hreflang = HreflangMap::new();
                    }
                    b"sitemap" => {
                        in_sitemap = true;
                        loc.clear();
                    }
                    b"loc" if in_url || in_sitemap => in_loc = true,
                    b"link" if in_url && is_xhtml(&ns) => collect_alternate(&e, &mut hreflang),
                    _ => {}
                }
            }
            Ok((ns, Event::Empty(e))) => {
                saw_root = true;
                if in_url && e.local_name().as_ref() == b"link" && is_xhtml(&ns) {
                    collect_alternate(&e, &mut hreflang);
                }
            }
            Ok((_, Event::Text(e))) if in_loc => {
                let text = e.unescape().map_err(|err| SitemapError::Xml(err.to_string()))?;
                loc.push_str(&text);
            }
            Ok((_, Event::CData(e))) if in_loc => {
                loc.push_str(&String::from_utf8_lossy(&e.into_inner()));
            }
            Ok((_, Event::End(e))) => {
                depth = depth.saturating_sub(1);
                match e.local_name().as_ref() {
                    b"loc" => in_loc = false,
                    b"url" if in_url => {
                        in_url = false;
                        let location = loc.trim();
                        if !location.is_empty() {
                            urls.push(RawSitemapEntry::new(location, std::mem::take(&mut hreflang)));
                            if sample_limit.is_some_and(|limit| urls.len() >= limit) {
                                break;
                            }
                        }
                    }
                    b"sitemap" if in_sitemap => {
                        in_sitemap = false;
                        let location = loc.trim();
                        if !location.is_empty() {
                            children.push(location.to_string());
                        }
                    }
                    _ => {}
                }
            }
            Ok((_, Event::Eof)) if depth > 0 => {
                return Err(SitemapError::Xml(format!("unexpected end of document, {depth} element(s) left open")));
            }
            Ok((_, Event::Eof)) => break,
            Err(e) => return Err(SitemapError::Xml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        return Err(SitemapError::NoRoot);
    }
    if !children.is_empty() {
        return Ok(SitemapDocument::Index(children));
    }
    Ok(SitemapDocument::UrlSet(urls))
}

fn is_xhtml(ns: &ResolveResult) -> bool {
    matches!(ns, ResolveResult::Bound(Namespace(uri)) if *uri == XHTML_NS)
}

fn collect_alternate(e: &BytesStart, hreflang: &mut HreflangMap) {
    let mut rel = None;
    let mut lang = None;
    let mut href = None;
    for attr in e.attributes().flatten() {
        let Ok(value) = attr.unescape_value() else {
            continue;
        };
        match attr.key.local_name().as_ref() {
            b"rel" => rel = Some(value.into_owned()),
            b"hreflang" => lang = Some(value.into_owned()),
            b"href" => href = Some(value.into_owned()),
            _ => {}
        }
    }
    if let (Some(rel), Some(lang), Some(href)) = (rel, lang, href) {
        if rel == "alternate" {
            hreflang.insert(&lang, &href);
        }
    }
}

/// Parser tuning.
#[derive(Debug, Clone)]
pub struct SitemapOptions {
    /// Delay between child sitemap fetches.
    pub child_delay_ms: u64,
    /// Index child count above which fast mode switches on.
    pub fast_mode_threshold: usize,
    /// Entries read per leaf document in fast mode.
    pub fast_mode_sample_size: usize,
    /// How many levels of nested indexes are expanded.
    pub max_index_depth: usize,
}

impl Default for SitemapOptions {
    fn default() -> Self {
        Self {
            child_delay_ms: 200,
            fast_mode_threshold: 10,
            fast_mode_sample_size: 50,
            max_index_depth: 3,
        }
    }
}

/// Counters for one parser's lifetime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseStats {
    pub documents_fetched: usize,
    pub documents_failed: usize,
    pub child_sitemaps: usize,
}

/// Fetches and flattens sitemaps into [`RawSitemapEntry`] lists.
pub struct SitemapParser {
    fetcher: Arc<dyn Fetcher>,
    options: SitemapOptions,
    limiter: RateLimiter,
    /// Sample size requested by the caller, kept across `parse` calls.
    requested_fast_mode: Option<usize>,
    /// Sample size in effect for the current `parse` call.
    fast_mode: Option<usize>,
    stats: ParseStats,
}

impl SitemapParser {
    pub fn new(fetcher: Arc<dyn Fetcher>, options: SitemapOptions) -> Self {
        let limiter = RateLimiter::sequential(options.child_delay_ms);
        Self {
            fetcher,
            options,
            limiter,
            requested_fast_mode: None,
            fast_mode: None,
            stats: ParseStats::default(),
        }
    }

    /// Only read `sample_size` entries per leaf document, for every sitemap
    /// parsed from now on.
    pub fn enable_fast_mode(&mut self, sample_size: usize) {
        self.requested_fast_mode = Some(sample_size);
        self.fast_mode = Some(sample_size);
    }

    /// Fast-mode sample size in effect for the last (or current) parse.
    pub fn fast_mode(&self) -> Option<usize> {
        self.fast_mode
    }

    pub fn stats(&self) -> &ParseStats {
        &self.stats
    }

    /// Fetch `url` and return every entry it yields, expanding indexes.
    ///
    /// Entries are returned in document order without deduplication. Fast
    /// mode switched on by a large index only lasts for this call.
    pub async fn parse(&mut self, url: &str) -> Vec<RawSitemapEntry> {
        self.fast_mode = self.requested_fast_mode;
        let mut entries = Vec::new();
        let mut pending = vec![(url.to_string(), 0usize)];

        while let Some((current, depth)) = pending.pop() {
            let document = if depth == 0 {
                self.fetch_document(&current).await
            } else {
                let _guard = self.limiter.acquire().await;
                self.fetch_document(&current).await
            };

            match document {
                None => {}
                Some(SitemapDocument::UrlSet(mut urls)) => {
                    debug!(sitemap = %current, entries = urls.len(), "parsed urlset");
                    entries.append(&mut urls);
                }
                Some(SitemapDocument::Index(children)) => {
                    if depth >= self.options.max_index_depth {
                        warn!(sitemap = %current, depth, "sitemap index nested too deep, skipping");
                        continue;
                    }
                    if children.len() > self.options.fast_mode_threshold && self.fast_mode.is_none() {
                        info!(
                            children = children.len(),
                            sample_size = self.options.fast_mode_sample_size,
                            "large sitemap index, enabling fast mode"
                        );
                        self.fast_mode = Some(self.options.fast_mode_sample_size);
                    }
                    info!(
                        sitemap = %current,
                        children = children.len(),
                        fast_mode = ?self.fast_mode,
                        "expanding sitemap index"
                    );
                    self.stats.child_sitemaps += children.len();
                    pending.extend(children.into_iter().rev().map(|c| (c, depth + 1)));
                }
            }
        }

        info!(sitemap = url, total = entries.len(), "sitemap loaded");
        entries
    }

    async fn fetch_document(&mut self, url: &str) -> Option<SitemapDocument> {
        let body = match self.fetcher.fetch(url).await {
            Ok(body) => body,
            Err(e) => {
                warn!(sitemap = url, error = %e, "sitemap fetch failed");
                self.stats.documents_failed += 1;
                return None;
            }
        };

        let parsed = decode_body(body).and_then(|xml| parse_document(&xml, self.fast_mode));
        match parsed {
            Ok(document) => {
                self.stats.documents_fetched += 1;
                Some(document)
            }
            Err(e) => {
                warn!(sitemap = url, error = %e, "sitemap could not be parsed");
                self.stats.documents_failed += 1;
                None
            }
        }
    }
}
