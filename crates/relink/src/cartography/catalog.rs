//! The target-site catalog: every URL discovered in the new sitemaps.
//!
//! Built fresh for each match run and read-only afterwards. Host, path and
//! handle are derived once at construction so the matcher's full scans do
//! not re-parse URLs.

use crate::cartography::sitemap::{HreflangMap, RawSitemapEntry, SitemapParser};
use crate::cartography::url_classifier::{
    extract_handle, is_com_domain, normalize_host, trim_path, ResourceType, UrlParts,
};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use tracing::info;

/// One target URL with its derived metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub url: String,
    pub handle: String,
    pub resource_type: ResourceType,
    pub locale: String,
    pub hreflang: HreflangMap,
    /// `scheme://host`, empty when the URL has no host.
    #[serde(skip)]
    pub origin: String,
    /// Host without `www.`, empty when the URL has no host.
    #[serde(skip)]
    pub domain: String,
    /// Decoded path, at least `/`.
    #[serde(skip)]
    pub path: String,
}

impl CatalogEntry {
    pub fn from_raw(raw: RawSitemapEntry) -> Self {
        let (origin, domain, path) = match UrlParts::parse(&raw.url) {
            Some(parts) => (parts.origin, parts.domain, parts.path),
            None => (String::new(), String::new(), raw.url.clone()),
        };
        Self {
            handle: extract_handle(&path),
            url: raw.url,
            resource_type: raw.resource_type,
            locale: raw.locale,
            hreflang: raw.hreflang,
            origin,
            domain,
            path,
        }
    }

    /// Whether the entry has an absolute URL with a host.
    pub fn has_host(&self) -> bool {
        !self.domain.is_empty()
    }
}

/// Ordered collection of [`CatalogEntry`] plus lookup helpers.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    locales: Vec<String>,
    locale_set: HashSet<String>,
    domains: Vec<String>,
    sitemaps: usize,
}

impl Catalog {
    pub fn from_entries(raw: Vec<RawSitemapEntry>) -> Self {
        let mut catalog = Self::default();
        catalog.extend(raw);
        catalog
    }

    /// Parse each sitemap in turn and combine the results.
    pub async fn load(parser: &mut SitemapParser, sitemap_urls: &[String]) -> Self {
        let mut catalog = Self::default();
        for url in sitemap_urls {
            let entries = parser.parse(url).await;
            info!(sitemap = %url, entries = entries.len(), "sitemap added to catalog");
            catalog.extend(entries);
            catalog.sitemaps += 1;
        }
        info!(
            entries = catalog.len(),
            sitemaps = catalog.sitemaps,
            locales = catalog.locales.len(),
            domains = catalog.domains.len(),
            "catalog loaded"
        );
        catalog
    }

    fn extend(&mut self, raw: Vec<RawSitemapEntry>) {
        for entry in raw.into_iter().map(CatalogEntry::from_raw) {
            if self.locale_set.insert(entry.locale.clone()) {
                self.locales.push(entry.locale.clone());
            }
            if entry.has_host() && !self.domains.contains(&entry.domain) {
                self.domains.push(entry.domain.clone());
            }
            self.entries.push(entry);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Number of sitemap URLs passed to [`Catalog::load`].
    pub fn sitemap_count(&self) -> usize {
        self.sitemaps
    }

    /// Distinct locales in first-seen order.
    pub fn locales(&self) -> &[String] {
        &self.locales
    }

    pub fn has_locale(&self, locale: &str) -> bool {
        self.locale_set.contains(locale)
    }

    /// Distinct `www`-stripped hosts in first-seen order.
    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    pub fn has_domain(&self, domain: &str) -> bool {
        self.domains.iter().any(|d| d == domain)
    }

    /// More than one distinct host.
    pub fn is_multi_domain(&self) -> bool {
        self.domains.len() > 1
    }

    /// First `.com` host seen in the catalog.
    pub fn com_domain(&self) -> Option<&str> {
        self.domains.iter().map(String::as_str).find(|d| is_com_domain(d))
    }

    /// Entries on `domain` (already `www`-stripped).
    pub fn on_domain<'a>(&'a self, domain: &'a str) -> impl Iterator<Item = &'a CatalogEntry> + 'a {
        self.entries.iter().filter(move |e| e.domain == domain)
    }

    /// First entry on `domain` whose path equals `path`, ignoring trailing slashes.
    pub fn find_by_path(&self, domain: &str, path: &str) -> Option<&CatalogEntry> {
        let wanted = trim_path(path);
        self.entries
            .iter()
            .find(|e| e.domain == domain && trim_path(&e.path) == wanted)
    }

    /// Origin of the first entry tagged `locale`, else of the first entry with a host.
    pub fn base_origin_for_locale(&self, locale: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.has_host() && e.locale == locale)
            .or_else(|| self.entries.iter().find(|e| e.has_host()))
            .map(|e| e.origin.as_str())
    }

    /// Entry counts per locale.
    pub fn locale_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for e in &self.entries {
            *counts.entry(e.locale.clone()).or_default() += 1;
        }
        counts
    }

    /// Entry counts per resource type.
    pub fn type_counts(&self) -> BTreeMap<ResourceType, usize> {
        let mut counts = BTreeMap::new();
        for e in &self.entries {
            *counts.entry(e.resource_type).or_default() += 1;
        }
        counts
    }

    /// Whether `host` (any case, with or without `www.`) appears in the catalog.
    pub fn knows_host(&self, host: &str) -> bool {
        self.has_domain(&normalize_host(host))
    }
}
