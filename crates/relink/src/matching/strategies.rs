//! The individual match strategies, in pipeline order.
//!
//! Each strategy looks at one legacy URL against the whole catalog and
//! either proposes a target with a score or passes. Scans are full and in
//! catalog order; a later candidate only wins with a strictly higher score.

use crate::cartography::catalog::{Catalog, CatalogEntry};
use crate::cartography::url_classifier::{
    extract_locale, is_com_domain, trim_path, ResourceType, UrlParts, DEFAULT_LOCALE,
};
use crate::matching::locale::LocaleResolver;
use crate::matching::trace::{MatchEvent, MatchObserver};
use crate::navigation::similarity::similarity;
use serde::Serialize;
use std::fmt;

/// Score given to every hreflang match.
pub const HREFLANG_SCORE: u8 = 100;

/// Strategy that produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Hreflang,
    SameDomain,
    LocaleDomain,
    CrossDomain,
    Fallback,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Hreflang => "hreflang",
            Strategy::SameDomain => "same_domain",
            Strategy::LocaleDomain => "locale_domain",
            Strategy::CrossDomain => "cross_domain",
            Strategy::Fallback => "fallback",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A proposed redirect target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Match {
    pub url: String,
    pub score: u8,
    pub strategy: Strategy,
}

/// A legacy URL broken down for matching.
#[derive(Debug, Clone)]
pub struct LegacyUrl<'a> {
    pub url: &'a str,
    pub parts: UrlParts,
    pub handle: String,
    pub resource_type: ResourceType,
    /// Locale after normalization.
    pub locale: String,
}

impl<'a> LegacyUrl<'a> {
    pub fn parse(url: &'a str, resolver: &LocaleResolver) -> Option<Self> {
        let parts = UrlParts::parse(url)?;
        Some(Self {
            url,
            handle: parts.handle(),
            resource_type: parts.resource_type(),
            locale: resolver.normalize(&parts.locale()),
            parts,
        })
    }

    /// Whether a catalog locale is acceptable for this URL's locale.
    ///
    /// English also accepts unprefixed URLs.
    fn accepts_locale(&self, locale: &str) -> bool {
        locale == self.locale || (self.locale == "en" && locale == DEFAULT_LOCALE)
    }

    fn is_path(&self, path: &str) -> bool {
        trim_path(path) == trim_path(&self.parts.path)
    }
}

/// Locale detected in a raw legacy URL, before normalization.
pub fn legacy_locale(url: &str) -> String {
    match UrlParts::parse(url) {
        Some(parts) => parts.locale(),
        None => extract_locale(url),
    }
}

/// Running best candidate of a scored scan.
struct Best<'c> {
    url: Option<&'c str>,
    score: f64,
}

impl<'c> Best<'c> {
    fn new() -> Self {
        Self { url: None, score: 0.0 }
    }

    fn offer(
        &mut self,
        strategy: Strategy,
        legacy: &LegacyUrl,
        entry: &'c CatalogEntry,
        similarity: f64,
        score: f64,
        observer: &dyn MatchObserver,
    ) {
        if score > self.score {
            self.score = score;
            self.url = Some(&entry.url);
            observer.on_event(MatchEvent::Candidate {
                strategy,
                old_url: legacy.url.to_string(),
                candidate: entry.url.clone(),
                similarity,
                score,
            });
        }
    }

    fn accept(self, strategy: Strategy, min_score: f64) -> Option<Match> {
        let url = self.url?;
        (self.score >= min_score).then(|| Match {
            url: url.to_string(),
            score: round_score(self.score),
            strategy,
        })
    }
}

fn round_score(score: f64) -> u8 {
    score.round().clamp(0.0, 100.0) as u8
}

fn type_bonus(legacy: &LegacyUrl, entry: &CatalogEntry) -> f64 {
    if entry.resource_type == legacy.resource_type {
        10.0
    } else {
        0.0
    }
}

fn hreflang_locale_compatible(normalized: &str, alternate: &str) -> bool {
    normalized.eq_ignore_ascii_case(alternate)
        || normalized == DEFAULT_LOCALE
        || alternate.eq_ignore_ascii_case("x-default")
        || normalized
            .split_once('-')
            .is_some_and(|(base, _)| base.eq_ignore_ascii_case(alternate))
}

/// Hreflang alternates on the legacy host whose handle matches closely.
///
/// The first qualifying alternate wins with [`HREFLANG_SCORE`].
pub fn hreflang(catalog: &Catalog, legacy: &LegacyUrl, observer: &dyn MatchObserver) -> Option<Match> {
    for entry in catalog.entries().iter().filter(|e| !e.hreflang.is_empty()) {
        for (alt_locale, href) in entry.hreflang.iter() {
            let Some(alt) = UrlParts::parse(href) else {
                continue;
            };
            if alt.host != legacy.parts.host || !hreflang_locale_compatible(&legacy.locale, alt_locale) {
                continue;
            }
            let sim = similarity(&legacy.handle, &alt.handle());
            if sim > 0.7 {
                observer.on_event(MatchEvent::Candidate {
                    strategy: Strategy::Hreflang,
                    old_url: legacy.url.to_string(),
                    candidate: href.to_string(),
                    similarity: sim,
                    score: f64::from(HREFLANG_SCORE),
                });
                return Some(Match {
                    url: href.to_string(),
                    score: HREFLANG_SCORE,
                    strategy: Strategy::Hreflang,
                });
            }
        }
    }
    None
}

/// Best handle match on the legacy URL's own host.
pub fn same_domain(catalog: &Catalog, legacy: &LegacyUrl, observer: &dyn MatchObserver) -> Option<Match> {
    let mut best = Best::new();
    for entry in catalog.on_domain(&legacy.parts.domain) {
        if !legacy.accepts_locale(&entry.locale) {
            continue;
        }
        let sim = similarity(&legacy.handle, &entry.handle);
        let default_bonus = if entry.locale == DEFAULT_LOCALE { 2.0 } else { 0.0 };
        let score = sim * 83.0 + type_bonus(legacy, entry) + default_bonus;
        if sim > 0.6 {
            best.offer(Strategy::SameDomain, legacy, entry, sim, score, observer);
        }
    }
    best.accept(Strategy::SameDomain, 60.0)
}

/// Host with the most entries for `locale` (`en` also counts unprefixed
/// entries). Ties go to the host seen first.
pub fn primary_domain<'c>(catalog: &'c Catalog, locale: &str) -> Option<&'c str> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for entry in catalog.entries().iter().filter(|e| e.has_host()) {
        if entry.locale != locale && !(locale == "en" && entry.locale == DEFAULT_LOCALE) {
            continue;
        }
        match counts.iter_mut().find(|(d, _)| *d == entry.domain) {
            Some((_, n)) => *n += 1,
            None => counts.push((entry.domain.as_str(), 1)),
        }
    }
    let mut primary: Option<(&str, usize)> = None;
    for (domain, count) in counts {
        if primary.map_or(true, |(_, best)| count > best) {
            primary = Some((domain, count));
        }
    }
    primary.map(|(d, _)| d)
}

/// Best handle match on the host that carries the most content for the locale.
///
/// Only used for hosts the catalog knows; English never leaves a host that
/// is already primary, and only lands on unprefixed URLs. When the primary
/// host is another one, identical paths are left to domain-level redirects.
pub fn locale_domain(catalog: &Catalog, legacy: &LegacyUrl, observer: &dyn MatchObserver) -> Option<Match> {
    if !catalog.has_domain(&legacy.parts.domain) {
        return None;
    }
    let primary = primary_domain(catalog, &legacy.locale)?;
    let english = legacy.locale == "en";
    if english && primary == legacy.parts.domain {
        return None;
    }
    let moving = primary != legacy.parts.domain;

    let mut best = Best::new();
    for entry in catalog.on_domain(primary) {
        if !legacy.accepts_locale(&entry.locale) || (english && entry.locale != DEFAULT_LOCALE) {
            continue;
        }
        if moving && legacy.is_path(&entry.path) {
            continue;
        }
        let sim = similarity(&legacy.handle, &entry.handle);
        let default_bonus = if entry.locale == DEFAULT_LOCALE { 5.0 } else { 0.0 };
        let score = sim * 83.0 + type_bonus(legacy, entry) + default_bonus;
        if sim > 0.6 {
            best.offer(Strategy::LocaleDomain, legacy, entry, sim, score, observer);
        }
    }
    best.accept(Strategy::LocaleDomain, 60.0)
}

/// Whether the legacy path exists unchanged on the catalog's `.com` host.
pub fn identical_path_on_com(catalog: &Catalog, legacy: &LegacyUrl) -> bool {
    match catalog.com_domain() {
        Some(com) if com != legacy.parts.domain => catalog.find_by_path(com, &legacy.parts.path).is_some(),
        _ => false,
    }
}

/// Best handle match on any other host in the same locale, `.com` first.
///
/// Identical paths are left to domain-level redirects.
pub fn cross_domain(catalog: &Catalog, legacy: &LegacyUrl, observer: &dyn MatchObserver) -> Option<Match> {
    let mut candidates: Vec<&CatalogEntry> = catalog
        .entries()
        .iter()
        .filter(|e| e.has_host() && e.locale == legacy.locale && e.domain != legacy.parts.domain)
        .collect();
    candidates.sort_by_key(|e| !is_com_domain(&e.domain));

    let mut best = Best::new();
    for entry in candidates {
        if legacy.is_path(&entry.path) {
            continue;
        }
        let handle_sim = similarity(&legacy.handle, &entry.handle);
        if handle_sim <= 0.7 {
            continue;
        }
        let path_sim = similarity(&legacy.parts.path, &entry.path);
        let com_bonus = if is_com_domain(&entry.domain) { 5.0 } else { 0.0 };
        let score = handle_sim * 60.0 + path_sim * 10.0 + type_bonus(legacy, entry) + com_bonus;
        best.offer(Strategy::CrossDomain, legacy, entry, handle_sim, score, observer);
    }
    best.accept(Strategy::CrossDomain, 55.0)
}

/// Path prefix for a locale; English and unprefixed URLs share the root.
pub fn locale_prefix(locale: &str) -> String {
    if locale == DEFAULT_LOCALE || locale == "en" {
        String::new()
    } else {
        format!("/{locale}")
    }
}

/// Category paths to try for a resource type, best first, with their scores.
pub fn fallback_paths(kind: ResourceType, prefix: &str) -> Vec<(String, u8)> {
    let table: &[(&str, u8)] = match kind {
        ResourceType::Product => &[("/collections/all", 40), ("/collections", 35), ("/", 25)],
        ResourceType::Collection => &[("/collections", 35), ("/collections/all", 30), ("/", 25)],
        ResourceType::Page => &[("/", 25)],
        ResourceType::Blog => &[("/blogs", 30), ("/", 25)],
        ResourceType::Other => &[("/", 20)],
    };
    table
        .iter()
        .map(|(path, score)| (format!("{prefix}{path}"), *score))
        .collect()
}

/// Rank of a catalog entry as a generic stand-in for `kind`; lower is better.
fn related_priority(kind: ResourceType, entry: &CatalogEntry, prefix: &str) -> Option<u8> {
    let path = trim_path(&entry.path);
    let home = if prefix.is_empty() { "/" } else { prefix };
    let ends_with = |suffix: &str| path.ends_with(&format!("{prefix}{suffix}"));
    match kind {
        ResourceType::Product | ResourceType::Collection => {
            if ends_with("/collections/all") {
                Some(1)
            } else if ends_with("/collections") {
                Some(2)
            } else if entry.resource_type == ResourceType::Collection {
                Some(3)
            } else if path == home {
                Some(10)
            } else {
                None
            }
        }
        ResourceType::Blog => {
            if ends_with("/blogs") {
                Some(1)
            } else if entry.resource_type == ResourceType::Blog {
                Some(2)
            } else if path == home {
                Some(10)
            } else {
                None
            }
        }
        ResourceType::Page => (path == home).then_some(1),
        ResourceType::Other => None,
    }
}

fn any_related<'c>(catalog: &'c Catalog, legacy: &LegacyUrl, domain: &str, prefix: &str) -> Option<&'c CatalogEntry> {
    let mut best: Option<(u8, &CatalogEntry)> = None;
    for entry in catalog.entries().iter().filter(|e| e.domain == domain) {
        if entry.locale != legacy.locale || legacy.is_path(&entry.path) {
            continue;
        }
        let Some(priority) = related_priority(legacy.resource_type, entry, prefix) else {
            continue;
        };
        if best.map_or(true, |(p, _)| priority < p) {
            best = Some((priority, entry));
        }
    }
    best.map(|(_, e)| e)
}

/// Category or homepage redirect when no content match exists.
///
/// Tries the type's fallback paths on the legacy host, then on the `.com`
/// host, then any related `.com` entry, then a synthesized homepage.
pub fn fallback(catalog: &Catalog, legacy: &LegacyUrl, observer: &dyn MatchObserver) -> Option<Match> {
    let prefix = locale_prefix(&legacy.locale);
    let com = catalog.com_domain().filter(|c| *c != legacy.parts.domain);
    let found = |entry: &CatalogEntry, score: u8| {
        observer.on_event(MatchEvent::Candidate {
            strategy: Strategy::Fallback,
            old_url: legacy.url.to_string(),
            candidate: entry.url.clone(),
            similarity: 0.0,
            score: f64::from(score),
        });
        Some(Match {
            url: entry.url.clone(),
            score,
            strategy: Strategy::Fallback,
        })
    };

    for (path, score) in fallback_paths(legacy.resource_type, &prefix) {
        if let Some(entry) = catalog.find_by_path(&legacy.parts.domain, &path) {
            if !legacy.is_path(&entry.path) {
                return found(entry, score);
            }
        }
        if let Some(entry) = com.and_then(|com| catalog.find_by_path(com, &path)) {
            if !legacy.is_path(&entry.path) {
                return found(entry, score.saturating_sub(5));
            }
        }
    }

    if let Some(entry) = com.and_then(|com| any_related(catalog, legacy, com, &prefix)) {
        return found(entry, 20);
    }

    synthesized_homepage(catalog, legacy)
}

fn synthesized_homepage(catalog: &Catalog, legacy: &LegacyUrl) -> Option<Match> {
    let locale = if catalog.has_locale(&legacy.locale) {
        legacy.locale.as_str()
    } else {
        DEFAULT_LOCALE
    };
    let origin = if catalog.has_domain(&legacy.parts.domain) {
        legacy.parts.origin.as_str()
    } else {
        catalog.base_origin_for_locale(locale)?
    };
    let path = format!("{}/", locale_prefix(locale));
    if legacy.is_path(&path) {
        return None;
    }
    let score = if legacy.resource_type == ResourceType::Other { 20 } else { 25 };
    Some(Match {
        url: format!("{origin}{path}"),
        score,
        strategy: Strategy::Fallback,
    })
}
