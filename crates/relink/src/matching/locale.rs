//! Locale normalization for a match run.
//!
//! Legacy sites often use region-qualified prefixes (`/en-pt/`, `/de-de/`)
//! that the new catalog does not have. The resolver collapses those to the
//! base language while leaving every locale the catalog does carry alone.

use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Normalization state for one match run.
#[derive(Debug, Clone, Default)]
pub struct LocaleResolver {
    catalog_locales: HashSet<String>,
    available: Vec<String>,
    map: BTreeMap<String, String>,
}

/// Locale summary reported after a catalog is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocaleStats {
    pub available_locales: Vec<String>,
    pub locale_count: usize,
    pub normalization_map: BTreeMap<String, String>,
}

fn base_locale(locale: &str) -> Option<&str> {
    locale.split_once('-').map(|(base, _)| base)
}

impl LocaleResolver {
    /// Build the normalization map from the legacy locales and the catalog's locales.
    ///
    /// Only dashed legacy locales missing from the catalog are mapped.
    pub fn build<I, J, S, T>(legacy_locales: I, catalog_locales: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        let mut resolver = Self::default();
        for locale in catalog_locales {
            let locale = locale.as_ref();
            if resolver.catalog_locales.insert(locale.to_string()) {
                resolver.available.push(locale.to_string());
            }
        }
        for locale in legacy_locales {
            let locale = locale.as_ref();
            if resolver.catalog_locales.contains(locale) {
                continue;
            }
            if let Some(base) = base_locale(locale) {
                resolver.map.insert(locale.to_string(), base.to_string());
            }
        }
        resolver
    }

    /// Map a detected locale onto the locale used for matching.
    pub fn normalize(&self, locale: &str) -> String {
        if let Some(mapped) = self.map.get(locale) {
            return mapped.clone();
        }
        if self.catalog_locales.contains(locale) {
            return locale.to_string();
        }
        base_locale(locale).unwrap_or(locale).to_string()
    }

    pub fn normalization_map(&self) -> &BTreeMap<String, String> {
        &self.map
    }

    pub fn stats(&self) -> LocaleStats {
        LocaleStats {
            available_locales: self.available.clone(),
            locale_count: self.available.len(),
            normalization_map: self.map.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> LocaleResolver {
        LocaleResolver::build(
            ["en-pt", "de-de", "fr", "cs", "en-gb", "default"],
            ["default", "en-gb", "fr", "de"],
        )
    }

    #[test]
    fn test_map_only_covers_missing_dashed_locales() {
        let r = resolver();
        let map = r.normalization_map();
        assert_eq!(map.get("en-pt").map(String::as_str), Some("en"));
        assert_eq!(map.get("de-de").map(String::as_str), Some("de"));
        assert!(!map.contains_key("en-gb"));
        assert!(!map.contains_key("cs"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_normalize() {
        let r = resolver();
        assert_eq!(r.normalize("en-pt"), "en");
        assert_eq!(r.normalize("en-gb"), "en-gb");
        assert_eq!(r.normalize("fr"), "fr");
        assert_eq!(r.normalize("cs"), "cs");
        assert_eq!(r.normalize("default"), "default");
        // never seen in either set
        assert_eq!(r.normalize("pt-br"), "pt");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let r = resolver();
        for locale in ["en-pt", "de-de", "en-gb", "fr", "cs", "pt-br", "default", "x-y", "zz"] {
            let once = r.normalize(locale);
            assert_eq!(r.normalize(&once), once, "{locale}");
        }
    }

    #[test]
    fn test_stats() {
        let stats = resolver().stats();
        assert_eq!(stats.available_locales, ["default", "en-gb", "fr", "de"]);
        assert_eq!(stats.locale_count, 4);
        assert_eq!(stats.normalization_map.len(), 2);
    }
}
