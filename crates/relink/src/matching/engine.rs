//! The match pipeline: hreflang, same domain, locale domain, cross domain,
//! fallback. The first strategy that produces a target wins.

use crate::cartography::catalog::Catalog;
use crate::cartography::url_classifier::is_locale_only_path;
use crate::matching::locale::LocaleResolver;
use crate::matching::strategies::{self, legacy_locale, LegacyUrl, Match};
use crate::matching::trace::{MatchEvent, MatchObserver, SkipReason, TracingObserver};
use crate::store::{LegacyUrlRecord, SessionId, UrlStore};
use rayon::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Result of running the pipeline on one legacy URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Matched(Match),
    Skipped(SkipReason),
    NoMatch,
}

impl Outcome {
    pub fn matched(&self) -> Option<&Match> {
        match self {
            Outcome::Matched(m) => Some(m),
            _ => None,
        }
    }
}

/// Matches legacy URLs against one catalog.
pub struct MatchEngine<'c> {
    catalog: &'c Catalog,
    observer: Arc<dyn MatchObserver>,
    parallel: bool,
}

impl<'c> MatchEngine<'c> {
    pub fn new(catalog: &'c Catalog) -> Self {
        Self {
            catalog,
            observer: Arc::new(TracingObserver),
            parallel: true,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn MatchObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Evaluate records on the rayon pool. Results are identical either way.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Build the locale normalization for a set of legacy URLs.
    pub fn resolver_for<'u, I>(&self, old_urls: I) -> LocaleResolver
    where
        I: IntoIterator<Item = &'u str>,
    {
        let legacy_locales: Vec<String> = old_urls.into_iter().map(legacy_locale).collect();
        LocaleResolver::build(legacy_locales, self.catalog.locales())
    }

    /// Match a single URL on its own.
    pub fn match_url(&self, old_url: &str) -> Option<Match> {
        let resolver = self.resolver_for([old_url]);
        match self.evaluate(old_url, &resolver) {
            Outcome::Matched(m) => Some(m),
            _ => None,
        }
    }

    /// Run the pipeline on one URL with a prepared resolver.
    pub fn evaluate(&self, old_url: &str, resolver: &LocaleResolver) -> Outcome {
        let outcome = self.run_pipeline(old_url, resolver);
        let event = match &outcome {
            Outcome::Matched(m) => MatchEvent::Matched {
                strategy: m.strategy,
                old_url: old_url.to_string(),
                new_url: m.url.clone(),
                score: m.score,
            },
            Outcome::Skipped(reason) => MatchEvent::Skipped {
                old_url: old_url.to_string(),
                reason: *reason,
            },
            Outcome::NoMatch => MatchEvent::NoMatch {
                old_url: old_url.to_string(),
            },
        };
        self.observer.on_event(event);
        outcome
    }

    fn run_pipeline(&self, old_url: &str, resolver: &LocaleResolver) -> Outcome {
        let catalog = self.catalog;
        let observer = self.observer.as_ref();
        let Some(legacy) = LegacyUrl::parse(old_url, resolver) else {
            return Outcome::Skipped(SkipReason::Unparsable);
        };
        let multi_domain = catalog.is_multi_domain();

        if multi_domain && is_locale_only_path(&legacy.parts.path) {
            return Outcome::Skipped(SkipReason::LocaleOnlyPath);
        }

        let direct = strategies::hreflang(catalog, &legacy, observer)
            .or_else(|| strategies::same_domain(catalog, &legacy, observer))
            .or_else(|| strategies::locale_domain(catalog, &legacy, observer));
        if let Some(m) = direct {
            return Outcome::Matched(m);
        }

        if multi_domain && strategies::identical_path_on_com(catalog, &legacy) {
            return Outcome::Skipped(SkipReason::IdenticalPathOnCom);
        }

        strategies::cross_domain(catalog, &legacy, observer)
            .or_else(|| strategies::fallback(catalog, &legacy, observer))
            .map_or(Outcome::NoMatch, Outcome::Matched)
    }

    /// Evaluate `records` and write every match back through `store`.
    ///
    /// Returns how many records were updated. An empty catalog matches
    /// nothing; store failures are logged and the record is not counted.
    pub fn match_all(&self, session: &SessionId, records: &[LegacyUrlRecord], store: &dyn UrlStore) -> usize {
        if self.catalog.is_empty() {
            warn!("catalog is empty, nothing to match against");
            return 0;
        }

        let start = Instant::now();
        let resolver = self.resolver_for(records.iter().map(|r| r.old_url.as_str()));
        let outcomes: Vec<Outcome> = if self.parallel {
            records
                .par_iter()
                .map(|r| self.evaluate(&r.old_url, &resolver))
                .collect()
        } else {
            records.iter().map(|r| self.evaluate(&r.old_url, &resolver)).collect()
        };

        let mut matched = 0;
        let mut skipped = 0;
        for (record, outcome) in records.iter().zip(outcomes) {
            match outcome {
                Outcome::Matched(m) => match store.update_match(session, record.id, &m.url, m.score) {
                    Ok(()) => matched += 1,
                    Err(e) => warn!(id = record.id, error = %e, "failed to store match"),
                },
                Outcome::Skipped(_) => skipped += 1,
                Outcome::NoMatch => {}
            }
        }

        info!(
            session = %session,
            records = records.len(),
            matched,
            skipped,
            catalog = self.catalog.len(),
            normalized_locales = resolver.normalization_map().len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "match run finished"
        );
        matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartography::sitemap::{HreflangMap, RawSitemapEntry};
    use crate::matching::strategies::Strategy;
    use crate::matching::trace::RecordingObserver;
    use crate::store::SqliteUrlStore;

    fn catalog(urls: &[&str]) -> Catalog {
        Catalog::from_entries(urls.iter().map(|u| RawSitemapEntry::new(u, HreflangMap::new())).collect())
    }

    fn seeded(store: &SqliteUrlStore, session: &SessionId, urls: &[&str]) -> Vec<LegacyUrlRecord> {
        let urls: Vec<String> = urls.iter().map(|s| s.to_string()).collect();
        store.insert_legacy_urls(session, &urls).unwrap();
        store.all_for_session(session).unwrap()
    }

    #[test]
    fn test_hreflang_wins_first() {
        let cat = Catalog::from_entries(vec![
            RawSitemapEntry::new(
                "https://shop.com/en-pt/products/widget",
                HreflangMap::from([("en", "https://shop.com/products/widget")]),
            ),
            RawSitemapEntry::new("https://shop.com/products/widget", HreflangMap::new()),
        ]);
        let engine = MatchEngine::new(&cat);
        let m = engine.match_url("https://shop.com/en-pt/products/widget").unwrap();
        assert_eq!(m.url, "https://shop.com/products/widget");
        assert_eq!(m.score, 100);
        assert_eq!(m.strategy, Strategy::Hreflang);
    }

    #[test]
    fn test_foreign_host_goes_cross_domain() {
        let cat = catalog(&[
            "https://shop.de/fr/products/blue-widgets",
            "https://shop.de/fr/pages/contact",
        ]);
        let obs = Arc::new(RecordingObserver::new());
        let engine = MatchEngine::new(&cat).with_observer(obs.clone());

        let old = "https://shop.fr/fr/products/blue-widget";
        let m = engine.match_url(old).unwrap();
        assert_eq!(m.strategy, Strategy::CrossDomain);
        assert_eq!(m.url, "https://shop.de/fr/products/blue-widgets");

        let strategies: Vec<Strategy> = obs
            .events_for(old)
            .iter()
            .filter_map(|e| match e {
                MatchEvent::Candidate { strategy, .. } => Some(*strategy),
                _ => None,
            })
            .collect();
        assert!(!strategies.contains(&Strategy::SameDomain));
    }

    #[test]
    fn test_same_host_guarantee() {
        let cat = catalog(&[
            "https://shop.com/products/blue-widget",
            "https://shop.de/products/blue-widget",
            "https://shop.de/products/red-widget",
        ]);
        let engine = MatchEngine::new(&cat);
        let m = engine.match_url("https://shop.de/products/red-widgets").unwrap();
        assert_eq!(m.strategy, Strategy::SameDomain);
        assert_eq!(m.url, "https://shop.de/products/red-widget");
    }

    #[test]
    fn test_multi_domain_skips() {
        let cat = catalog(&[
            "https://shop.com/tr/products/a",
            "https://shop.com/cs/collections/konopny-caj",
            "https://shop.pt/pt/products/b",
        ]);
        let obs = Arc::new(RecordingObserver::new());
        let engine = MatchEngine::new(&cat).with_observer(obs.clone());
        let resolver = engine.resolver_for(["https://shop.pt/tr", "https://shop.pt/cs/collections/konopny-caj"]);

        assert_eq!(
            engine.evaluate("https://shop.pt/tr", &resolver),
            Outcome::Skipped(SkipReason::LocaleOnlyPath)
        );
        assert_eq!(
            engine.evaluate("https://shop.pt/cs/collections/konopny-caj/", &resolver),
            Outcome::Skipped(SkipReason::IdenticalPathOnCom)
        );
        assert_eq!(
            engine.evaluate("not a url", &resolver),
            Outcome::Skipped(SkipReason::Unparsable)
        );
    }

    #[test]
    fn test_empty_catalog_matches_nothing() {
        let cat = Catalog::default();
        let store = SqliteUrlStore::open_in_memory().unwrap();
        let session = SessionId::new();
        let records = seeded(&store, &session, &["https://shop.com/products/a"]);

        assert_eq!(MatchEngine::new(&cat).match_all(&session, &records, &store), 0);
        assert!(store.matched_for_session(&session).unwrap().is_empty());
    }

    #[test]
    fn test_match_all_writes_back() {
        let cat = catalog(&[
            "https://shop.com/products/blue-widget",
            "https://shop.com/collections/all",
            "https://shop.com/",
        ]);
        let store = SqliteUrlStore::open_in_memory().unwrap();
        let session = SessionId::new();
        let other = SessionId::new();
        let records = seeded(
            &store,
            &session,
            &[
                "https://shop.com/products/blue-widget",
                "https://shop.com/products/something-else-entirely",
                "https://shop.com/",
            ],
        );
        seeded(&store, &other, &["https://shop.com/products/blue-widget"]);

        let n = MatchEngine::new(&cat).match_all(&session, &records, &store);
        assert_eq!(n, 3);

        let matched = store.matched_for_session(&session).unwrap();
        let target = |old: &str| {
            matched
                .iter()
                .find(|r| r.old_url == old)
                .map(|r| (r.new_url.clone().unwrap_or_default(), r.score))
        };
        assert_eq!(
            target("https://shop.com/products/blue-widget"),
            Some(("https://shop.com/products/blue-widget".to_string(), 95))
        );
        assert_eq!(
            target("https://shop.com/products/something-else-entirely"),
            Some(("https://shop.com/collections/all".to_string(), 40))
        );
        assert_eq!(matched.last().map(|r| r.score), Some(40));
        assert!(store.matched_for_session(&other).unwrap().is_empty());
    }

    #[test]
    fn test_match_all_is_deterministic() {
        let cat = catalog(&[
            "https://shop.com/products/widget-a",
            "https://shop.com/products/widget-b",
            "https://shop.de/de/products/widget-a",
            "https://shop.com/collections/all",
        ]);
        let urls = [
            "https://shop.com/products/widget",
            "https://shop.com/products/widget",
            "https://shop.de/de/products/widget",
            "https://shop.com/pages/about",
        ];

        let run = |parallel: bool| {
            let store = SqliteUrlStore::open_in_memory().unwrap();
            let session = SessionId::from("s");
            let records = seeded(&store, &session, &urls);
            MatchEngine::new(&cat).parallel(parallel).match_all(&session, &records, &store);
            store
                .all_for_session(&session)
                .unwrap()
                .into_iter()
                .map(|r| (r.id, r.new_url, r.score))
                .collect::<Vec<_>>()
        };

        let first = run(true);
        assert_eq!(first, run(true));
        assert_eq!(first, run(false));
        let twins: Vec<_> = first.iter().filter(|(id, _, _)| *id <= 2).collect();
        assert_eq!(twins[0].1, twins[1].1);
        assert_eq!(twins[0].2, twins[1].2);
    }
}
