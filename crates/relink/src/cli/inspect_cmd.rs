//! `relink inspect` — show what a sitemap catalog contains without matching.

use crate::cli::output::{self, Styled};
use crate::cli::Workspace;
use crate::matching::LocaleResolver;
use crate::matching::strategies::legacy_locale;
use crate::store::UrlStore;
use anyhow::Result;

pub async fn run(ws: &Workspace, sitemaps: &[String], fast_mode: Option<usize>) -> Result<()> {
    let s = Styled::new();
    let catalog = ws.load_catalog(sitemaps, fast_mode).await?;

    // Locales of queued URLs, when there are any, show how they would normalize.
    let records = ws.store()?.all_for_session(&ws.session)?;
    let legacy: Vec<String> = records.iter().map(|r| legacy_locale(&r.old_url)).collect();
    let locale_stats = LocaleResolver::build(&legacy, catalog.locales()).stats();

    let types: serde_json::Map<String, serde_json::Value> = catalog
        .type_counts()
        .into_iter()
        .map(|(t, n)| (t.to_string(), n.into()))
        .collect();

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "entries": catalog.len(),
            "sitemaps": catalog.sitemap_count(),
            "domains": catalog.domains(),
            "multi_domain": catalog.is_multi_domain(),
            "types": types,
            "locale_counts": catalog.locale_counts(),
            "locales": locale_stats,
        }));
        return Ok(());
    }

    output::print_header(&s);
    if catalog.is_empty() {
        eprintln!("  {} No entries found.", s.fail_sym());
        for cause in crate::cli::EMPTY_CATALOG_CAUSES {
            output::print_detail(&format!("- {cause}"));
        }
        return Ok(());
    }

    output::print_section(&s, "Catalog");
    output::print_check(s.ok_sym(), "entries", &catalog.len().to_string());
    output::print_check(s.ok_sym(), "sitemaps", &catalog.sitemap_count().to_string());
    let domain_sym = if catalog.is_multi_domain() { s.warn_sym() } else { s.ok_sym() };
    output::print_check(domain_sym, "domains", &catalog.domains().join(", "));
    eprintln!();

    output::print_section(&s, "Types");
    for (kind, count) in catalog.type_counts() {
        output::print_check(s.ok_sym(), kind.as_str(), &count.to_string());
    }
    eprintln!();

    output::print_section(&s, "Locales");
    for (locale, count) in catalog.locale_counts() {
        output::print_check(s.ok_sym(), &locale, &count.to_string());
    }
    if !locale_stats.normalization_map.is_empty() {
        eprintln!();
        output::print_section(&s, "Normalization");
        for (from, to) in &locale_stats.normalization_map {
            output::print_check(s.warn_sym(), from, to);
        }
    }
    Ok(())
}
