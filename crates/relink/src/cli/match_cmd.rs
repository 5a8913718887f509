//! `relink match` — load the sitemap catalog and match every queued URL.

use crate::cli::output::{self, Styled};
use crate::cli::{Workspace, EMPTY_CATALOG_CAUSES};
use crate::matching::MatchEngine;
use crate::store::stats::SessionStats;
use crate::store::UrlStore;
use anyhow::{bail, Result};
use std::time::Instant;

pub async fn run(ws: &Workspace, sitemaps: &[String], fast_mode: Option<usize>) -> Result<()> {
    let s = Styled::new();
    let start = Instant::now();

    let store = ws.store()?;
    let records = store.all_for_session(&ws.session)?;
    if records.is_empty() {
        bail!("no legacy URLs in session {}; run `relink add` first", ws.session);
    }

    if !output::is_quiet() && !output::is_json() {
        output::print_header(&s);
        eprintln!("  Loading {} sitemap(s)...", sitemaps.len());
    }

    let catalog = ws.load_catalog(sitemaps, fast_mode).await?;
    if catalog.is_empty() {
        if output::is_json() {
            output::print_json(&serde_json::json!({
                "error": "empty_catalog",
                "message": "catalog could not be loaded",
                "probable_causes": EMPTY_CATALOG_CAUSES,
            }));
        } else if !output::is_quiet() {
            eprintln!("  {} Catalog could not be loaded.", s.fail_sym());
            for cause in EMPTY_CATALOG_CAUSES {
                output::print_detail(&format!("- {cause}"));
            }
        }
        bail!("catalog could not be loaded");
    }

    let engine = MatchEngine::new(&catalog).parallel(ws.config.parallel);
    let locale_stats = engine
        .resolver_for(records.iter().map(|r| r.old_url.as_str()))
        .stats();
    let matched = super::cpu_bound(|| engine.match_all(&ws.session, &records, &store));
    let stats = SessionStats::from_records(&store.all_for_session(&ws.session)?);
    let elapsed = start.elapsed().as_secs();

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "session": ws.session.as_str(),
            "catalog_entries": catalog.len(),
            "sitemaps": catalog.sitemap_count(),
            "records": records.len(),
            "matched": matched,
            "locales": locale_stats,
            "stats": stats,
            "elapsed_secs": elapsed,
        }));
        return Ok(());
    }
    if output::is_quiet() {
        return Ok(());
    }

    output::print_section(&s, "Catalog");
    output::print_check(s.ok_sym(), "entries", &catalog.len().to_string());
    output::print_check(s.ok_sym(), "sitemaps", &catalog.sitemap_count().to_string());
    output::print_check(s.ok_sym(), "domains", &catalog.domains().join(", "));
    output::print_check(s.ok_sym(), "locales", &locale_stats.available_locales.join(", "));
    for (from, to) in &locale_stats.normalization_map {
        output::print_detail(&s.dim(&format!("{from} -> {to}")));
    }
    eprintln!();

    output::print_section(&s, "Matches");
    let sym = if matched == records.len() { s.ok_sym() } else { s.warn_sym() };
    output::print_check(sym, "matched", &format!("{matched}/{}", records.len()));
    output::print_check(s.ok_sym(), "excellent", &stats.excellent.to_string());
    output::print_check(s.ok_sym(), "good", &stats.good.to_string());
    output::print_check(s.ok_sym(), "fair", &stats.fair.to_string());
    output::print_check(s.warn_sym(), "fallback", &stats.fallback.to_string());
    eprintln!();
    eprintln!(
        "  Done in {}. Run {} to write the redirect file.",
        output::format_duration(elapsed),
        s.bold("relink export")
    );
    Ok(())
}
