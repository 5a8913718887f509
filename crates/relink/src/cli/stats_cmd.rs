//! `relink stats` and `relink list`.

use crate::cli::output::{self, Styled};
use crate::cli::Workspace;
use crate::store::stats::SessionStats;
use crate::store::{LegacyUrlRecord, UrlStore};
use anyhow::Result;

/// Score statistics for the current session.
pub async fn run(ws: &Workspace) -> Result<()> {
    let s = Styled::new();
    let records = ws.store()?.all_for_session(&ws.session)?;
    let stats = SessionStats::from_records(&records);

    if output::is_json() {
        let mut value = serde_json::to_value(&stats)?;
        value["session"] = ws.session.as_str().into();
        value["match_rate"] = stats.match_rate().into();
        output::print_json(&value);
        return Ok(());
    }
    if output::is_quiet() {
        return Ok(());
    }

    output::print_section(&s, &format!("Session {}", ws.session));
    output::print_check(s.ok_sym(), "total", &stats.total.to_string());
    output::print_check(
        s.ok_sym(),
        "matched",
        &format!("{} ({:.1}%)", stats.matched, stats.match_rate() * 100.0),
    );
    let pending_sym = if stats.pending == 0 { s.ok_sym() } else { s.warn_sym() };
    output::print_check(pending_sym, "pending", &stats.pending.to_string());
    output::print_check(s.ok_sym(), "excellent", &format!("{} {}", stats.excellent, s.dim(">=90")));
    output::print_check(s.ok_sym(), "good", &format!("{} {}", stats.good, s.dim("70-89")));
    output::print_check(s.ok_sym(), "fair", &format!("{} {}", stats.fair, s.dim("50-69")));
    output::print_check(s.warn_sym(), "fallback", &format!("{} {}", stats.fallback, s.dim("<50")));
    Ok(())
}

/// Matched records with at least `min_score`, at most `limit` of them.
pub fn filter_matches(records: Vec<LegacyUrlRecord>, min_score: u8, limit: Option<usize>) -> Vec<LegacyUrlRecord> {
    records
        .into_iter()
        .filter(|r| r.score >= min_score)
        .take(limit.unwrap_or(usize::MAX))
        .collect()
}

/// List matched redirects, best score first.
pub async fn run_list(ws: &Workspace, min_score: u8, limit: Option<usize>) -> Result<()> {
    let s = Styled::new();
    let records = filter_matches(ws.store()?.matched_for_session(&ws.session)?, min_score, limit);

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "session": ws.session.as_str(),
            "count": records.len(),
            "records": records,
        }));
        return Ok(());
    }

    if records.is_empty() {
        if !output::is_quiet() {
            eprintln!("  No matched URLs.");
        }
        return Ok(());
    }
    for r in &records {
        println!(
            "{}  {}  {}",
            s.score(r.score),
            r.old_url,
            r.new_url.as_deref().unwrap_or_default()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(id: i64, score: u8) -> LegacyUrlRecord {
        LegacyUrlRecord {
            id,
            session_id: "s".into(),
            old_url: format!("https://a.com/{id}"),
            new_url: Some("https://b.com/".into()),
            score,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_filter_matches() {
        let records = vec![record(1, 95), record(2, 80), record(3, 40), record(4, 20)];
        let kept = filter_matches(records.clone(), 50, None);
        assert_eq!(kept.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2]);

        let kept = filter_matches(records, 0, Some(3));
        assert_eq!(kept.len(), 3);
    }
}
