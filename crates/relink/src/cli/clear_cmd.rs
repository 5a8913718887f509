//! `relink clear` and `relink purge`.

use crate::cli::output::{self, Styled};
use crate::cli::Workspace;
use crate::store::{SqliteUrlStore, UrlStore};
use anyhow::Result;

/// Delete every record of the current session.
pub async fn run_clear(ws: &Workspace) -> Result<()> {
    let s = Styled::new();
    let removed = ws.store()?.clear(&ws.session)?;

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "session": ws.session.as_str(),
            "cleared_count": removed,
        }));
    } else if !output::is_quiet() {
        if removed > 0 {
            eprintln!("  {} Cleared {removed} URL(s) from session {}.", s.ok_sym(), ws.session);
        } else {
            eprintln!("  No URLs to clear.");
        }
    }
    Ok(())
}

/// Delete records of every session older than the retention window.
pub async fn run_purge(ws: &Workspace) -> Result<()> {
    let s = Styled::new();
    let retention = ws.config.retention();
    let removed = SqliteUrlStore::connect(&ws.config.database_path())?.purge_expired(retention)?;

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "purged_count": removed,
            "retention_hours": ws.config.retention_hours,
        }));
    } else if !output::is_quiet() {
        eprintln!(
            "  {} Purged {removed} record(s) older than {}h.",
            s.ok_sym(),
            ws.config.retention_hours
        );
    }
    Ok(())
}
