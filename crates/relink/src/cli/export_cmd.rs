//! `relink export` — write the redirect CSV.

use crate::cli::output::{self, Styled};
use crate::cli::Workspace;
use crate::export;
use crate::store::UrlStore;
use anyhow::Result;
use std::path::PathBuf;

/// Export matched redirects to `out`, `-` for stdout, or a timestamped file.
pub async fn run(ws: &Workspace, out: Option<PathBuf>) -> Result<()> {
    let s = Styled::new();
    let records = ws.store()?.matched_for_session(&ws.session)?;

    if out.as_deref().is_some_and(|p| p.as_os_str() == "-") {
        export::write_redirects(std::io::stdout().lock(), &records)?;
        return Ok(());
    }

    let path = out.unwrap_or_else(|| PathBuf::from(export::default_file_name(chrono::Utc::now())));
    let written = export::export_to_file(&path, &records)?;

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "path": path.display().to_string(),
            "redirects": written,
        }));
    } else if !output::is_quiet() {
        if written == 0 {
            eprintln!("  {} No matched URLs; wrote header only to {}.", s.warn_sym(), path.display());
        } else {
            eprintln!("  {} Wrote {written} redirect(s) to {}.", s.ok_sym(), path.display());
        }
    }
    Ok(())
}
