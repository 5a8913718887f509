//! `relink add` — queue legacy URLs for matching.

use crate::cli::output::{self, Styled};
use crate::cli::Workspace;
use crate::store::UrlStore;
use anyhow::{Context, Result};
use std::io::Read;

/// Split input into trimmed lines. Validation is left to the store.
pub fn read_urls(text: &str) -> Vec<String> {
    text.lines().map(|l| l.trim().to_string()).collect()
}

/// Read URLs from `input` (`-` for stdin) and insert them.
pub async fn run(ws: &Workspace, input: &str) -> Result<()> {
    let s = Styled::new();
    let text = if input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read urls from stdin")?;
        buf
    } else {
        std::fs::read_to_string(input).with_context(|| format!("failed to read {input}"))?
    };

    let urls = read_urls(&text);
    let store = ws.store()?;
    let inserted = store.insert_legacy_urls(&ws.session, &urls)?;
    let ignored = urls.iter().filter(|u| !u.is_empty()).count().saturating_sub(inserted);

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "session": ws.session.as_str(),
            "inserted": inserted,
            "ignored": ignored,
        }));
    } else if !output::is_quiet() {
        eprintln!("  {} Added {inserted} legacy URL(s).", s.ok_sym());
        if ignored > 0 {
            eprintln!("  {} Ignored {ignored} line(s) not starting with http.", s.warn_sym());
        }
        if output::is_verbose() {
            eprintln!("  {}", s.dim(&format!("session {}", ws.session)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_urls() {
        let urls = read_urls("https://a.com/x\r\n\n  https://a.com/y  \nnot a url\n");
        assert_eq!(urls, vec!["https://a.com/x", "", "https://a.com/y", "not a url"]);
    }
}
