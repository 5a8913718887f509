//! Command-line subcommands.

pub mod add_cmd;
pub mod clear_cmd;
pub mod export_cmd;
pub mod inspect_cmd;
pub mod match_cmd;
pub mod output;
pub mod stats_cmd;

use crate::acquisition::http_client::{Fetcher, HttpFetcher};
use crate::cartography::catalog::Catalog;
use crate::cartography::sitemap::SitemapParser;
use crate::config::Config;
use crate::store::{SessionId, SqliteUrlStore};
use anyhow::{bail, Context, Result};
use std::sync::Arc;
use url::Url;

/// Resolved configuration and session shared by every command.
pub struct Workspace {
    pub config: Config,
    pub session: SessionId,
}

impl Workspace {
    /// Use `session` when given, else the id persisted in the data directory.
    pub fn open(config: Config, session: Option<&str>) -> Result<Self> {
        let session = match session {
            Some(id) => SessionId::from(id),
            None => SessionId::load_or_create(&config.data_dir)?,
        };
        Ok(Self { config, session })
    }

    pub fn store(&self) -> Result<SqliteUrlStore> {
        SqliteUrlStore::open(&self.config.database_path(), self.config.retention())
    }

    /// Fetch and combine `sitemaps`. `fast_mode` forces the sample size up front.
    pub async fn load_catalog(&self, sitemaps: &[String], fast_mode: Option<usize>) -> Result<Catalog> {
        validate_sitemap_urls(sitemaps)?;
        let fetcher: Arc<dyn Fetcher> = Arc::new(
            HttpFetcher::new(&self.config.http_options()).context("failed to build http client")?,
        );
        let mut parser = SitemapParser::new(fetcher, self.config.sitemap_options());
        if let Some(n) = fast_mode {
            parser.enable_fast_mode(n);
        }
        Ok(Catalog::load(&mut parser, sitemaps).await)
    }
}

/// Every sitemap location must be an absolute http(s) URL with a host.
pub fn validate_sitemap_urls(sitemaps: &[String]) -> Result<()> {
    if sitemaps.is_empty() {
        bail!("at least one sitemap URL is required");
    }
    for raw in sitemaps {
        let url = Url::parse(raw.trim()).with_context(|| format!("invalid sitemap URL: {raw}"))?;
        if !matches!(url.scheme(), "http" | "https") || !url.has_host() {
            bail!("invalid sitemap URL: {raw} (expected http:// or https://)");
        }
    }
    Ok(())
}

/// Run CPU-heavy work without stalling the other tasks on this worker.
/// Falls back to a plain call on a current-thread runtime.
pub fn cpu_bound<T>(f: impl FnOnce() -> T) -> T {
    use tokio::runtime::{Handle, RuntimeFlavor};
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(f)
        }
        _ => f(),
    }
}

/// Probable causes printed when no catalog entry could be loaded.
pub const EMPTY_CATALOG_CAUSES: [&str; 4] = [
    "the sitemap URL is wrong or not publicly reachable",
    "the store is password protected",
    "the server answered with an error or an empty body",
    "the document is not a sitemap (<urlset> or <sitemapindex>)",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_sitemap_urls() {
        let ok = vec![
            "https://shop.com/sitemap.xml".to_string(),
            "http://shop.de/sitemap_index.xml.gz".to_string(),
        ];
        assert!(validate_sitemap_urls(&ok).is_ok());

        for bad in ["shop.com/sitemap.xml", "ftp://shop.com/sitemap.xml", "file:///tmp/sitemap.xml", "not a url"] {
            assert!(validate_sitemap_urls(&[bad.to_string()]).is_err(), "{bad}");
        }
        assert!(validate_sitemap_urls(&[]).is_err());
    }

    #[tokio::test]
    async fn test_load_catalog_rejects_bad_urls_before_fetching() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            data_dir: dir.path().to_path_buf(),
            ..Config::default()
        };
        let ws = Workspace::open(config, Some("s")).unwrap();
        let err = ws.load_catalog(&["sitemap.xml".to_string()], None).await.unwrap_err();
        assert!(err.to_string().contains("invalid sitemap URL"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cpu_bound_on_multi_thread_runtime() {
        let sum = cpu_bound(|| (1..=100u32).sum::<u32>());
        assert_eq!(sum, 5050);
    }

    #[tokio::test]
    async fn test_cpu_bound_on_current_thread_runtime() {
        assert_eq!(cpu_bound(|| "done"), "done");
    }

    #[test]
    fn test_cpu_bound_outside_runtime() {
        assert_eq!(cpu_bound(|| 7), 7);
    }

    #[test]
    fn test_workspace_session_override() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            data_dir: dir.path().to_path_buf(),
            ..Config::default()
        };

        let ws = Workspace::open(config.clone(), Some("fixed")).unwrap();
        assert_eq!(ws.session.as_str(), "fixed");
        assert!(!dir.path().join("session").exists());

        let first = Workspace::open(config.clone(), None).unwrap();
        let second = Workspace::open(config, None).unwrap();
        assert_eq!(first.session, second.session);
        assert!(first.store().is_ok());
        assert!(dir.path().join("relink.db").exists());
    }
}
