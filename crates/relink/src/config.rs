//! Runtime configuration.
//!
//! Layered: built-in defaults, then a JSON file, then `RELINK_*` environment
//! variables, then command-line flags (applied by the caller).

use crate::acquisition::http_client::HttpFetcherOptions;
use crate::cartography::sitemap::SitemapOptions;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE: &str = "config.json";

/// Default data directory: `$RELINK_DATA_DIR`, else `~/.relink`.
pub fn relink_home() -> PathBuf {
    if let Ok(p) = std::env::var("RELINK_DATA_DIR") {
        return PathBuf::from(p);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join(".relink")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_dir: PathBuf,
    pub fetch_timeout_secs: u64,
    pub accept_invalid_certs: bool,
    pub user_agent: String,
    pub child_delay_ms: u64,
    pub fast_mode_threshold: usize,
    pub fast_mode_sample_size: usize,
    pub max_index_depth: usize,
    pub retention_hours: i64,
    pub parallel: bool,
}

impl Default for Config {
    fn default() -> Self {
        let sitemap = SitemapOptions::default();
        let http = HttpFetcherOptions::default();
        Self {
            data_dir: relink_home(),
            fetch_timeout_secs: http.timeout.as_secs(),
            accept_invalid_certs: http.accept_invalid_certs,
            user_agent: http.user_agent,
            child_delay_ms: sitemap.child_delay_ms,
            fast_mode_threshold: sitemap.fast_mode_threshold,
            fast_mode_sample_size: sitemap.fast_mode_sample_size,
            max_index_depth: sitemap.max_index_depth,
            retention_hours: 24,
            parallel: true,
        }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit `path` must exist; otherwise `<data_dir>/config.json` is
    /// read when present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => {
                let default_path = relink_home().join(CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("invalid config: {}", path.display()))
    }

    /// Apply `RELINK_*` overrides using `lookup` to read variables.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("RELINK_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(v) = lookup("RELINK_FETCH_TIMEOUT") {
            self.fetch_timeout_secs = v.trim().parse().context("invalid RELINK_FETCH_TIMEOUT")?;
        }
        if let Some(v) = lookup("RELINK_CHILD_DELAY_MS") {
            self.child_delay_ms = v.trim().parse().context("invalid RELINK_CHILD_DELAY_MS")?;
        }
        if let Some(v) = lookup("RELINK_FAST_MODE_SAMPLE") {
            self.fast_mode_sample_size = v.trim().parse().context("invalid RELINK_FAST_MODE_SAMPLE")?;
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("relink.db")
    }

    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::hours(self.retention_hours)
    }

    pub fn http_options(&self) -> HttpFetcherOptions {
        HttpFetcherOptions {
            timeout: Duration::from_secs(self.fetch_timeout_secs),
            accept_invalid_certs: self.accept_invalid_certs,
            user_agent: self.user_agent.clone(),
        }
    }

    pub fn sitemap_options(&self) -> SitemapOptions {
        SitemapOptions {
            child_delay_ms: self.child_delay_ms,
            fast_mode_threshold: self.fast_mode_threshold,
            fast_mode_sample_size: self.fast_mode_sample_size,
            max_index_depth: self.max_index_depth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.fetch_timeout_secs, 30);
        assert!(config.accept_invalid_certs);
        assert_eq!(config.child_delay_ms, 200);
        assert_eq!(config.fast_mode_threshold, 10);
        assert_eq!(config.fast_mode_sample_size, 50);
        assert_eq!(config.retention(), chrono::Duration::hours(24));
        assert!(config.database_path().ends_with("relink.db"));
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "child_delay_ms": 0, "parallel": false }"#).unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.child_delay_ms, 0);
        assert!(!config.parallel);
        assert_eq!(config.fast_mode_sample_size, 50);
    }

    #[test]
    fn test_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(Config::from_file(&path).is_err());
        assert!(Config::load(Some(&dir.path().join("missing.json"))).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("RELINK_DATA_DIR", "/srv/relink"),
            ("RELINK_FETCH_TIMEOUT", "5"),
            ("RELINK_FAST_MODE_SAMPLE", " 20 "),
        ]);
        let mut config = Config::default();
        config.apply_env(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/relink"));
        assert_eq!(config.http_options().timeout, Duration::from_secs(5));
        assert_eq!(config.sitemap_options().fast_mode_sample_size, 20);
        assert_eq!(config.child_delay_ms, 200);

        let mut config = Config::default();
        let bad = config.apply_env(|k| (k == "RELINK_CHILD_DELAY_MS").then(|| "soon".to_string()));
        assert!(bad.is_err());
    }
}
