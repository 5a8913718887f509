//! HTTP fetching for sitemap documents.
//!
//! The sitemap parser only needs "GET this URL, give me the body bytes".
//! `HttpFetcher` does that over `reqwest`; `StaticFetcher` serves canned
//! bodies from memory.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Why a fetch produced no body.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error for {url}: {message}")]
    Transport { url: String, message: String },
    #[error("request to {url} timed out")]
    Timeout { url: String },
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },
    #[error("empty response body for {url}")]
    EmptyBody { url: String },
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// Something that can GET a URL and return the raw body.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `url`. Only a 200 response with a non-empty body is a success.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Settings for [`HttpFetcher`].
#[derive(Debug, Clone)]
pub struct HttpFetcherOptions {
    pub timeout: Duration,
    pub accept_invalid_certs: bool,
    pub user_agent: String,
}

impl Default for HttpFetcherOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            accept_invalid_certs: true,
            user_agent: format!("relink/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// `reqwest`-backed fetcher.
///
/// Bodies are returned as sent; gzip detection happens in the sitemap parser.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(options: &HttpFetcherOptions) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(options.timeout)
            .danger_accept_invalid_certs(options.accept_invalid_certs)
            .user_agent(options.user_agent.as_str())
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let resp = self.client.get(url).send().await.map_err(|e| map_reqwest(url, e))?;

        let status = resp.status().as_u16();
        if status != 200 {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = resp.bytes().await.map_err(|e| map_reqwest(url, e))?;
        if body.is_empty() {
            return Err(FetchError::EmptyBody {
                url: url.to_string(),
            });
        }

        debug!(url, bytes = body.len(), "fetched");
        Ok(body.to_vec())
    }
}

fn map_reqwest(url: &str, err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Transport {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

/// In-memory fetcher keyed by exact URL. Unknown URLs answer 404.
#[derive(Default)]
pub struct StaticFetcher {
    bodies: HashMap<String, Vec<u8>>,
    requests: Mutex<Vec<String>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a body for `url`.
    pub fn with(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.bodies.insert(url.to_string(), body.into());
        self
    }

    /// URLs requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(url.to_string());
        }
        match self.bodies.get(url) {
            Some(body) if body.is_empty() => Err(FetchError::EmptyBody {
                url: url.to_string(),
            }),
            Some(body) => Ok(body.clone()),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}
