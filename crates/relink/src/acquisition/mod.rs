//! Fetching sitemap documents over HTTP.

pub mod http_client;
