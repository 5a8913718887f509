//! Cartography: sitemap fetching, URL classification and catalog assembly.

pub mod catalog;
pub mod rate_limiter;
pub mod sitemap;
pub mod url_classifier;
