//! Relink: match a storefront's legacy URLs to the pages of its new sitemap
//! and export a two-column redirect map.

pub mod acquisition;
pub mod cartography;
pub mod cli;
pub mod config;
pub mod export;
pub mod matching;
pub mod navigation;
pub mod store;
