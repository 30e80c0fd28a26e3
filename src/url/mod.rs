//! URL handling module for Harvest-Index
//!
//! This module provides site-authority extraction (the crawl's notion of
//! "domain") and link resolution for hrefs found in fetched pages.

mod domain;
mod normalize;

// Re-export main functions
pub use domain::{is_same_site, site_authority};
pub use normalize::resolve_link;
