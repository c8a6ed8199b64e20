//! Configuration for the page crawler.

use serde::{Deserialize, Serialize};

/// Crawler limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Link depth followed from each seed page (seed = 0)
    pub max_depth: u32,
    /// Page fetch ceiling per crawl
    pub max_pages: usize,
    /// Per-request timeout
    pub timeout_seconds: u64,
    /// Follow `<a>` links only within the seed's host. Iframes are always followed.
    pub same_host_only: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: 2,
            max_pages: 50,
            timeout_seconds: 10,
            same_host_only: true,
        }
    }
}
