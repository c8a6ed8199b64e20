//! Candidate stream discovery.
//!
//! Crawls seed pages for URLs with streaming container extensions. The pool
//! never crawls itself; discovery runs only when the pool asks for more
//! candidates, or once up front from the CLI.

mod config;
mod error;
mod parser;


pub use config::CrawlerConfig;
pub use error::DiscoveryError;
pub use parser::{
    extract_links, is_stream_content_type, is_stream_url, PageLink, PageLinks, STREAM_EXTENSIONS,
};

use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::time::Duration;
use url::Url;

/// Crawling collaborator: finds candidate stream URLs reachable from a seed page.
#[async_trait]
pub trait StreamDiscovery: Send + Sync + 'static {
    /// Distinct stream URLs found within `max_depth` links of `seed_url`, in
    /// discovery order.
    async fn discover(&self, seed_url: &str, max_depth: u32) -> Result<Vec<String>, DiscoveryError>;
}

/// Breadth-first HTML crawler over plain HTTP.
pub struct HttpCrawler {
    client: reqwest::Client,
    config: CrawlerConfig,
}

impl HttpCrawler {
    /// Create a crawler with a default HTTP client.
    pub fn new(config: CrawlerConfig) -> Result<Self, DiscoveryError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("streamfox/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| DiscoveryError::Client(e.to_string()))?;
        Ok(Self::with_client(client, config))
    }

    /// Create a crawler with a custom HTTP client (for testing).
    pub fn with_client(client: reqwest::Client, config: CrawlerConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &CrawlerConfig {
        &self.config
    }

    fn parse_seed(seed_url: &str) -> Result<Url, DiscoveryError> {
        let url = Url::parse(seed_url).map_err(|e| DiscoveryError::InvalidSeed {
            url: seed_url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(DiscoveryError::InvalidSeed {
                url: seed_url.to_string(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }
        Ok(url)
    }

    /// Fetch one page. Stream responses yield the page URL itself.
    async fn fetch(&self, url: &Url) -> Result<PageLinks, DiscoveryError> {
        let response = self
            .client
            .get(url.clone())
            .timeout(Duration::from_secs(self.config.timeout_seconds))
            .send()
            .await
            .map_err(|e| self.classify_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DiscoveryError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if is_stream_content_type(&content_type) {
            return Ok(PageLinks {
                streams: vec![url.clone()],
                pages: vec![],
            });
        }

        // Final URL after redirects is the base for relative links
        let base = response.url().clone();
        let body = response.text().await.map_err(|e| self.classify_error(e))?;
        Ok(extract_links(&body, &base))
    }

    fn classify_error(&self, e: reqwest::Error) -> DiscoveryError {
        if e.is_timeout() {
            DiscoveryError::Timeout(self.config.timeout_seconds)
        } else {
            DiscoveryError::ConnectionFailed(e.to_string())
        }
    }

    fn should_follow(&self, seed: &Url, link: &PageLink) -> bool {
        link.embedded || !self.config.same_host_only || link.url.host_str() == seed.host_str()
    }
}

#[async_trait]
impl StreamDiscovery for HttpCrawler {
    async fn discover(&self, seed_url: &str, max_depth: u32) -> Result<Vec<String>, DiscoveryError> {
        let seed = Self::parse_seed(seed_url)?;
        if is_stream_url(&seed) {
            return Ok(vec![seed.to_string()]);
        }

        let mut found = Vec::new();
        let mut seen_streams = HashSet::new();
        let mut visited = HashSet::from([seed.to_string()]);
        let mut queue = VecDeque::from([(seed.clone(), 0u32)]);
        let mut pages_fetched = 0usize;

        while let Some((page, depth)) = queue.pop_front() {
            if pages_fetched >= self.config.max_pages {
                tracing::debug!(
                    seed = %seed,
                    max_pages = self.config.max_pages,
                    "Crawl page limit reached"
                );
                break;
            }
            pages_fetched += 1;

            let links = match self.fetch(&page).await {
                Ok(links) => links,
                // A dead seed fails the crawl; dead sub-pages are skipped
                Err(e) if depth == 0 => return Err(e),
                Err(e) => {
                    tracing::debug!(page = %page, error = %e, "Skipping unreachable page");
                    continue;
                }
            };

            for stream in links.streams {
                let stream = stream.to_string();
                if seen_streams.insert(stream.clone()) {
                    tracing::debug!(page = %page, url = %stream, "Found stream URL");
                    found.push(stream);
                }
            }

            if depth < max_depth {
                for link in links.pages {
                    if self.should_follow(&seed, &link) && visited.insert(link.url.to_string()) {
                        queue.push_back((link.url, depth + 1));
                    }
                }
            }
        }

        tracing::info!(
            seed = %seed,
            pages = pages_fetched,
            streams = found.len(),
            "Crawl complete"
        );
        Ok(found)
    }
}
