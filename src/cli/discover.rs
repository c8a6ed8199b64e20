//! Discover command implementation

use crate::cli::output::format_urls_json;
use crate::cli::runtime::{build_crawler, load_config};
use crate::cli::DiscoverArgs;
use crate::discovery::StreamDiscovery;
use crate::logging::init_tracing;

/// Crawl `seed` and format the stream URLs found.
pub async fn handle_discover(
    discovery: &dyn StreamDiscovery,
    seed: &str,
    max_depth: u32,
    json: bool,
) -> Result<String, Box<dyn std::error::Error>> {
    let urls = discovery.discover(seed, max_depth).await?;

    if json {
        return Ok(format_urls_json(seed, &urls)?);
    }
    if urls.is_empty() {
        return Ok(format!("No streams found on {}", seed));
    }
    Ok(urls.join("\n"))
}

/// Handle `streamfox discover` command
pub async fn run_discover(args: DiscoverArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&args.config)?;
    config.validate()?;
    init_tracing(&config.logging)?;

    let crawler = build_crawler(&config)?;
    let depth = args.depth.unwrap_or(config.crawler.max_depth);
    let output = handle_discover(crawler.as_ref(), &args.seed, depth, args.json).await?;
    println!("{}", output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::DiscoveryError;
    use async_trait::async_trait;

    struct StubDiscovery(Vec<String>);

    #[async_trait]
    impl StreamDiscovery for StubDiscovery {
        async fn discover(&self, seed_url: &str, max_depth: u32) -> Result<Vec<String>, DiscoveryError> {
            if seed_url.contains("down") {
                return Err(DiscoveryError::ConnectionFailed(seed_url.to_string()));
            }
            Ok(self.0.iter().take(max_depth as usize + 1).cloned().collect())
        }
    }

    #[tokio::test]
    async fn test_handle_discover_lists_urls() {
        let discovery = StubDiscovery(vec!["http://a/1.m3u8".to_string(), "http://a/2.mpd".to_string()]);
        let output = handle_discover(&discovery, "http://site/", 2, false).await.unwrap();
        assert_eq!(output, "http://a/1.m3u8\nhttp://a/2.mpd");
    }

    #[tokio::test]
    async fn test_handle_discover_empty() {
        let discovery = StubDiscovery(vec![]);
        let output = handle_discover(&discovery, "http://site/", 1, false).await.unwrap();
        assert!(output.contains("No streams found"));
    }

    #[tokio::test]
    async fn test_handle_discover_json() {
        let discovery = StubDiscovery(vec!["http://a/1.m3u8".to_string()]);
        let output = handle_discover(&discovery, "http://site/", 0, true).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["seed"], "http://site/");
        assert_eq!(parsed["streams"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_handle_discover_error() {
        let discovery = StubDiscovery(vec![]);
        let err = handle_discover(&discovery, "http://down/", 1, false).await.unwrap_err();
        assert!(err.to_string().contains("http://down/"));
    }
}
