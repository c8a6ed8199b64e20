//! Stream URL extraction from HTML pages.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

/// Streaming container extensions recognized in URL paths.
pub const STREAM_EXTENSIONS: &[&str] = &["m3u8", "mp4", "ts", "mpd", "webm"];

/// First URL-bearing attribute of tags that can reference media or pages.
static TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)<(a|iframe|video|source|embed)\b[^>]*?\s(?:href|src|data-src)\s*=\s*["']([^"']+)["']"#,
    )
    .expect("valid tag regex")
});

/// Absolute stream URLs anywhere in the page, e.g. player setup in inline scripts.
static INLINE_STREAM_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)https?://[^\s"'<>\\]+?\.(?:m3u8|mpd|mp4|webm|ts)\b(?:\?[^\s"'<>\\]*)?"#)
        .expect("valid inline stream regex")
});

/// Links found on one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageLinks {
    /// Candidate stream URLs
    pub streams: Vec<Url>,
    /// Pages worth crawling further, with whether they are embeds
    pub pages: Vec<PageLink>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLink {
    pub url: Url,
    pub embedded: bool,
}

/// Whether the URL path ends in a streaming container extension.
pub fn is_stream_url(url: &Url) -> bool {
    let path = url.path().to_ascii_lowercase();
    path.rsplit_once('.')
        .is_some_and(|(_, ext)| STREAM_EXTENSIONS.contains(&ext))
}

/// Whether a response content type denotes a media stream or playlist.
pub fn is_stream_content_type(content_type: &str) -> bool {
    let ct = content_type.to_ascii_lowercase();
    ct.starts_with("video/") || ct.contains("mpegurl") || ct.contains("dash+xml")
}

/// Resolve a raw attribute value against the page URL, keeping only http(s).
fn resolve(base: &Url, raw: &str) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with("javascript:") || raw.starts_with("data:") {
        return None;
    }
    let mut url = base.join(raw).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}

/// Extract stream URLs and crawlable links from `html` served at `base`.
pub fn extract_links(html: &str, base: &Url) -> PageLinks {
    let mut links = PageLinks::default();
    let mut seen_streams = HashSet::new();
    let mut seen_pages = HashSet::new();

    let mut push_stream = |links: &mut PageLinks, url: Url| {
        if seen_streams.insert(url.to_string()) {
            links.streams.push(url);
        }
    };

    for caps in TAG_REGEX.captures_iter(html) {
        let tag = caps[1].to_ascii_lowercase();
        let Some(url) = resolve(base, &caps[2]) else {
            continue;
        };

        match tag.as_str() {
            _ if is_stream_url(&url) => push_stream(&mut links, url),
            // Media elements pointing at plugins, posters or scripts
            "video" | "source" | "embed" => {}
            _ => {
                if seen_pages.insert(url.to_string()) {
                    links.pages.push(PageLink {
                        url,
                        embedded: tag == "iframe",
                    });
                }
            }
        }
    }

    // Players often receive their source through JSON with escaped slashes
    let unescaped = html.replace("\\/", "/");
    for m in INLINE_STREAM_REGEX.find_iter(&unescaped) {
        if let Some(url) = resolve(base, m.as_str()) {
            push_stream(&mut links, url);
        }
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://tv.example.com/channels/news").unwrap()
    }

    #[test]
    fn test_is_stream_url() {
        let yes = ["http://a/live.m3u8", "http://a/x/clip.MP4", "http://a/seg.ts?token=1", "http://a/m.mpd"];
        for url in yes {
            assert!(is_stream_url(&Url::parse(url).unwrap()), "{url}");
        }
        let no = ["http://a/index.html", "http://a/m3u8", "http://a/"];
        for url in no {
            assert!(!is_stream_url(&Url::parse(url).unwrap()), "{url}");
        }
    }

    #[test]
    fn test_is_stream_content_type() {
        assert!(is_stream_content_type("application/vnd.apple.mpegurl"));
        assert!(is_stream_content_type("audio/x-mpegURL"));
        assert!(is_stream_content_type("video/mp4"));
        assert!(is_stream_content_type("application/dash+xml"));
        assert!(!is_stream_content_type("text/html; charset=utf-8"));
    }

    #[test]
    fn test_video_and_source_tags() {
        let html = r#"
            <video src="/media/main.m3u8"></video>
            <video controls><source src="backup/alt.mp4" type="video/mp4"></video>
        "#;
        let links = extract_links(html, &base());
        let streams: Vec<String> = links.streams.iter().map(Url::to_string).collect();
        assert_eq!(
            streams,
            vec![
                "https://tv.example.com/media/main.m3u8",
                "https://tv.example.com/channels/backup/alt.mp4",
            ]
        );
        assert!(links.pages.is_empty());
    }

    #[test]
    fn test_media_tags_without_stream_extension_ignored() {
        let html = r#"
            <embed src="player.swf">
            <video src="/poster.jpg"></video>
            <video><source src="/assets/loader.js"></video>
            <embed src="/live/feed.m3u8">
        "#;
        let links = extract_links(html, &base());
        let streams: Vec<String> = links.streams.iter().map(Url::to_string).collect();
        assert_eq!(streams, vec!["https://tv.example.com/live/feed.m3u8"]);
        assert!(links.pages.is_empty());
    }

    #[test]
    fn test_anchor_and_iframe_links() {
        let html = r#"
            <a href="/channels/sports">Sports</a>
            <a href="https://other.example.org/live.m3u8">Direct</a>
            <iframe src="https://player.example.net/embed/42"></iframe>
            <a href="javascript:void(0)">Nope</a>
            <a href="mailto:tv@example.com">Mail</a>
        "#;
        let links = extract_links(html, &base());
        assert_eq!(links.streams.len(), 1);
        assert_eq!(links.streams[0].as_str(), "https://other.example.org/live.m3u8");
        assert_eq!(
            links.pages,
            vec![
                PageLink {
                    url: Url::parse("https://tv.example.com/channels/sports").unwrap(),
                    embedded: false,
                },
                PageLink {
                    url: Url::parse("https://player.example.net/embed/42").unwrap(),
                    embedded: true,
                },
            ]
        );
    }

    #[test]
    fn test_inline_script_urls() {
        let html = r#"
            <script>
              player.setup({"file":"https:\/\/cdn.example.com\/hls\/ch1.m3u8?st=abc"});
              var fallback = 'http://cdn2.example.com/ch1/index.mpd';
            </script>
        "#;
        let links = extract_links(html, &base());
        let streams: Vec<&str> = links.streams.iter().map(Url::as_str).collect();
        assert_eq!(
            streams,
            vec![
                "https://cdn.example.com/hls/ch1.m3u8?st=abc",
                "http://cdn2.example.com/ch1/index.mpd",
            ]
        );
    }

    #[test]
    fn test_inline_extension_needs_boundary() {
        let html = r#"<script>var host = "https://cdn.tsinghua.example/page";</script>"#;
        assert!(extract_links(html, &base()).streams.is_empty());
    }

    #[test]
    fn test_duplicates_removed() {
        let html = r#"
            <video src="https://cdn.example.com/a.m3u8"></video>
            <script>var s = "https://cdn.example.com/a.m3u8";</script>
            <a href="/x">x</a><a href="/x#top">x again</a>
        "#;
        let links = extract_links(html, &base());
        assert_eq!(links.streams.len(), 1);
        assert_eq!(links.pages.len(), 1);
    }
}
