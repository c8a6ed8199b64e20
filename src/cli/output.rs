//! Output formatting helpers for CLI commands

use crate::pool::CandidateStream;
use crate::quality::QualityMetrics;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use serde::Serialize;
use serde_json::json;
use std::fmt::Write;

/// Coarse stream condition for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamStatus {
    Live,
    Stalled,
    Buffering,
    Down,
    Unprobed,
}

impl StreamStatus {
    pub fn of(metrics: Option<&QualityMetrics>) -> Self {
        match metrics {
            None => StreamStatus::Unprobed,
            Some(m) if !m.latency_ms().is_finite() => StreamStatus::Down,
            Some(m) if m.is_buffering() => StreamStatus::Buffering,
            Some(m) if !m.is_active() => StreamStatus::Stalled,
            Some(_) => StreamStatus::Live,
        }
    }

    fn colored(self) -> String {
        match self {
            StreamStatus::Live => "Live".green().to_string(),
            StreamStatus::Stalled => "Stalled".yellow().to_string(),
            StreamStatus::Buffering => "Buffering".yellow().to_string(),
            StreamStatus::Down => "Down".red().to_string(),
            StreamStatus::Unprobed => "Unprobed".dimmed().to_string(),
        }
    }
}

/// View model for one pool candidate
#[derive(Debug, Clone, Serialize)]
pub struct CandidateView {
    pub rank: usize,
    pub url: String,
    pub score: Option<f64>,
    pub status: StreamStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fps: Option<f64>,
    pub failures: u32,
    pub active: bool,
}

impl CandidateView {
    pub fn new(rank: usize, candidate: &CandidateStream, active: Option<&str>) -> Self {
        let metrics = candidate.latest_metrics();
        Self {
            rank,
            url: candidate.url().to_string(),
            score: candidate.score(),
            status: StreamStatus::of(metrics),
            latency_ms: metrics.map(QualityMetrics::latency_ms).filter(|l| l.is_finite()),
            fps: metrics.map(QualityMetrics::fps),
            failures: candidate.consecutive_failures(),
            active: active == Some(candidate.url()),
        }
    }
}

/// Views for candidates in rank order (1-based rank)
pub fn candidate_views(candidates: &[CandidateStream], active: Option<&str>) -> Vec<CandidateView> {
    candidates
        .iter()
        .enumerate()
        .map(|(i, c)| CandidateView::new(i + 1, c, active))
        .collect()
}

/// Format the ranked pool as a table
pub fn format_pool_table(views: &[CandidateView]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["#", "URL", "Score", "Status", "Latency", "FPS", "Failures"]);

    for v in views {
        let rank = if v.active {
            format!("{} ▶", v.rank)
        } else {
            v.rank.to_string()
        };

        table.add_row(vec![
            Cell::new(rank),
            Cell::new(&v.url),
            Cell::new(v.score.map_or("-".to_string(), |s| format!("{:.3}", s))),
            Cell::new(v.status.colored()),
            Cell::new(v.latency_ms.map_or("-".to_string(), |l| format!("{:.0}ms", l))),
            Cell::new(v.fps.map_or("-".to_string(), |f| format!("{:.1}", f))),
            Cell::new(v.failures),
        ]);
    }

    table.to_string()
}

/// Format the ranked pool as JSON
pub fn format_pool_json(tick: u64, views: &[CandidateView]) -> serde_json::Result<String> {
    serde_json::to_string(&json!({
        "tick": tick,
        "candidates": views,
    }))
}

/// Format one probe result for humans
pub fn format_probe_pretty(metrics: &QualityMetrics) -> String {
    let mut output = String::new();
    let status = StreamStatus::of(Some(metrics));
    let latency = if metrics.latency_ms().is_finite() {
        format!("{:.0}ms", metrics.latency_ms())
    } else {
        "unreachable".to_string()
    };

    // Writing to a String cannot fail
    let _ = writeln!(output, "URL:     {}", metrics.url());
    let _ = writeln!(output, "Score:   {:.3}", metrics.quality_score());
    let _ = writeln!(output, "Status:  {}", status.colored());
    let _ = writeln!(output, "Latency: {}", latency);
    let _ = writeln!(output, "FPS:     {:.1}", metrics.fps());
    let _ = write!(output, "Errors:  {}", metrics.error_count());
    output
}

/// Format one probe result as JSON
pub fn format_probe_json(metrics: &QualityMetrics) -> serde_json::Result<String> {
    serde_json::to_string_pretty(metrics)
}

/// Format crawled URLs as JSON
pub fn format_urls_json(seed: &str, urls: &[String]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&json!({
        "seed": seed,
        "streams": urls,
    }))
}

/// Get status icon for a stream status
pub fn status_icon(status: StreamStatus) -> &'static str {
    match status {
        StreamStatus::Live => "✓",
        StreamStatus::Stalled | StreamStatus::Buffering => "~",
        StreamStatus::Down => "✗",
        StreamStatus::Unprobed => "?",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::ProbeSample;
    use chrono::Utc;

    fn live_metrics(url: &str) -> QualityMetrics {
        QualityMetrics::with_score(
            ProbeSample {
                url: url.to_string(),
                latency_ms: 420.0,
                fps: 29.97,
                is_buffering: false,
                is_active: true,
                error_count: 0,
                timestamp: Utc::now(),
            },
            0.91,
        )
    }

    fn view(rank: usize, url: &str, active: bool) -> CandidateView {
        CandidateView {
            rank,
            url: url.to_string(),
            score: Some(0.91),
            status: StreamStatus::Live,
            latency_ms: Some(420.0),
            fps: Some(29.97),
            failures: 0,
            active,
        }
    }

    #[test]
    fn test_status_of_metrics() {
        assert_eq!(StreamStatus::of(None), StreamStatus::Unprobed);
        assert_eq!(StreamStatus::of(Some(&live_metrics("http://a/"))), StreamStatus::Live);
        let down = QualityMetrics::unreachable("http://a/", 2);
        assert_eq!(StreamStatus::of(Some(&down)), StreamStatus::Down);
    }

    #[test]
    fn test_format_pool_table_empty() {
        let output = format_pool_table(&[]);
        assert!(output.contains("URL")); // Header present
    }

    #[test]
    fn test_format_pool_table_marks_active() {
        let views = vec![view(1, "http://a/live.m3u8", true), view(2, "http://b/live.m3u8", false)];
        let output = format_pool_table(&views);
        assert!(output.contains("http://a/live.m3u8"));
        assert!(output.contains("1 ▶"));
        assert!(output.contains("0.910"));
        assert!(output.contains("420ms"));
    }

    #[test]
    fn test_format_pool_json_valid() {
        let output = format_pool_json(4, &[view(1, "http://a/live.m3u8", false)]).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["tick"], 4);
        assert_eq!(parsed["candidates"][0]["status"], "live");
        assert_eq!(parsed["candidates"][0]["rank"], 1);
    }

    #[test]
    fn test_format_probe_pretty_unreachable() {
        let output = format_probe_pretty(&QualityMetrics::unreachable("http://a/", 1));
        assert!(output.contains("unreachable"));
        assert!(output.contains("0.000"));
    }

    #[test]
    fn test_format_probe_json_fields() {
        let output = format_probe_json(&live_metrics("http://a/")).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["url"], "http://a/");
        assert_eq!(parsed["quality_score"], 0.91);
    }

    #[test]
    fn test_format_urls_json() {
        let urls = vec!["http://a/1.m3u8".to_string()];
        let parsed: serde_json::Value =
            serde_json::from_str(&format_urls_json("http://site/", &urls).unwrap()).unwrap();
        assert_eq!(parsed["streams"][0], "http://a/1.m3u8");
    }

    #[test]
    fn test_status_icon() {
        assert_eq!(status_icon(StreamStatus::Live), "✓");
        assert_eq!(status_icon(StreamStatus::Down), "✗");
        assert_eq!(status_icon(StreamStatus::Unprobed), "?");
    }
}
