//! Text and date helpers shared by the scrapers and processors.
//!
//! - HTML stripping and whitespace normalization for feed-supplied bodies
//! - Lenient date parsing for the free-text dates web pages carry
//! - String truncation for log previews

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use scraper::Html;

/// Remove HTML markup from a string and collapse whitespace.
///
/// Feed summaries and embedded content bodies frequently arrive as HTML
/// fragments. If the text looks like markup it is parsed as a fragment and
/// reduced to its visible text; either way the result has runs of whitespace
/// collapsed to single spaces.
pub fn strip_html(text: &str) -> String {
    if text.contains('<') && text.contains('>') {
        let fragment = Html::parse_fragment(text);
        let extracted = fragment
            .root_element()
            .text()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        collapse_whitespace(&extracted)
    } else {
        collapse_whitespace(text)
    }
}

/// Collapse all runs of whitespace to single spaces and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Best-effort parse of a date string in any of the formats news sites
/// commonly emit.
///
/// Tries RFC 3339 and RFC 2822 first, then a list of bare date/datetime
/// formats. Naive values are taken as UTC. Returns `None` when nothing
/// matches; callers treat that as "no publication date".
pub fn parse_date_loose(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.with_timezone(&Utc));
    }

    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.and_utc());
        }
    }

    const DATE_FORMATS: &[&str] = &[
        "%Y-%m-%d",
        "%B %d, %Y",
        "%b %d, %Y",
        "%d %B %Y",
        "%m/%d/%Y",
    ];
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }

    None
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut at `max` bytes (backing up to a character boundary)
/// with an ellipsis and byte-count indicator appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…(+{} bytes)", &s[..end], s.len() - end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_strip_html_removes_markup() {
        let html = "<p>Hello <b>world</b></p><div>second   block</div>";
        assert_eq!(strip_html(html), "Hello world second block");
    }

    #[test]
    fn test_strip_html_plain_text_passthrough() {
        assert_eq!(strip_html("plain   text\nhere"), "plain text here");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \t b\n\nc  "), "a b c");
        assert_eq!(collapse_whitespace(""), "");
    }

    #[test]
    fn test_parse_date_loose_rfc3339() {
        let dt = parse_date_loose("2024-03-05T10:30:00Z").unwrap();
        assert_eq!(dt.hour(), 10);
    }

    #[test]
    fn test_parse_date_loose_rfc2822() {
        assert!(parse_date_loose("Tue, 05 Mar 2024 10:30:00 GMT").is_some());
    }

    #[test]
    fn test_parse_date_loose_bare_date() {
        let dt = parse_date_loose("2024-03-05").unwrap();
        assert_eq!(dt.hour(), 0);
        assert!(parse_date_loose("March 5, 2024").is_some());
        assert!(parse_date_loose("5 March 2024").is_some());
    }

    #[test]
    fn test_parse_date_loose_rejects_garbage() {
        assert!(parse_date_loose("3 hours ago").is_none());
        assert!(parse_date_loose("").is_none());
    }

    #[test]
    fn test_truncate_for_log_short_string() {
        assert_eq!(truncate_for_log("Hello, world!", 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_respects_char_boundaries() {
        let s = "ééééé";
        let result = truncate_for_log(s, 3);
        assert!(result.starts_with('é'));
    }
}
