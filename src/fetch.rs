//! Rate-limited page fetching and HTML text extraction.
//!
//! Each scraper owns one [`PageFetcher`], which wraps a dedicated
//! `reqwest::Client` (configured User-Agent and timeout) so no HTTP state is
//! shared across scrapers. Fetch failures are logged and surfaced as `None`;
//! they never abort a scrape. Rate limiting is cooperative: scrapers call
//! [`PageFetcher::rate_limit`] between successive fetches.

use std::time::Duration;

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, error};

use crate::config::ScrapingConfig;
use crate::error::Result;
use crate::utils::collapse_whitespace;

/// Content containers tried in priority order when extracting article text.
const DEFAULT_CONTENT_SELECTORS: &[&str] = &[
    "article",
    ".article-content",
    ".post-content",
    ".entry-content",
    ".content",
    "main",
];

/// Subtrees skipped entirely during text extraction.
const EXCLUDED_TAGS: &[&str] = &["script", "style", "nav", "footer", "header"];

static PARSED_DEFAULT_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    DEFAULT_CONTENT_SELECTORS
        .iter()
        .map(|s| Selector::parse(s).expect("default content selector"))
        .collect()
});

/// HTTP fetcher owned by a single scraper instance.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: reqwest::Client,
    delay: Duration,
}

impl PageFetcher {
    pub fn new(config: &ScrapingConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            delay: Duration::from_secs_f64(config.delay_between_requests.max(0.0)),
        })
    }

    /// The underlying client, for callers that fetch non-HTML payloads
    /// (feed XML) themselves.
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Fetch `url` and parse it as an HTML document.
    ///
    /// Any transport error or non-2xx status is logged and mapped to `None`;
    /// this never raises to the caller.
    pub async fn fetch_page(&self, url: &str) -> Option<Html> {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                error!(%url, error = %e, "Error fetching page");
                return None;
            }
        };
        let response = match response.error_for_status() {
            Ok(response) => response,
            Err(e) => {
                error!(%url, error = %e, "Page fetch returned error status");
                return None;
            }
        };
        match response.text().await {
            Ok(body) => Some(Html::parse_document(&body)),
            Err(e) => {
                error!(%url, error = %e, "Error reading page body");
                return None;
            }
        }
    }

    /// Fetch `url` and extract its main text with the default selector list.
    ///
    /// Returns `None` on fetch failure or when extraction yields no text.
    /// The parsed document never outlives this call.
    pub async fn fetch_text(&self, url: &str) -> Option<String> {
        let document = self.fetch_page(url).await?;
        let text = extract_text(&document, None);
        if text.is_empty() {
            debug!(%url, "Fetched page yielded no extractable text");
            None
        } else {
            Some(text)
        }
    }

    /// Sleep the configured delay between successive fetches.
    pub async fn rate_limit(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

/// Extract the main text content of a document.
///
/// Tries each selector in priority order (callers may supply their own list;
/// the default starts at semantic `article` containers and falls back to
/// `main`). The first selector with a match wins and no merging happens
/// across selectors. Script, style, nav, footer, and header subtrees are
/// skipped. When nothing matches, the whole document's visible text is
/// returned with the same exclusions.
pub fn extract_text(document: &Html, selectors: Option<&[String]>) -> String {
    match selectors {
        Some(list) => {
            for raw in list {
                let Ok(selector) = Selector::parse(raw) else {
                    continue;
                };
                if let Some(element) = document.select(&selector).next() {
                    return element_text(element);
                }
            }
        }
        None => {
            for selector in PARSED_DEFAULT_SELECTORS.iter() {
                if let Some(element) = document.select(selector).next() {
                    return element_text(element);
                }
            }
        }
    }
    element_text(document.root_element())
}

/// Visible text of an element subtree, single-space separated, with
/// script/style/nav/footer/header descendants skipped.
pub fn element_text(element: ElementRef) -> String {
    let mut parts = Vec::new();
    collect_text(element, &mut parts);
    parts.join(" ")
}

fn collect_text(element: ElementRef, out: &mut Vec<String>) {
    if EXCLUDED_TAGS.contains(&element.value().name()) {
        return;
    }
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            collect_text(child_element, out);
        } else if let Some(text) = child.value().as_text() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                out.push(collapse_whitespace(trimmed));
            }
        }
    }
}

/// Normalize a possibly-relative URL against a base.
///
/// Handles protocol-relative (`//host/...`), root-relative (`/path`), and
/// bare-relative (`path`) forms; absolute URLs pass through untouched.
pub fn clean_url(url: &str, base_url: &str) -> String {
    if url.starts_with("//") {
        format!("https:{url}")
    } else if url.starts_with('/') {
        format!("{}{}", base_url.trim_end_matches('/'), url)
    } else if !url.starts_with("http://") && !url.starts_with("https://") {
        format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            url.trim_start_matches('/')
        )
    } else {
        url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_text_prefers_article_container() {
        let html = r#"
            <html><body>
                <nav>Navigation junk</nav>
                <main>Main fallback</main>
                <article>Real <b>story</b> text</article>
            </body></html>
        "#;
        let document = Html::parse_document(html);
        assert_eq!(extract_text(&document, None), "Real story text");
    }

    #[test]
    fn test_extract_text_strips_excluded_subtrees() {
        let html = r#"
            <article>
                Visible part
                <script>var hidden = 1;</script>
                <style>.x {}</style>
                <footer>footer text</footer>
                tail part
            </article>
        "#;
        let document = Html::parse_document(html);
        assert_eq!(extract_text(&document, None), "Visible part tail part");
    }

    #[test]
    fn test_extract_text_falls_back_to_full_document() {
        let html = "<html><body><div>No semantic container</div></body></html>";
        let document = Html::parse_document(html);
        assert_eq!(extract_text(&document, None), "No semantic container");
    }

    #[test]
    fn test_extract_text_custom_selector_first_match_wins() {
        let html = r#"
            <div class="a">alpha</div>
            <div class="b">beta</div>
        "#;
        let document = Html::parse_document(html);
        let selectors = vec![".missing".to_string(), ".b".to_string(), ".a".to_string()];
        assert_eq!(extract_text(&document, Some(&selectors)), "beta");
    }

    #[test]
    fn test_clean_url_forms() {
        let base = "https://example.com/news/";
        assert_eq!(
            clean_url("//cdn.example.com/a", base),
            "https://cdn.example.com/a"
        );
        assert_eq!(
            clean_url("/story/1", base),
            "https://example.com/news/story/1"
        );
        assert_eq!(
            clean_url("story/2", base),
            "https://example.com/news/story/2"
        );
        assert_eq!(
            clean_url("https://other.com/x", base),
            "https://other.com/x"
        );
    }
}
