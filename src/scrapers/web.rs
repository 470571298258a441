//! Generic CSS-selector-driven web scraper for sites without feeds.
//!
//! The base page is fetched once and candidate articles are pulled out of it
//! with a configurable container selector; title and link selectors (with
//! sensible defaults) locate the headline and target URL inside each
//! container. Candidate extraction is synchronous so the parsed DOM is gone
//! before any follow-up fetch happens; each candidate's article page is then
//! fetched for its body text, falling back to the container's own text.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{info, warn};

use crate::config::ScrapingConfig;
use crate::error::{NewsError, Result};
use crate::fetch::{clean_url, element_text, PageFetcher};
use crate::models::Article;
use crate::scrapers::Scraper;
use crate::utils::parse_date_loose;

const DEFAULT_ARTICLE_SELECTOR: &str = ".article";
const DEFAULT_TITLE_SELECTOR: &str = "h2, h3, .title";
const DEFAULT_LINK_SELECTOR: &str = "a";

/// Date-bearing elements tried in priority order within a container.
static DATE_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    ["time", ".date", ".published", ".timestamp", "[datetime]", ".post-date"]
        .iter()
        .map(|s| Selector::parse(s).expect("static date selector"))
        .collect()
});

/// Byline elements tried in priority order within a container.
static AUTHOR_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [".author", ".byline", ".by", r#"[rel="author"]"#]
        .iter()
        .map(|s| Selector::parse(s).expect("static author selector"))
        .collect()
});

static ANCHOR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a").expect("anchor selector"));

static BYLINE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^by\s+").expect("byline prefix regex"));

/// Everything needed to finish one article after the container page's DOM
/// has been dropped.
struct Candidate {
    title: String,
    url: String,
    published_at: Option<DateTime<Utc>>,
    author: Option<String>,
    fallback_text: String,
}

pub struct WebScraper {
    name: String,
    base_url: String,
    category: String,
    article_selector: Selector,
    title_selector: Selector,
    link_selector: Selector,
    max_articles: usize,
    fetcher: PageFetcher,
}

impl WebScraper {
    /// Build a scraper for one configured web source.
    ///
    /// An unparsable configured selector is a fatal configuration error.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        category: impl Into<String>,
        options: &ScrapingConfig,
        article_selector: Option<&str>,
        title_selector: Option<&str>,
        link_selector: Option<&str>,
    ) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            base_url: base_url.into(),
            category: category.into(),
            article_selector: parse_selector(
                article_selector.unwrap_or(DEFAULT_ARTICLE_SELECTOR),
            )?,
            title_selector: parse_selector(title_selector.unwrap_or(DEFAULT_TITLE_SELECTOR))?,
            link_selector: parse_selector(link_selector.unwrap_or(DEFAULT_LINK_SELECTOR))?,
            max_articles: options.max_articles_per_source,
            fetcher: PageFetcher::new(options)?,
        })
    }

    fn collect_candidates(&self, document: &Html) -> Vec<Candidate> {
        document
            .select(&self.article_selector)
            .take(self.max_articles)
            .filter_map(|element| match self.parse_element(element) {
                Some(candidate) => Some(candidate),
                None => {
                    warn!(source = %self.name, "Skipping container without title or link");
                    None
                }
            })
            .collect()
    }

    fn parse_element(&self, element: ElementRef) -> Option<Candidate> {
        let title_element = element.select(&self.title_selector).next()?;
        let title = element_text(title_element);
        if title.is_empty() {
            return None;
        }

        // Dedicated link selector first, then an anchor nested in the title.
        let link_element = element
            .select(&self.link_selector)
            .next()
            .or_else(|| title_element.select(&ANCHOR_SELECTOR).next());
        let href = link_element
            .and_then(|el| el.value().attr("href"))
            .map(str::trim)
            .filter(|h| !h.is_empty())?;

        Some(Candidate {
            title,
            url: clean_url(href, &self.base_url),
            published_at: extract_date(element),
            author: extract_author(element),
            fallback_text: element_text(element),
        })
    }
}

/// Best-effort publication date from a container element.
fn extract_date(element: ElementRef) -> Option<DateTime<Utc>> {
    for selector in DATE_SELECTORS.iter() {
        if let Some(date_element) = element.select(selector).next() {
            let raw = match date_element.value().attr("datetime") {
                Some(attr) => attr.to_string(),
                None => element_text(date_element),
            };
            if let Some(parsed) = parse_date_loose(&raw) {
                return Some(parsed);
            }
        }
    }
    None
}

/// Best-effort byline author from a container element, with any leading
/// "by " prefix stripped case-insensitively.
fn extract_author(element: ElementRef) -> Option<String> {
    for selector in AUTHOR_SELECTORS.iter() {
        if let Some(author_element) = element.select(selector).next() {
            let raw = element_text(author_element);
            let cleaned = BYLINE_PREFIX.replace(&raw, "").trim().to_string();
            if !cleaned.is_empty() {
                return Some(cleaned);
            }
        }
    }
    None
}

fn parse_selector(raw: &str) -> Result<Selector> {
    Selector::parse(raw).map_err(|_| NewsError::Selector(raw.to_string()))
}

#[async_trait]
impl Scraper for WebScraper {
    fn source_name(&self) -> &str {
        &self.name
    }

    async fn scrape(&self) -> Vec<Article> {
        info!(source = %self.name, url = %self.base_url, "Scraping website");

        let candidates = {
            let Some(document) = self.fetcher.fetch_page(&self.base_url).await else {
                warn!(source = %self.name, url = %self.base_url, "Base page fetch failed");
                return Vec::new();
            };
            self.collect_candidates(&document)
        };

        let mut articles = Vec::new();
        for candidate in candidates {
            let body = match self.fetcher.fetch_text(&candidate.url).await {
                Some(text) => text,
                None => candidate.fallback_text,
            };
            articles.push(Article {
                title: candidate.title,
                url: candidate.url,
                body,
                summary: None,
                category: Some(self.category.clone()),
                source: self.name.clone(),
                published_at: candidate.published_at,
                scraped_at: Utc::now(),
                author: candidate.author,
                tags: Vec::new(),
            });
            self.fetcher.rate_limit().await;
        }

        info!(source = %self.name, count = articles.len(), "Scraped website");
        articles
    }
}
