//! Specialized scraper for the Hacker News front page.
//!
//! Hacker News is a link aggregator: stories have no body of their own, and
//! the page is a table where each story row (`.athing`) is followed by a
//! sibling row carrying score/author/age metadata (`.subtext`). The
//! per-element parse is therefore a full replacement of the generic web
//! scraper's, not a variation on it: title and link come from the story row,
//! metadata from the sibling row, and the body is synthesized from the title
//! plus a bracketed metadata suffix.

use async_trait::async_trait;
use chrono::Utc;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::info;
use url::Url;

use crate::config::ScrapingConfig;
use crate::error::Result;
use crate::fetch::{element_text, PageFetcher};
use crate::models::Article;
use crate::scrapers::Scraper;

pub const SOURCE_NAME: &str = "Hacker News";
const BASE_URL: &str = "https://news.ycombinator.com/";
const CATEGORY: &str = "tech";

static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse(".athing").expect("row selector"));
static TITLE_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".titleline a").expect("title link selector"));
static SUBTEXT: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".subtext").expect("subtext selector"));
static SCORE: Lazy<Selector> = Lazy::new(|| Selector::parse(".score").expect("score selector"));
static USER: Lazy<Selector> = Lazy::new(|| Selector::parse(".hnuser").expect("user selector"));
static AGE: Lazy<Selector> = Lazy::new(|| Selector::parse(".age").expect("age selector"));

pub struct HackerNewsScraper {
    base_url: String,
    max_articles: usize,
    fetcher: PageFetcher,
}

impl HackerNewsScraper {
    pub fn new(options: &ScrapingConfig) -> Result<Self> {
        Ok(Self {
            base_url: BASE_URL.to_string(),
            max_articles: options.max_articles_per_source,
            fetcher: PageFetcher::new(options)?,
        })
    }

    fn parse_rows(&self, document: &Html) -> Vec<Article> {
        document
            .select(&ROW)
            .take(self.max_articles)
            .filter_map(|row| self.parse_row(row))
            .collect()
    }

    fn parse_row(&self, row: ElementRef) -> Option<Article> {
        let link = row.select(&TITLE_LINK).next()?;
        let title = element_text(link);
        if title.is_empty() {
            return None;
        }

        // External stories carry absolute URLs; internal ones (Ask HN,
        // item links) are relative to the site root.
        let href = link.value().attr("href").unwrap_or_default();
        let url = if href.starts_with("http") {
            href.to_string()
        } else {
            Url::parse(&self.base_url)
                .ok()
                .and_then(|base| base.join(href).ok())
                .map(|joined| joined.to_string())
                .unwrap_or_else(|| href.to_string())
        };

        let mut body = title.clone();
        let mut author = None;

        // Score, author, and age live in the next sibling row.
        let subtext = row
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .next()
            .and_then(|sibling| sibling.select(&SUBTEXT).next());
        if let Some(subtext) = subtext {
            author = subtext
                .select(&USER)
                .next()
                .map(|el| element_text(el))
                .filter(|a| !a.is_empty());

            let mut metadata = Vec::new();
            if let Some(score) = subtext.select(&SCORE).next() {
                metadata.push(format!("Score: {}", element_text(score)));
            }
            if let Some(age) = subtext.select(&AGE).next() {
                metadata.push(format!("Time: {}", element_text(age)));
            }
            if !metadata.is_empty() {
                body = format!("{} [{}]", body, metadata.join(", "));
            }
        }

        Some(Article {
            title,
            url,
            body,
            summary: None,
            category: Some(CATEGORY.to_string()),
            source: SOURCE_NAME.to_string(),
            published_at: None,
            scraped_at: Utc::now(),
            author,
            tags: Vec::new(),
        })
    }
}

#[async_trait]
impl Scraper for HackerNewsScraper {
    fn source_name(&self) -> &str {
        SOURCE_NAME
    }

    async fn scrape(&self) -> Vec<Article> {
        info!(url = %self.base_url, "Scraping Hacker News front page");

        let articles = {
            let Some(document) = self.fetcher.fetch_page(&self.base_url).await else {
                return Vec::new();
            };
            self.parse_rows(&document)
        };

        info!(count = articles.len(), "Scraped Hacker News");
        articles
    }
}
