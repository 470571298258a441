//! RSS/Atom feed scraper.
//!
//! Parses a feed with feed-rs and maps the first N entries to [`Article`]s.
//! The body comes from feed-embedded full content when present, else from
//! fetching the linked page, else from the feed summary. Entries missing a
//! title or link are skipped; a feed that fails to parse contributes zero
//! articles (logged as a warning) without aborting the run.

use async_trait::async_trait;
use chrono::Utc;
use tracing::{error, info, warn};

use crate::config::ScrapingConfig;
use crate::error::Result;
use crate::fetch::PageFetcher;
use crate::models::Article;
use crate::scrapers::Scraper;
use crate::utils::strip_html;

pub struct RssScraper {
    name: String,
    feed_url: String,
    category: String,
    max_articles: usize,
    fetcher: PageFetcher,
}

impl RssScraper {
    pub fn new(
        name: impl Into<String>,
        feed_url: impl Into<String>,
        category: impl Into<String>,
        options: &ScrapingConfig,
    ) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            feed_url: feed_url.into(),
            category: category.into(),
            max_articles: options.max_articles_per_source,
            fetcher: PageFetcher::new(options)?,
        })
    }

    async fn fetch_feed(&self) -> Option<feed_rs::model::Feed> {
        let response = match self.fetcher.client().get(&self.feed_url).send().await {
            Ok(response) => response,
            Err(e) => {
                error!(source = %self.name, url = %self.feed_url, error = %e, "Error fetching feed");
                return None;
            }
        };
        let response = match response.error_for_status() {
            Ok(response) => response,
            Err(e) => {
                error!(source = %self.name, url = %self.feed_url, error = %e, "Feed fetch returned error status");
                return None;
            }
        };
        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(source = %self.name, error = %e, "Error reading feed body");
                return None;
            }
        };
        match feed_rs::parser::parse(bytes.as_ref()) {
            Ok(feed) => Some(feed),
            Err(e) => {
                // Closest rendition of a best-effort parse: a malformed feed
                // yields nothing for this source, the run continues.
                warn!(source = %self.name, error = %e, "Feed failed to parse; skipping source");
                None
            }
        }
    }

    async fn parse_entry(&self, entry: feed_rs::model::Entry) -> Option<Article> {
        let title = entry
            .title
            .as_ref()
            .map(|t| t.content.trim().to_string())
            .filter(|t| !t.is_empty())?;

        let url = entry
            .links
            .first()
            .map(|l| l.href.trim().to_string())
            .filter(|u| !u.is_empty())?;

        // feed-rs already handles both structured and free-text feed dates.
        let published_at = entry.published.or(entry.updated);

        let author = entry
            .authors
            .first()
            .map(|p| p.name.trim().to_string())
            .filter(|a| !a.is_empty());

        let summary_raw = entry
            .summary
            .as_ref()
            .map(|s| s.content.clone())
            .unwrap_or_default();

        // Body preference: feed-embedded content, then the linked page's
        // extracted text, then the feed summary.
        let body_raw = match entry.content.and_then(|c| c.body) {
            Some(body) if !body.trim().is_empty() => body,
            _ => match self.fetcher.fetch_text(&url).await {
                Some(text) => text,
                None => summary_raw.clone(),
            },
        };

        let summary = strip_html(&summary_raw);
        let tags = entry
            .categories
            .iter()
            .map(|c| c.term.clone())
            .collect::<Vec<_>>();

        Some(Article {
            title,
            url,
            body: strip_html(&body_raw),
            summary: if summary.is_empty() { None } else { Some(summary) },
            category: Some(self.category.clone()),
            source: self.name.clone(),
            published_at,
            scraped_at: Utc::now(),
            author,
            tags,
        })
    }
}

#[async_trait]
impl Scraper for RssScraper {
    fn source_name(&self) -> &str {
        &self.name
    }

    async fn scrape(&self) -> Vec<Article> {
        info!(source = %self.name, url = %self.feed_url, "Scraping RSS feed");

        let Some(feed) = self.fetch_feed().await else {
            return Vec::new();
        };

        let mut articles = Vec::new();
        for entry in feed.entries.into_iter().take(self.max_articles) {
            let entry_id = entry.id.clone();
            match self.parse_entry(entry).await {
                Some(article) => {
                    articles.push(article);
                    self.fetcher.rate_limit().await;
                }
                None => {
                    warn!(source = %self.name, entry = %entry_id, "Skipping feed entry without title or link");
                }
            }
        }

        info!(source = %self.name, count = articles.len(), "Scraped RSS feed");
        articles
    }
}
