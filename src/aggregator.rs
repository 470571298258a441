//! Aggregation coordinator: config in, stored article batches out.
//!
//! Construction loads the YAML source configuration, opens storage, and
//! builds one scraper per enabled source — any configuration problem is
//! fatal here, before any network traffic. `run` then drives the scrapers
//! through a bounded worker pool, persisting each source's batch the moment
//! it completes so one slow or failing source never loses another's work,
//! and finishes with a combined `all_sources` batch.

use std::collections::HashMap;
use std::path::Path;

use futures::stream::{self, StreamExt};
use tracing::{error, info, instrument};

use crate::config::{self, AppConfig};
use crate::error::Result;
use crate::models::Article;
use crate::scrapers::hackernews::{self, HackerNewsScraper};
use crate::scrapers::rss::RssScraper;
use crate::scrapers::web::WebScraper;
use crate::scrapers::Scraper;
use crate::storage::{ArticleStorage, StorageStats, DEFAULT_MAX_AGE_DAYS};

/// Width of the scraper worker pool.
pub const MAX_PARALLEL_SCRAPERS: usize = 5;

/// Bucket name for articles without a category.
pub const UNCATEGORIZED: &str = "uncategorized";

/// Storage statistics plus configuration context.
#[derive(Debug)]
pub struct AggregatorStats {
    pub storage: StorageStats,
    pub sources_configured: usize,
    pub categories: Vec<String>,
}

pub struct NewsAggregator {
    config: AppConfig,
    storage: ArticleStorage,
    scrapers: Vec<Box<dyn Scraper>>,
}

impl NewsAggregator {
    pub fn from_config_path(path: &Path) -> Result<Self> {
        let config = config::load_config(path)?;
        Self::from_config(config)
    }

    pub fn from_config(config: AppConfig) -> Result<Self> {
        let storage = ArticleStorage::new(&config.storage.path)?;
        let scrapers = build_scrapers(&config)?;
        Ok(Self {
            config,
            storage,
            scrapers,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn storage(&self) -> &ArticleStorage {
        &self.storage
    }

    /// Scrape every enabled source and persist the results.
    ///
    /// Each scraper's batch is saved as soon as it completes; a per-source
    /// save failure is logged but neither drops that source's articles from
    /// the combined set nor aborts the run. The final `all_sources` save
    /// propagates failure — losing the combined batch is a run-level error.
    #[instrument(level = "info", skip(self))]
    pub async fn run(&self, parallel: bool) -> Result<Vec<Article>> {
        info!(sources = self.scrapers.len(), parallel, "Starting news aggregation");

        let mut all_articles = Vec::new();

        if parallel && self.scrapers.len() > 1 {
            let results: Vec<Vec<Article>> = stream::iter(self.scrapers.iter())
                .map(|scraper| async move {
                    let articles = scraper.scrape().await;
                    self.save_source_batch(scraper.source_name(), &articles).await;
                    articles
                })
                .buffer_unordered(MAX_PARALLEL_SCRAPERS)
                .collect()
                .await;
            for articles in results {
                all_articles.extend(articles);
            }
        } else {
            for scraper in &self.scrapers {
                let articles = scraper.scrape().await;
                self.save_source_batch(scraper.source_name(), &articles).await;
                all_articles.extend(articles);
            }
        }

        if !all_articles.is_empty() {
            self.storage
                .save_articles(&all_articles, Some("all_sources"))
                .await?;
        }

        info!(
            total = all_articles.len(),
            sources = self.scrapers.len(),
            "Aggregation complete"
        );
        Ok(all_articles)
    }

    async fn save_source_batch(&self, source: &str, articles: &[Article]) {
        if articles.is_empty() {
            return;
        }
        if let Err(e) = self.storage.save_articles(articles, Some(source)).await {
            error!(source, error = %e, "Failed to save source batch");
        }
    }

    /// Recent articles from storage, newest first.
    pub async fn recent(&self, limit: usize, category: Option<&str>) -> Vec<Article> {
        self.storage.latest_articles(limit, category).await
    }

    /// All stored articles in the default window, bucketed by category.
    ///
    /// Every article lands in exactly one bucket; articles without a
    /// category land in [`UNCATEGORIZED`]. Buckets are sorted by
    /// `scraped_at` descending.
    pub async fn categorized(&self) -> HashMap<String, Vec<Article>> {
        let articles = self.storage.load_recent(None, DEFAULT_MAX_AGE_DAYS).await;

        let mut buckets: HashMap<String, Vec<Article>> = HashMap::new();
        for article in articles {
            let key = article
                .category
                .clone()
                .unwrap_or_else(|| UNCATEGORIZED.to_string());
            buckets.entry(key).or_default().push(article);
        }
        for bucket in buckets.values_mut() {
            bucket.sort_by(|a, b| b.scraped_at.cmp(&a.scraped_at));
        }
        buckets
    }

    /// Delete batches older than the configured retention window.
    pub async fn cleanup(&self) -> usize {
        self.storage.cleanup_old(self.config.storage.max_age_days).await
    }

    pub async fn stats(&self) -> AggregatorStats {
        AggregatorStats {
            storage: self.storage.stats().await,
            sources_configured: self.config.news_sources.rss_feeds.len()
                + self.config.news_sources.web_sources.len(),
            categories: self.config.categories.clone(),
        }
    }
}

fn build_scrapers(config: &AppConfig) -> Result<Vec<Box<dyn Scraper>>> {
    let mut scrapers: Vec<Box<dyn Scraper>> = Vec::new();

    for feed in &config.news_sources.rss_feeds {
        if !feed.enabled {
            continue;
        }
        require_source_fields(&feed.name, &feed.url, &feed.category)?;
        scrapers.push(Box::new(RssScraper::new(
            feed.name.clone(),
            feed.url.clone(),
            feed.category.clone(),
            &config.scraping,
        )?));
    }

    for web in &config.news_sources.web_sources {
        if !web.enabled {
            continue;
        }
        require_source_fields(&web.name, &web.url, &web.category)?;
        if web.name == hackernews::SOURCE_NAME {
            scrapers.push(Box::new(HackerNewsScraper::new(&config.scraping)?));
        } else {
            scrapers.push(Box::new(WebScraper::new(
                web.name.clone(),
                web.url.clone(),
                web.category.clone(),
                &config.scraping,
                web.selector.as_deref(),
                web.title_selector.as_deref(),
                web.link_selector.as_deref(),
            )?));
        }
    }

    info!(count = scrapers.len(), "Built scrapers from configuration");
    Ok(scrapers)
}

/// An enabled source with a blank required field is a fatal configuration
/// error, caught before any scraper is built.
fn require_source_fields(name: &str, url: &str, category: &str) -> Result<()> {
    if name.trim().is_empty() || url.trim().is_empty() || category.trim().is_empty() {
        return Err(crate::error::NewsError::Config(format!(
            "enabled source `{name}` is missing a required field (name, url, or category)"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NewsSources, RssSourceConfig, ScrapingConfig, StorageConfig};

    fn test_config(feed_url: &str, storage_path: &Path) -> AppConfig {
        AppConfig {
            news_sources: NewsSources {
                rss_feeds: vec![
                    RssSourceConfig {
                        name: "Mock Feed".to_string(),
                        url: feed_url.to_string(),
                        category: "tech".to_string(),
                        enabled: true,
                    },
                    RssSourceConfig {
                        name: "Disabled Feed".to_string(),
                        url: "http://127.0.0.1:1/unused".to_string(),
                        category: "tech".to_string(),
                        enabled: false,
                    },
                ],
                web_sources: Vec::new(),
            },
            scraping: ScrapingConfig {
                delay_between_requests: 0.0,
                max_articles_per_source: 10,
                ..ScrapingConfig::default()
            },
            storage: StorageConfig {
                path: storage_path.to_string_lossy().into_owned(),
                max_age_days: 7,
            },
            categories: vec!["tech".to_string(), "science".to_string()],
        }
    }

    // Entry links point back at the mock server so no test traffic ever
    // leaves the loopback interface.
    fn feed_body(base: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel>
<title>Mock Feed</title>
<link>{base}</link>
<description>mock</description>
<item><title>Alpha</title><link>{base}/a</link><description>alpha body</description></item>
<item><title>Beta</title><link>{base}/b</link><description>beta body</description></item>
</channel></rss>"#
        )
    }

    #[tokio::test]
    async fn test_run_saves_source_and_combined_batches() {
        let mut server = mockito::Server::new_async().await;
        let base = server.url();
        let _feed = server
            .mock("GET", "/feed.xml")
            .with_status(200)
            .with_body(feed_body(&base))
            .expect_at_least(1)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&format!("{}/feed.xml", server.url()), dir.path());
        let aggregator = NewsAggregator::from_config(config).unwrap();

        // Only the enabled source is scraped.
        assert_eq!(aggregator.scrapers.len(), 1);

        let articles = aggregator.run(false).await.unwrap();
        assert_eq!(articles.len(), 2);

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 2);
        assert!(names.iter().any(|n| n.starts_with("Mock Feed_")));
        assert!(names.iter().any(|n| n.starts_with("all_sources_")));
    }

    #[tokio::test]
    async fn test_unreachable_source_contributes_zero_articles() {
        let dir = tempfile::tempdir().unwrap();
        // Nothing listens on port 1; the scrape fails and recovers to empty.
        let config = test_config("http://127.0.0.1:1/feed.xml", dir.path());
        let aggregator = NewsAggregator::from_config(config).unwrap();

        let articles = aggregator.run(true).await.unwrap();
        assert!(articles.is_empty());
        // No batches are written for an empty run.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_categorized_partitions_with_uncategorized_bucket() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config("http://127.0.0.1:1/feed.xml", dir.path());
        let aggregator = NewsAggregator::from_config(config).unwrap();

        let make = |title: &str, category: Option<&str>| crate::models::Article {
            title: title.to_string(),
            url: format!("https://example.com/{title}"),
            body: "body".to_string(),
            summary: None,
            category: category.map(str::to_string),
            source: "Seed".to_string(),
            published_at: None,
            scraped_at: chrono::Utc::now(),
            author: None,
            tags: Vec::new(),
        };
        let seeded = vec![
            make("t1", Some("tech")),
            make("t2", Some("tech")),
            make("s1", Some("science")),
            make("n1", None),
        ];
        aggregator
            .storage()
            .save_articles(&seeded, Some("seed"))
            .await
            .unwrap();

        let buckets = aggregator.categorized().await;
        assert_eq!(buckets.get("tech").map(Vec::len), Some(2));
        assert_eq!(buckets.get("science").map(Vec::len), Some(1));
        assert_eq!(buckets.get(UNCATEGORIZED).map(Vec::len), Some(1));

        // Bucket union recovers the full input set.
        let total: usize = buckets.values().map(Vec::len).sum();
        assert_eq!(total, seeded.len());
    }

    #[tokio::test]
    async fn test_blank_required_field_is_fatal_at_construction() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config("http://127.0.0.1:1/feed.xml", dir.path());
        config.news_sources.rss_feeds[0].url = "   ".to_string();

        let result = NewsAggregator::from_config(config);
        assert!(matches!(
            result,
            Err(crate::error::NewsError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_stats_include_configuration_context() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config("http://127.0.0.1:1/feed.xml", dir.path());
        let aggregator = NewsAggregator::from_config(config).unwrap();

        let stats = aggregator.stats().await;
        assert_eq!(stats.sources_configured, 2);
        assert_eq!(stats.categories, vec!["tech", "science"]);
        assert_eq!(stats.storage.total_articles, 0);
    }
}
