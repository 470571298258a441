//! Enrichment pipeline: summarize and categorize stored articles.
//!
//! The [`ArticleProcessor`] loads previously scraped batches, applies
//! summarization then categorization to a *copy* of each article (scrape
//! output stays auditable), and persists the enriched set as a new
//! `processed_*` batch. Backend failures never surface here — each
//! processor degrades per call to its local heuristic.

use std::collections::HashMap;

use tracing::{debug, info, instrument};

use crate::error::Result;
use crate::models::Article;
use crate::storage::{ArticleStorage, DEFAULT_MAX_AGE_DAYS};

pub mod api;
pub mod categorizer;
pub mod summarizer;

use categorizer::ArticleCategorizer;
use itertools::Itertools;
use summarizer::ArticleSummarizer;

/// What to apply during a processing run.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    pub summarize: bool,
    pub categorize: bool,
    pub max_summary_length: usize,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            summarize: true,
            categorize: true,
            max_summary_length: 200,
        }
    }
}

/// Statistics over a processed (or about-to-be-processed) article set.
#[derive(Debug, Clone)]
pub struct ProcessingStats {
    pub total_articles: usize,
    pub with_summaries: usize,
    pub with_categories: usize,
    pub categories: HashMap<String, usize>,
    pub sources: HashMap<String, usize>,
    pub avg_summary_length: f64,
}

/// Compute [`ProcessingStats`] for a set of articles.
pub fn processing_stats(articles: &[Article]) -> ProcessingStats {
    let summary_lengths: Vec<usize> = articles
        .iter()
        .filter_map(|a| a.summary.as_ref().map(String::len))
        .collect();
    let avg_summary_length = if summary_lengths.is_empty() {
        0.0
    } else {
        summary_lengths.iter().sum::<usize>() as f64 / summary_lengths.len() as f64
    };

    ProcessingStats {
        total_articles: articles.len(),
        with_summaries: summary_lengths.len(),
        with_categories: articles.iter().filter(|a| a.category.is_some()).count(),
        categories: articles
            .iter()
            .filter_map(|a| a.category.clone())
            .counts(),
        sources: articles.iter().map(|a| a.source.clone()).counts(),
        avg_summary_length,
    }
}

pub struct ArticleProcessor {
    summarizer: ArticleSummarizer,
    categorizer: ArticleCategorizer,
    storage: ArticleStorage,
}

impl ArticleProcessor {
    pub fn new(
        summarizer: ArticleSummarizer,
        categorizer: ArticleCategorizer,
        storage: ArticleStorage,
    ) -> Self {
        Self {
            summarizer,
            categorizer,
            storage,
        }
    }

    pub fn storage(&self) -> &ArticleStorage {
        &self.storage
    }

    /// Enrich a copy of one article. The original is never mutated.
    pub async fn process_article(&self, article: &Article, options: &ProcessOptions) -> Article {
        let mut processed = article.clone();

        if options.summarize {
            debug!(title = %crate::utils::truncate_for_log(&article.title, 50), "Summarizing article");
            processed.summary = Some(
                self.summarizer
                    .summarize(&article.body, options.max_summary_length)
                    .await,
            );
        }

        if options.categorize {
            // Title plus a body excerpt categorizes better than either alone.
            let excerpt: String = article.body.chars().take(1000).collect();
            let text = format!("{}. {}", article.title, excerpt);
            if let Some(category) = self.categorizer.categorize(&text).await {
                processed.category = Some(category);
            }
        }

        processed
    }

    /// Enrich each article independently, preserving order.
    pub async fn process_articles(
        &self,
        articles: &[Article],
        options: &ProcessOptions,
    ) -> Vec<Article> {
        info!(count = articles.len(), "Processing articles");

        let mut processed = Vec::with_capacity(articles.len());
        for (index, article) in articles.iter().enumerate() {
            processed.push(self.process_article(article, options).await);
            if (index + 1) % 10 == 0 {
                info!(processed = index + 1, total = articles.len(), "Processing progress");
            }
        }

        info!(count = processed.len(), "Completed processing");
        processed
    }

    /// Load stored articles, enrich them, and save the result as a new
    /// `processed_{source|all}` batch. The save failure propagates — a lost
    /// processing run is an error, not a warning.
    #[instrument(level = "info", skip(self, options))]
    pub async fn process_stored(
        &self,
        source: Option<&str>,
        max_articles: usize,
        options: &ProcessOptions,
    ) -> Result<Vec<Article>> {
        info!(?source, max_articles, "Loading stored articles for processing");
        let mut articles = self.storage.load_recent(source, DEFAULT_MAX_AGE_DAYS).await;

        if articles.len() > max_articles {
            articles.truncate(max_articles);
            info!(max_articles, "Limited article set");
        }

        let processed = self.process_articles(&articles, options).await;

        if !processed.is_empty() {
            let label = format!("processed_{}", source.unwrap_or("all"));
            self.storage.save_articles(&processed, Some(&label)).await?;
            info!(count = processed.len(), label, "Saved processed articles");
        }

        Ok(processed)
    }
}
