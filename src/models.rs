//! Data models for scraped news articles and their on-disk batches.
//!
//! This module defines the core data structures used throughout the
//! application:
//! - [`Article`]: the unit of record produced by scrapers and enriched by
//!   processors
//! - [`ArticleBatch`]: the file-level envelope written by storage, one batch
//!   per save
//!
//! Timestamps serialize as RFC 3339 text so batches survive a round trip
//! through storage value-identical.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single scraped news article.
///
/// `title`, `url`, `body`, and `source` are required for a record to be
/// valid; scrapers skip items that cannot provide them. `scraped_at` is
/// always set by the producing scraper, never by storage. `summary` and
/// `category` start out as the scraper's defaults and may be overwritten by
/// the enrichment pipeline, which operates on a copy — a scraped record is
/// never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    /// The article headline.
    pub title: String,
    /// Absolute URL the article was scraped from.
    pub url: String,
    /// Extracted main text of the article.
    pub body: String,
    /// AI- or feed-supplied summary, if any.
    pub summary: Option<String>,
    /// Category assigned at scrape time (source default) or by enrichment.
    pub category: Option<String>,
    /// Identifier of the scraper that produced this record.
    pub source: String,
    /// Publication timestamp from source metadata, when available.
    pub published_at: Option<DateTime<Utc>>,
    /// When the scraper produced this record.
    pub scraped_at: DateTime<Utc>,
    /// Byline author, when available.
    pub author: Option<String>,
    /// Topic tags from source metadata. May be empty.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// File-level envelope for one saved batch of articles.
///
/// Batches are append-only artifacts: one file per `save_articles` call,
/// never edited after the fact. There is no cross-batch index, so the same
/// article may legitimately appear in several batches (its per-source batch
/// and the combined `all_sources` batch, for example).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleBatch {
    /// When this batch was written.
    pub scraped_at: DateTime<Utc>,
    /// Label of the producing source, or `None` for unlabeled batches.
    pub source: Option<String>,
    /// Number of articles in the batch at write time.
    pub count: usize,
    /// The articles themselves, in scrape order.
    pub articles: Vec<Article>,
}
