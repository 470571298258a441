//! Flat-file JSON storage for article batches.
//!
//! Every save writes one new uniquely-named file — `{label}_{timestamp}.json`
//! — containing an [`ArticleBatch`] envelope. Because writers never share a
//! filename, concurrent scrapers need no locking. Loads scan the storage
//! directory for batch files whose modification time falls inside the
//! retention window; there is no index and no cross-batch deduplication, so
//! an article saved in both its per-source batch and the combined
//! `all_sources` batch appears once per batch on load.
//!
//! Write failures propagate (a failed save is data loss); read failures are
//! recovered per file, contributing nothing from the bad file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Local, Utc};
use itertools::{Itertools, MinMaxResult};
use tracing::{error, info, instrument};

use crate::error::Result;
use crate::models::{Article, ArticleBatch};

/// Retention window used by the query helpers when none is given.
pub const DEFAULT_MAX_AGE_DAYS: i64 = 7;

/// Summary of what is currently stored (within the default window).
#[derive(Debug, Clone)]
pub struct StorageStats {
    pub total_articles: usize,
    pub sources: HashMap<String, usize>,
    pub categories: HashMap<String, usize>,
    pub earliest: Option<DateTime<Utc>>,
    pub latest: Option<DateTime<Utc>>,
}

pub struct ArticleStorage {
    root: PathBuf,
}

impl ArticleStorage {
    /// Open (creating if needed) the storage directory at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Save one batch of articles to a new file.
    ///
    /// The filename is derived from `label` (default `articles`) plus a
    /// second-granularity timestamp. Write failures propagate — callers must
    /// treat a failed save as fatal for that batch, not swallow it.
    #[instrument(level = "info", skip_all, fields(label = label.unwrap_or("articles")))]
    pub async fn save_articles(
        &self,
        articles: &[Article],
        label: Option<&str>,
    ) -> Result<PathBuf> {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let filename = format!("{}_{timestamp}.json", label.unwrap_or("articles"));
        let path = self.root.join(filename);

        let batch = ArticleBatch {
            scraped_at: Utc::now(),
            source: label.map(str::to_string),
            count: articles.len(),
            articles: articles.to_vec(),
        };
        let json = serde_json::to_string_pretty(&batch)?;

        if let Err(e) = tokio::fs::write(&path, json).await {
            error!(path = %path.display(), error = %e, "Failed to write article batch");
            return Err(e.into());
        }

        info!(count = articles.len(), path = %path.display(), "Saved article batch");
        Ok(path)
    }

    /// Load one explicit batch file. A bad file is logged and contributes
    /// nothing — per-file failures never abort a wider load.
    pub async fn load_file(&self, path: &Path) -> Vec<Article> {
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) => {
                error!(path = %path.display(), error = %e, "Error reading batch file");
                return Vec::new();
            }
        };
        match serde_json::from_str::<ArticleBatch>(&raw) {
            Ok(batch) => batch.articles,
            Err(e) => {
                error!(path = %path.display(), error = %e, "Error parsing batch file");
                Vec::new()
            }
        }
    }

    /// Load every batch file modified within `max_age_days`, optionally
    /// keeping only files whose name contains `source` as a substring.
    ///
    /// Files are concatenated in directory-iteration order; callers needing
    /// a specific ordering must sort explicitly.
    pub async fn load_recent(&self, source: Option<&str>, max_age_days: i64) -> Vec<Article> {
        let cutoff = Utc::now() - Duration::days(max_age_days);
        let mut articles = Vec::new();

        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) => {
                error!(root = %self.root.display(), error = %e, "Error scanning storage directory");
                return articles;
            }
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    error!(root = %self.root.display(), error = %e, "Error scanning storage directory");
                    break;
                }
            };
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(filter) = source {
                let name = entry.file_name();
                if !name.to_string_lossy().contains(filter) {
                    continue;
                }
            }
            match file_mtime(&entry).await {
                Some(mtime) if mtime >= cutoff => {
                    articles.extend(self.load_file(&path).await);
                }
                _ => {}
            }
        }

        articles
    }

    /// Latest articles within the default window, optionally filtered by
    /// exact category, sorted by `scraped_at` descending and truncated.
    pub async fn latest_articles(&self, limit: usize, category: Option<&str>) -> Vec<Article> {
        let mut articles = self.load_recent(None, DEFAULT_MAX_AGE_DAYS).await;
        if let Some(category) = category {
            articles.retain(|a| a.category.as_deref() == Some(category));
        }
        articles.sort_by(|a, b| b.scraped_at.cmp(&a.scraped_at));
        articles.truncate(limit);
        articles
    }

    /// Delete every batch file strictly older than the cutoff. Per-file
    /// delete failures are logged and skipped. Returns the number removed.
    #[instrument(level = "info", skip(self))]
    pub async fn cleanup_old(&self, max_age_days: i64) -> usize {
        let cutoff = Utc::now() - Duration::days(max_age_days);
        let mut removed = 0usize;

        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) => {
                error!(root = %self.root.display(), error = %e, "Error scanning storage directory");
                return removed;
            }
        };

        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(mtime) = file_mtime(&entry).await else {
                continue;
            };
            if mtime < cutoff {
                match tokio::fs::remove_file(&path).await {
                    Ok(()) => {
                        removed += 1;
                        info!(path = %path.display(), "Removed old batch file");
                    }
                    Err(e) => {
                        error!(path = %path.display(), error = %e, "Error removing batch file");
                    }
                }
            }
        }

        if removed > 0 {
            info!(removed, "Cleaned up old batch files");
        }
        removed
    }

    /// Statistics over everything stored within the default window.
    pub async fn stats(&self) -> StorageStats {
        let articles = self.load_recent(None, DEFAULT_MAX_AGE_DAYS).await;

        let sources = articles.iter().map(|a| a.source.clone()).counts();
        let categories = articles
            .iter()
            .filter_map(|a| a.category.clone())
            .counts();
        let (earliest, latest) = match articles.iter().map(|a| a.scraped_at).minmax() {
            MinMaxResult::NoElements => (None, None),
            MinMaxResult::OneElement(only) => (Some(only), Some(only)),
            MinMaxResult::MinMax(min, max) => (Some(min), Some(max)),
        };

        StorageStats {
            total_articles: articles.len(),
            sources,
            categories,
            earliest,
            latest,
        }
    }
}

async fn file_mtime(entry: &tokio::fs::DirEntry) -> Option<DateTime<Utc>> {
    let metadata = entry.metadata().await.ok()?;
    let modified = metadata.modified().ok()?;
    Some(DateTime::<Utc>::from(modified))
}
