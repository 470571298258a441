//! # Newspool
//!
//! A news aggregation pipeline that scrapes articles from RSS feeds and web
//! pages, stores them as flat JSON batch files, and optionally enriches them
//! with AI-generated summaries and categories.
//!
//! ## Architecture
//!
//! The pipeline has two independent stages, each with its own binary:
//!
//! 1. **Aggregation** (`newspool`): a [`aggregator::NewsAggregator`] reads
//!    the YAML source configuration, runs one scraper per enabled source
//!    through a bounded worker pool, and persists each source's batch plus a
//!    combined `all_sources` batch.
//! 2. **Processing** (`newspool-process`): an
//!    [`processors::ArticleProcessor`] loads stored batches, applies
//!    summarization and categorization to copies of the articles, and saves
//!    the enriched set as a new batch.
//!
//! Storage is flat JSON files, one batch per save, queried by scanning the
//! storage directory — see [`storage::ArticleStorage`].

pub mod aggregator;
pub mod config;
pub mod error;
pub mod fetch;
pub mod models;
pub mod processors;
pub mod scrapers;
pub mod storage;
pub mod utils;

pub use aggregator::NewsAggregator;
pub use error::{NewsError, Result};
pub use models::{Article, ArticleBatch};
pub use processors::ArticleProcessor;
pub use storage::ArticleStorage;
