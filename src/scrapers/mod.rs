//! Source scrapers that turn remote content into [`Article`] sequences.
//!
//! Each scraper implements the [`Scraper`] trait and owns its own HTTP
//! session; the aggregator drives them as trait objects through a bounded
//! worker pool.
//!
//! # Scraper kinds
//!
//! | Kind | Module | Input | Notes |
//! |------|--------|-------|-------|
//! | RSS/Atom feed | [`rss`] | feed URL | feed-rs parse, body from embedded content or linked page |
//! | Generic web page | [`web`] | base URL + CSS selectors | configurable container/title/link selectors |
//! | Link aggregator | [`hackernews`] | fixed | row + sibling-row metadata, synthesized body |
//!
//! # Common behavior
//!
//! - Per-item failures (missing title or link, unparsable entry) are logged
//!   and skipped; the remaining items still come back.
//! - A source-level failure (unreachable page, malformed feed) yields an
//!   empty result set, never an error — one bad source must not abort a run.
//! - Fetches within one scraper are strictly sequential with a cooperative
//!   rate-limit sleep between them.

use async_trait::async_trait;

use crate::models::Article;

pub mod hackernews;
pub mod rss;
pub mod web;

/// A single configured news source.
#[async_trait]
pub trait Scraper: Send + Sync {
    /// Identifier stamped into every article this scraper produces, and
    /// used to label its storage batches.
    fn source_name(&self) -> &str;

    /// Scrape the source. Failures are recovered internally; the result is
    /// whatever could be collected.
    async fn scrape(&self) -> Vec<Article>;
}
