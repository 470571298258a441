//! YAML source configuration.
//!
//! The aggregator is driven by a `sources.yaml` document describing the RSS
//! and web sources to scrape, shared scraping options, the storage root, and
//! the candidate category list. Missing required keys fail deserialization,
//! which is fatal at aggregator construction time.
//!
//! ```yaml
//! news_sources:
//!   rss_feeds:
//!     - name: Example Feed
//!       url: https://example.com/rss.xml
//!       category: tech
//!   web_sources:
//!     - name: Example Site
//!       url: https://example.com/news
//!       category: science
//!       enabled: true
//!       selector: ".article"
//!       title_selector: "h2"
//! scraping:
//!   delay_between_requests: 1.0
//!   max_articles_per_source: 10
//! storage:
//!   path: data/articles
//!   max_age_days: 7
//! categories: [tech, finance, health]
//! ```

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::error::Result;

/// Top-level configuration document.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub news_sources: NewsSources,
    #[serde(default)]
    pub scraping: ScrapingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default = "crate::processors::categorizer::default_categories")]
    pub categories: Vec<String>,
}

/// The configured scrape targets, grouped by kind.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewsSources {
    #[serde(default)]
    pub rss_feeds: Vec<RssSourceConfig>,
    #[serde(default)]
    pub web_sources: Vec<WebSourceConfig>,
}

/// One RSS/Atom feed source. Enabled unless switched off.
#[derive(Debug, Clone, Deserialize)]
pub struct RssSourceConfig {
    pub name: String,
    pub url: String,
    pub category: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// One selector-driven web source. Disabled unless switched on.
#[derive(Debug, Clone, Deserialize)]
pub struct WebSourceConfig {
    pub name: String,
    pub url: String,
    pub category: String,
    #[serde(default)]
    pub enabled: bool,
    /// CSS selector for article containers. Defaults to `.article`.
    pub selector: Option<String>,
    /// CSS selector for the title inside a container. Defaults to `h2, h3, .title`.
    pub title_selector: Option<String>,
    /// CSS selector for the link inside a container. Defaults to `a`.
    pub link_selector: Option<String>,
}

/// Options shared by every scraper instance.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScrapingConfig {
    /// Cooperative sleep between successive fetches, in seconds.
    pub delay_between_requests: f64,
    /// Cap on articles taken from any single source per run.
    pub max_articles_per_source: usize,
    /// User-Agent header sent with every request.
    pub user_agent: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            delay_between_requests: 1.0,
            max_articles_per_source: 10,
            user_agent: "NewsAggregator/1.0".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Where batches live and how long they are retained.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub path: String,
    pub max_age_days: i64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: "data/articles".to_string(),
            max_age_days: 7,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Load and parse the configuration document at `path`.
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let raw = std::fs::read_to_string(path)?;
    let config: AppConfig = serde_yaml::from_str(&raw)?;
    info!(path = %path.display(), "Loaded configuration");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
news_sources:
  rss_feeds:
    - name: Example Feed
      url: https://example.com/rss.xml
      category: tech
    - name: Disabled Feed
      url: https://example.com/other.xml
      category: science
      enabled: false
  web_sources:
    - name: Example Site
      url: https://example.com/news
      category: science
      enabled: true
      selector: ".story"
      title_selector: "h2"
scraping:
  delay_between_requests: 0.5
  max_articles_per_source: 5
storage:
  path: /tmp/articles
  max_age_days: 3
categories:
  - tech
  - science
"#;

    #[test]
    fn test_parse_full_config() {
        let config: AppConfig = serde_yaml::from_str(SAMPLE).unwrap();

        assert_eq!(config.news_sources.rss_feeds.len(), 2);
        assert!(config.news_sources.rss_feeds[0].enabled);
        assert!(!config.news_sources.rss_feeds[1].enabled);

        let web = &config.news_sources.web_sources[0];
        assert!(web.enabled);
        assert_eq!(web.selector.as_deref(), Some(".story"));
        assert!(web.link_selector.is_none());

        assert_eq!(config.scraping.delay_between_requests, 0.5);
        assert_eq!(config.scraping.max_articles_per_source, 5);
        assert_eq!(config.scraping.user_agent, "NewsAggregator/1.0");

        assert_eq!(config.storage.path, "/tmp/articles");
        assert_eq!(config.storage.max_age_days, 3);
        assert_eq!(config.categories, vec!["tech", "science"]);
    }

    #[test]
    fn test_missing_required_key_is_an_error() {
        let yaml = r#"
news_sources:
  rss_feeds:
    - name: No URL Here
      category: tech
"#;
        assert!(serde_yaml::from_str::<AppConfig>(yaml).is_err());
    }

    #[test]
    fn test_defaults_applied_when_sections_absent() {
        let yaml = "news_sources: {}\n";
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();

        assert!(config.news_sources.rss_feeds.is_empty());
        assert_eq!(config.scraping.max_articles_per_source, 10);
        assert_eq!(config.scraping.request_timeout_secs, 30);
        assert_eq!(config.storage.path, "data/articles");
        assert_eq!(config.storage.max_age_days, 7);
        assert!(config.categories.contains(&"tech".to_string()));
    }

    #[test]
    fn test_web_sources_default_disabled() {
        let yaml = r#"
news_sources:
  web_sources:
    - name: Quiet Site
      url: https://example.com
      category: tech
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(!config.news_sources.web_sources[0].enabled);
    }
}
