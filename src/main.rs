//! Aggregator entry point: scrape all configured sources and store the
//! results, then print the latest articles (or just statistics).

use std::error::Error;
use std::path::Path;

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

use newspool::aggregator::NewsAggregator;

/// Command-line arguments for the news aggregator.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/sources.yaml")]
    config: String,

    /// Run scrapers one at a time instead of through the parallel pool
    #[arg(long)]
    sequential: bool,

    /// Clean up old article batches after scraping
    #[arg(long)]
    cleanup: bool,

    /// Show statistics only, without scraping
    #[arg(long)]
    stats: bool,

    /// Filter displayed articles by category
    #[arg(long)]
    category: Option<String>,

    /// Limit number of articles to display
    #[arg(short, long, default_value_t = 50)]
    limit: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let aggregator = NewsAggregator::from_config_path(Path::new(&args.config))?;

    if args.stats {
        let stats = aggregator.stats().await;
        println!("\n=== News Aggregation Statistics ===");
        println!("Total articles: {}", stats.storage.total_articles);
        println!("Sources configured: {}", stats.sources_configured);
        println!("\nArticles by source:");
        for (source, count) in &stats.storage.sources {
            println!("  {source}: {count}");
        }
        println!("\nArticles by category:");
        for (category, count) in &stats.storage.categories {
            println!("  {category}: {count}");
        }
        return Ok(());
    }

    let articles = aggregator.run(!args.sequential).await?;
    info!(count = articles.len(), "Aggregation run finished");

    if args.cleanup {
        let removed = aggregator.cleanup().await;
        info!(removed, "Cleanup finished");
    }

    let recent = aggregator
        .recent(args.limit, args.category.as_deref())
        .await;

    println!("\n=== Latest {} Articles ===", recent.len());
    for article in &recent {
        println!(
            "\n[{}] {}",
            article
                .category
                .as_deref()
                .unwrap_or("uncategorized")
                .to_uppercase(),
            article.title
        );
        println!("Source: {}", article.source);
        println!("URL: {}", article.url);
        println!("Scraped: {}", article.scraped_at.format("%Y-%m-%d %H:%M"));
        if article.body.chars().count() > 200 {
            let preview: String = article.body.chars().take(200).collect();
            println!("Preview: {preview}...");
        } else {
            println!("Content: {}", article.body);
        }
        println!("{}", "-".repeat(80));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["newspool"]);
        assert_eq!(cli.config, "config/sources.yaml");
        assert!(!cli.sequential);
        assert!(!cli.cleanup);
        assert!(!cli.stats);
        assert!(cli.category.is_none());
        assert_eq!(cli.limit, 50);
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::parse_from([
            "newspool",
            "--config",
            "/etc/newspool/sources.yaml",
            "--sequential",
            "--cleanup",
            "--category",
            "tech",
            "--limit",
            "5",
        ]);
        assert_eq!(cli.config, "/etc/newspool/sources.yaml");
        assert!(cli.sequential);
        assert!(cli.cleanup);
        assert_eq!(cli.category.as_deref(), Some("tech"));
        assert_eq!(cli.limit, 5);
    }
}
