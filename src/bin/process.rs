//! Processor entry point: load stored article batches, enrich them with
//! summaries and categories, and save the result as a new batch.

use std::error::Error;

use clap::{Parser, ValueEnum};
use tracing::{debug, info};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

use newspool::processors::categorizer::ArticleCategorizer;
use newspool::processors::summarizer::ArticleSummarizer;
use newspool::processors::{processing_stats, ArticleProcessor, ProcessOptions};
use newspool::storage::{ArticleStorage, DEFAULT_MAX_AGE_DAYS};

/// Which backend a processor should use.
#[derive(ValueEnum, Clone, Copy, Debug)]
enum BackendChoice {
    /// OpenAI-compatible chat API (needs OPENAI_API_KEY; degrades to the
    /// heuristic when absent)
    Remote,
    /// Local heuristic only
    Heuristic,
}

/// Command-line arguments for the article processor.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Filter stored batches by source name substring
    #[arg(long)]
    source: Option<String>,

    /// Maximum number of articles to process
    #[arg(long, default_value_t = 20)]
    max_articles: usize,

    /// Summarizer backend
    #[arg(long, value_enum, default_value_t = BackendChoice::Heuristic)]
    summarizer: BackendChoice,

    /// Categorizer backend
    #[arg(long, value_enum, default_value_t = BackendChoice::Heuristic)]
    categorizer: BackendChoice,

    /// Skip summarization
    #[arg(long)]
    no_summarize: bool,

    /// Skip categorization
    #[arg(long)]
    no_categorize: bool,

    /// Show statistics only, without processing
    #[arg(long)]
    stats_only: bool,

    /// Maximum summary length in characters
    #[arg(long, default_value_t = 200)]
    summary_length: usize,

    /// Storage directory holding article batches
    #[arg(long, default_value = "data/articles")]
    storage_path: String,
}

fn print_stats(stats: &newspool::processors::ProcessingStats) {
    println!("\n=== Article Processing Statistics ===");
    println!("Total articles: {}", stats.total_articles);
    println!("Articles with summaries: {}", stats.with_summaries);
    println!("Articles with categories: {}", stats.with_categories);
    println!("Average summary length: {:.1} chars", stats.avg_summary_length);

    println!("\nCategories:");
    for (category, count) in &stats.categories {
        println!("  {category}: {count}");
    }

    println!("\nSources:");
    for (source, count) in &stats.sources {
        println!("  {source}: {count}");
    }
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

    let storage = ArticleStorage::new(&args.storage_path)?;

    if args.stats_only {
        let mut articles = storage
            .load_recent(args.source.as_deref(), DEFAULT_MAX_AGE_DAYS)
            .await;
        articles.truncate(args.max_articles);
        print_stats(&processing_stats(&articles));
        return Ok(());
    }

    let summarizer = match args.summarizer {
        BackendChoice::Remote => ArticleSummarizer::remote(),
        BackendChoice::Heuristic => ArticleSummarizer::heuristic(),
    };
    let categorizer = match args.categorizer {
        BackendChoice::Remote => ArticleCategorizer::remote(None),
        BackendChoice::Heuristic => ArticleCategorizer::heuristic(None),
    };
    let processor = ArticleProcessor::new(summarizer, categorizer, storage);

    let options = ProcessOptions {
        summarize: !args.no_summarize,
        categorize: !args.no_categorize,
        max_summary_length: args.summary_length,
    };
    let processed = processor
        .process_stored(args.source.as_deref(), args.max_articles, &options)
        .await?;
    info!(count = processed.len(), "Processing run finished");

    println!("\n=== Processed {} Articles ===", processed.len());
    for article in processed.iter().take(5) {
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
        if let Some(summary) = &article.summary {
            println!("Summary: {summary}");
        }
        println!("{}", "-".repeat(80));
    }
    if processed.len() > 5 {
        println!("... and {} more articles", processed.len() - 5);
    }

    let stats = processing_stats(&processed);
    println!("\nProcessing completed:");
    println!(
        "  - {}/{} articles summarized",
        stats.with_summaries, stats.total_articles
    );
    println!(
        "  - {}/{} articles categorized",
        stats.with_categories, stats.total_articles
    );

    Ok(())
}
