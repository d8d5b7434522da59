//! Page-Harvest main entry point
//!
//! This is the command-line interface for the Page-Harvest crawler.

use anyhow::Context;
use clap::Parser;
use page_harvest::config::{
    load_settings_with_hash, CrawlConfig, CrawlSettings, FetchMode, PolitenessPolicy,
    TraversalOrder,
};
use page_harvest::crawler::run_crawl;
use page_harvest::output::{export, print_summary};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Page-Harvest: a depth-bounded text harvester
///
/// Crawls a website outward from a seed URL, extracts the title, meta
/// description, headings and main body text of every page, and writes one
/// CSV row per page.
#[derive(Parser, Debug)]
#[command(name = "page-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A depth-bounded web text harvester", long_about = None)]
struct Cli {
    /// Seed URL to start crawling from
    #[arg(value_name = "URL")]
    url: String,

    /// Output CSV file
    #[arg(short, long, value_name = "FILE", default_value = "crawled_data.csv")]
    output: PathBuf,

    /// Maximum crawl depth
    #[arg(short, long)]
    depth: Option<u32>,

    /// Maximum number of pages to visit
    #[arg(short, long)]
    max_pages: Option<usize>,

    /// Delay between requests in seconds
    #[arg(short = 'w', long)]
    delay: Option<f64>,

    /// Maximum number of URLs queued per depth level
    #[arg(long)]
    max_queue_size: Option<usize>,

    /// Follow links to other hosts
    #[arg(long)]
    no_domain_restrict: bool,

    /// Load pages through a headless browser so scripts run first
    #[arg(long)]
    render: bool,

    /// Visit each depth level in random order
    #[arg(long)]
    shuffle: bool,

    /// Seed for --shuffle, for reproducible crawls
    #[arg(long, value_name = "N")]
    seed: Option<u64>,

    /// Skip URLs disallowed by robots.txt
    #[arg(long)]
    strict_robots: bool,

    /// Path to TOML settings file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate settings and show the resolved configuration without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let settings = match &cli.config {
        Some(path) => {
            tracing::info!("Loading settings from: {}", path.display());
            let (settings, hash) = load_settings_with_hash(path)
                .with_context(|| format!("failed to load settings from {}", path.display()))?;
            tracing::info!("Settings loaded successfully (hash: {})", hash);
            settings
        }
        None => CrawlSettings::default(),
    };

    let settings = apply_overrides(settings, &cli);
    let config = CrawlConfig::new(&cli.url, settings).context("invalid crawl configuration")?;

    if cli.dry_run {
        handle_dry_run(&config, &cli);
        return Ok(ExitCode::SUCCESS);
    }

    handle_crawl(config, &cli).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("page_harvest=info,warn"),
            1 => EnvFilter::new("page_harvest=debug,info"),
            2 => EnvFilter::new("page_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Layers command-line values over file settings
fn apply_overrides(mut settings: CrawlSettings, cli: &Cli) -> CrawlSettings {
    if let Some(depth) = cli.depth {
        settings.max_depth = depth;
    }
    if let Some(max_pages) = cli.max_pages {
        settings.max_pages = max_pages;
    }
    if let Some(delay) = cli.delay {
        settings.request_delay = delay;
    }
    if let Some(max_queue_size) = cli.max_queue_size {
        settings.max_queue_size = max_queue_size;
    }
    if cli.no_domain_restrict {
        settings.restrict_to_domain = false;
    }
    if cli.render {
        settings.fetch_mode = FetchMode::Rendered;
    }
    if cli.shuffle {
        settings.traversal_order = TraversalOrder::Shuffled;
    }
    if cli.seed.is_some() {
        settings.shuffle_seed = cli.seed;
    }
    if cli.strict_robots {
        settings.politeness = PolitenessPolicy::Strict;
    }
    settings
}

/// Handles the --dry-run mode: prints the resolved configuration
fn handle_dry_run(config: &CrawlConfig, cli: &Cli) {
    println!("=== Page-Harvest Dry Run ===\n");

    println!("Seed: {}", config.seed_url);
    println!("Output: {}", cli.output.display());

    println!("\nLimits:");
    println!("  Max depth: {}", config.max_depth);
    println!("  Max pages: {}", config.max_pages);
    println!("  Max queue size: {}", config.max_queue_size);

    println!("\nFetching:");
    println!("  Mode: {:?}", config.fetch_mode);
    println!("  Request delay: {:?}", config.request_delay);
    println!("  Request timeout: {:?}", config.request_timeout);
    println!(
        "  Retries: {} (backoff factor {})",
        config.max_retries, config.backoff_factor
    );
    println!("  Politeness: {:?}", config.politeness);
    for (name, value) in &config.headers {
        println!("  Header {}: {}", name, value);
    }

    println!("\nLinks:");
    println!("  Restrict to {}: {}", config.seed_host(), config.restrict_to_domain);
    println!("  Strip URL parameters: {}", config.strip_url_params);
    println!("  Traversal: {:?}", config.traversal_order);
    println!("  Ignored extensions: {}", config.ignored_extensions.join(" "));

    println!("\nContent selectors: {}", config.content_selectors.join(", "));

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: CrawlConfig, cli: &Cli) -> anyhow::Result<ExitCode> {
    let result = match run_crawl(config).await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    if !export(&result, &cli.output) {
        return Ok(ExitCode::FAILURE);
    }

    if !cli.quiet {
        print_summary(&result, &cli.output);
    }

    Ok(ExitCode::SUCCESS)
}
