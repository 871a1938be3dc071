//! Pressbox main entry point

use anyhow::Context;
use clap::Parser;
use pressbox::config::{load_config_with_hash, Config, SiteEntry};
use pressbox::crawler::{run_interval_scheduler, Orchestrator};
use pressbox::storage::{SiteUpsert, SqliteStorage, Storage};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Pressbox: a sitemap-driven sports news crawler
///
/// Pressbox watches the sitemaps of registered sports news sites, extracts
/// new articles under per-host rate limits, and stores each article exactly
/// once. By default it runs as a daemon, crawling each site on its own
/// interval.
#[derive(Parser, Debug)]
#[command(name = "pressbox")]
#[command(version = "1.0.0")]
#[command(about = "A sitemap-driven sports news crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Run a single crawl over all eligible sites and exit
    #[arg(long)]
    once: bool,

    /// Recency window in days (defaults to days-to-crawl from the config)
    #[arg(long)]
    days: Option<u32>,

    /// Restrict the crawl to these site domains (repeatable)
    #[arg(long = "site", value_name = "DOMAIN")]
    sites: Vec<String>,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with_all = ["once", "stats"])]
    dry_run: bool,

    /// Show article statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) =
        load_config_with_hash(&cli.config).context("failed to load configuration")?;
    tracing::info!("Configuration loaded (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    let config = Arc::new(config);
    let storage = Arc::new(Mutex::new(
        SqliteStorage::new(Path::new(&config.output.database_path))
            .context("failed to open database")?,
    ));

    seed_registry(&storage, &config)?;

    if cli.stats {
        handle_stats(&storage)?;
        return Ok(());
    }

    let orchestrator = Orchestrator::new(config.clone(), storage.clone())
        .context("failed to build crawl engine")?;

    let site_ids = resolve_site_filter(&storage, &cli.sites)?;
    let days = cli.days.unwrap_or(config.crawler.days_to_crawl);

    if cli.once {
        handle_single_run(&orchestrator, days, site_ids.as_deref()).await?;
    } else {
        handle_daemon(orchestrator, storage, config).await?;
    }

    Ok(())
}

/// Sets up the tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("pressbox=info,warn"),
            1 => EnvFilter::new("pressbox=debug,info"),
            2 => EnvFilter::new("pressbox=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Upserts the configured sites into the registry
fn seed_registry(
    storage: &Arc<Mutex<SqliteStorage>>,
    config: &Config,
) -> anyhow::Result<()> {
    let mut guard = storage.lock().unwrap();

    for entry in &config.sites {
        let upsert = site_upsert(entry, config);
        guard
            .upsert_site(&upsert)
            .with_context(|| format!("failed to register site '{}'", entry.name))?;
    }

    if !config.sites.is_empty() {
        tracing::info!("registry seeded with {} site(s) from config", config.sites.len());
    }

    Ok(())
}

fn site_upsert(entry: &SiteEntry, config: &Config) -> SiteUpsert {
    SiteUpsert {
        name: entry.name.clone(),
        domain: entry.domain.clone(),
        sitemap_url: entry.sitemap_url.clone(),
        crawl_interval_minutes: entry
            .crawl_interval_minutes
            .unwrap_or(config.crawler.default_crawl_interval_minutes),
        site_type: entry.site_type,
        sport_focus: entry.sport_focus.clone(),
    }
}

/// Maps `--site` domains to registry ids
fn resolve_site_filter(
    storage: &Arc<Mutex<SqliteStorage>>,
    domains: &[String],
) -> anyhow::Result<Option<Vec<i64>>> {
    if domains.is_empty() {
        return Ok(None);
    }

    let guard = storage.lock().unwrap();
    let mut ids = Vec::new();

    for domain in domains {
        match guard.get_site_by_domain(domain)? {
            Some(site) => ids.push(site.id),
            None => anyhow::bail!("site '{}' is not registered", domain),
        }
    }

    Ok(Some(ids))
}

/// Handles --dry-run: prints the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Pressbox Dry Run ===\n");

    println!("Crawler:");
    println!("  Workers: {}", config.crawler.workers);
    println!("  Days to crawl: {}", config.crawler.days_to_crawl);
    println!(
        "  Default interval: {} minutes",
        config.crawler.default_crawl_interval_minutes
    );
    println!("  Reject patterns: {}", config.crawler.reject_patterns.len());

    println!("\nFetch:");
    println!(
        "  Delay window: {:.1}s - {:.1}s",
        config.fetch.delay_min_secs, config.fetch.delay_max_secs
    );
    println!("  Timeout: {}s", config.fetch.timeout_secs);

    println!("\nUser Agent: {}", config.user_agent.header_value());
    println!("Database: {}", config.output.database_path);

    println!("\nSites ({}):", config.sites.len());
    for site in &config.sites {
        let focus = site.sport_focus.as_deref().unwrap_or("general");
        println!("  - {} [{}] {}", site.name, focus, site.sitemap_url);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles --stats: prints article counts from the database
fn handle_stats(storage: &Arc<Mutex<SqliteStorage>>) -> anyhow::Result<()> {
    let guard = storage.lock().unwrap();

    println!("Articles: {}\n", guard.count_articles()?);

    println!("By category:");
    for (category, count) in guard.count_articles_by_category()? {
        println!("  {:<16} {}", category, count);
    }

    println!("\nBy site:");
    for (site, count) in guard.count_articles_by_site()? {
        println!("  {:<24} {}", site, count);
    }

    Ok(())
}

/// Handles --once: starts one run and polls status until it finishes
async fn handle_single_run(
    orchestrator: &Orchestrator,
    days: u32,
    site_ids: Option<&[i64]>,
) -> anyhow::Result<()> {
    orchestrator
        .start(days, site_ids)
        .context("crawl not accepted")?;

    while orchestrator.is_running() {
        tokio::time::sleep(Duration::from_millis(500)).await;
    }

    let status = orchestrator.status();
    println!(
        "Run {:?}: {}/{} entries processed, {} articles saved, {} error(s)",
        status.state.expect("run was started"),
        status.progress,
        status.total,
        status.articles_saved,
        status.errors.len()
    );

    for error in &status.errors {
        println!("  ! {}", error);
    }

    Ok(())
}

/// Default mode: interval scheduler until Ctrl+C
async fn handle_daemon(
    orchestrator: Orchestrator,
    storage: Arc<Mutex<SqliteStorage>>,
    config: Arc<Config>,
) -> anyhow::Result<()> {
    let scheduler = tokio::spawn(run_interval_scheduler(
        orchestrator.clone(),
        storage,
        config,
    ));

    tracing::info!("Pressbox running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;

    tracing::info!("shutdown signal received");
    orchestrator.stop();
    scheduler.abort();

    // let an in-flight unit of work observe the cancellation
    while orchestrator.is_running() {
        tokio::time::sleep(Duration::from_millis(200)).await;
    }

    tracing::info!("Pressbox stopped");
    Ok(())
}
