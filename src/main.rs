//! Sumi-Fetch main entry point
//!
//! This is the command-line interface for the Sumi-Fetch batch fetcher.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use sumi_fetch::config::{load_config_with_hash, HttpSettings, RunConfig};
use sumi_fetch::fetch::{CancellationToken, HttpFetcher, Orchestrator};
use sumi_fetch::output::{print_results, print_statistics, write_markdown_report, BatchStatistics};
use sumi_fetch::{ConfigError, SumiError};
use tracing_subscriber::EnvFilter;

/// Concurrency used when neither the command line nor a config file sets one
const DEFAULT_CONCURRENCY: usize = 8;

/// Sumi-Fetch: fetch a list of URLs concurrently and report the outcomes
///
/// Every URL produces exactly one result, reported in the order given, even
/// when fetches fail, time out, or are interrupted with Ctrl-C.
#[derive(Parser, Debug)]
#[command(name = "sumi-fetch")]
#[command(version)]
#[command(about = "Fetch a list of URLs concurrently and report the outcomes", long_about = None)]
struct Cli {
    /// URLs to fetch (appended after any listed in the config file)
    #[arg(value_name = "URL")]
    urls: Vec<String>,

    /// Path to TOML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Maximum number of concurrent fetches
    #[arg(short, long, value_name = "N")]
    concurrency: Option<usize>,

    /// Deadline for the whole batch in milliseconds (required without a config file)
    #[arg(long, value_name = "MS")]
    deadline_ms: Option<u64>,

    /// Timeout for each individual fetch in milliseconds
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// How long to wait past the deadline for in-flight fetches, in milliseconds
    #[arg(long, value_name = "MS")]
    grace_ms: Option<u64>,

    /// User-Agent header to send
    #[arg(long, value_name = "AGENT")]
    user_agent: Option<String>,

    /// Write a markdown report to this path
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,

    /// Validate options and list the URLs without fetching anything
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

/// Everything needed to run one batch, after merging file and flags
struct Plan {
    urls: Vec<String>,
    run: RunConfig,
    http: HttpSettings,
    report_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let plan = match build_plan(&cli) {
        Ok(plan) => plan,
        Err(e) => {
            tracing::error!("Invalid options: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&plan);
        return Ok(());
    }

    handle_fetch(plan, cli.quiet).await?;
    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_fetch=info,warn"),
            1 => EnvFilter::new("sumi_fetch=debug,info"),
            2 => EnvFilter::new("sumi_fetch=trace,debug"),
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

/// Merges the optional config file with command-line flags
///
/// Flags win over the file. Without a file the batch deadline must be given
/// explicitly, and at least one URL must come from either source.
fn build_plan(cli: &Cli) -> Result<Plan, SumiError> {
    let mut plan = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            Plan {
                urls: config.targets.urls.clone(),
                run: config.run_config(),
                http: config.http.clone(),
                report_path: config.output.report_path.as_ref().map(PathBuf::from),
            }
        }
        None => {
            let deadline_ms = cli.deadline_ms.ok_or_else(|| {
                ConfigError::Validation(
                    "--deadline-ms is required when no config file is given".to_string(),
                )
            })?;
            Plan {
                urls: Vec::new(),
                run: RunConfig::new(Duration::from_millis(deadline_ms), DEFAULT_CONCURRENCY),
                http: HttpSettings::default(),
                report_path: None,
            }
        }
    };

    plan.urls.extend(cli.urls.iter().cloned());
    if plan.urls.is_empty() {
        return Err(ConfigError::Validation("at least one URL is required".to_string()).into());
    }

    if let Some(deadline_ms) = cli.deadline_ms {
        plan.run.global_deadline = Duration::from_millis(deadline_ms);
    }
    if let Some(concurrency) = cli.concurrency {
        plan.run.max_concurrency = concurrency;
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        plan.run.per_request_timeout = Some(Duration::from_millis(timeout_ms));
    }
    if let Some(grace_ms) = cli.grace_ms {
        plan.run.grace_period = Duration::from_millis(grace_ms);
    }
    if let Some(user_agent) = &cli.user_agent {
        plan.http.user_agent = user_agent.clone();
    }
    if let Some(report) = &cli.report {
        plan.report_path = Some(report.clone());
    }

    plan.run.validate()?;
    Ok(plan)
}

/// Handles the --dry-run mode: shows what would be fetched
fn handle_dry_run(plan: &Plan) {
    println!("=== Sumi-Fetch Dry Run ===\n");

    println!("Batch Configuration:");
    println!("  Global deadline: {:?}", plan.run.global_deadline);
    println!("  Max concurrency: {}", plan.run.max_concurrency);
    match plan.run.per_request_timeout {
        Some(timeout) => println!("  Per-request timeout: {:?}", timeout),
        None => println!("  Per-request timeout: none"),
    }
    println!("  Grace period: {:?}", plan.run.grace_period);

    println!("\nHTTP:");
    println!("  User agent: {}", plan.http.user_agent);
    println!("  Connect timeout: {}ms", plan.http.connect_timeout_ms);
    println!("  Max redirects: {}", plan.http.max_redirects);

    if let Some(path) = &plan.report_path {
        println!("\nReport: {}", path.display());
    }

    println!("\nURLs ({}):", plan.urls.len());
    for (index, url) in plan.urls.iter().enumerate() {
        println!("  [{}] {}", index, url);
    }

    println!("\n✓ Options are valid");
}

/// Handles the main fetch operation
async fn handle_fetch(plan: Plan, quiet: bool) -> Result<(), SumiError> {
    let fetcher = HttpFetcher::from_settings(&plan.http)?;
    let orchestrator = Orchestrator::new(fetcher);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling outstanding fetches");
            trigger.cancel();
        }
    });

    let results = orchestrator
        .run_with_cancel(&plan.urls, &plan.run, cancel)
        .await?;
    let stats = BatchStatistics::from_results(&results);

    if !quiet {
        print_results(&results);
        println!();
        print_statistics(&stats);
    }

    if let Some(path) = &plan.report_path {
        write_markdown_report(&results, &stats, path)?;
        tracing::info!("Report written to: {}", path.display());
    }

    Ok(())
}
