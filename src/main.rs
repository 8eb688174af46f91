//! Sitemap-Sweep main entry point
//!
//! This is the command-line interface for the Sitemap-Sweep link checker.

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use sitemap_sweep::config::{load_or_default, validate, Config};
use sitemap_sweep::output::{aggregate, print_statistics, write_error_log, RunStatistics};
use sitemap_sweep::url::{host_label, parse_entrypoint};
use sitemap_sweep::Coordinator;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Sitemap-Sweep: a sitemap-driven broken link checker
///
/// Sitemap-Sweep reads a site's sitemap (following nested sitemap indices),
/// collects every hyperlink from the listed pages and reports the links
/// that do not answer with a 2xx status.
#[derive(Parser, Debug)]
#[command(name = "sitemap-sweep")]
#[command(version)]
#[command(about = "A sitemap-driven broken link checker", long_about = None)]
struct Cli {
    /// Sitemap URL to start from (prompted for when omitted)
    #[arg(short, long, value_name = "URL")]
    url: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Maximum number of concurrent link verifications
    #[arg(short, long, value_name = "N")]
    limit: Option<usize>,

    /// Maximum number of concurrent sitemap and page fetches
    #[arg(long, value_name = "N")]
    page_limit: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(short, long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Skip the confirmation before verifying links
    #[arg(short, long)]
    yes: bool,

    /// Keep query strings in link targets
    #[arg(long)]
    keep_query: bool,

    /// Directory receiving the error log
    #[arg(long, value_name = "PATH")]
    logs_dir: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match handle_sweep(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::from(2)
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sitemap_sweep=info,warn"),
            1 => EnvFilter::new("sitemap_sweep=debug,info"),
            2 => EnvFilter::new("sitemap_sweep=trace,debug"),
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

/// Loads the configuration file and applies command-line overrides
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    if let Some(path) = &cli.config {
        tracing::info!("Loading configuration from: {}", path.display());
    }
    let mut config = load_or_default(cli.config.as_deref())?;

    if let Some(limit) = cli.limit {
        config.crawler.link_concurrency = limit;
    }
    if let Some(page_limit) = cli.page_limit {
        config.crawler.page_concurrency = page_limit;
    }
    if let Some(timeout) = cli.timeout {
        config.crawler.request_timeout_secs = timeout;
    }
    if cli.keep_query {
        config.crawler.keep_query = true;
    }
    if let Some(logs_dir) = &cli.logs_dir {
        config.output.logs_dir = logs_dir.clone();
    }

    validate(&config).context("invalid command-line option")?;
    Ok(config)
}

/// Prints a prompt and reads one trimmed line from stdin
fn prompt(message: &str) -> anyhow::Result<String> {
    print!("{}", message);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read from stdin")?;
    Ok(line.trim().to_string())
}

/// Runs a blocking stdin read unless the token is cancelled first
///
/// Returns `None` when cancelled, leaving the read behind on its thread.
async fn read_unless_cancelled<F>(
    cancel: &CancellationToken,
    read: F,
) -> Option<anyhow::Result<String>>
where
    F: FnOnce() -> anyhow::Result<String> + Send + 'static,
{
    let reader = tokio::task::spawn_blocking(read);
    tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        answer = reader => Some(answer.map_err(anyhow::Error::from).and_then(|answer| answer)),
    }
}

fn confirmed(answer: &str) -> bool {
    matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Cancels the token on Ctrl-C
fn cancel_on_interrupt(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping");
            cancel.cancel();
        }
    });
}

/// Handles one sweep: discovery, confirmation, verification and reporting
async fn handle_sweep(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = build_config(&cli)?;

    let input = match &cli.url {
        Some(url) => url.clone(),
        None => prompt("Enter sitemap URL: ")?,
    };
    let entrypoint =
        parse_entrypoint(&input).with_context(|| format!("invalid sitemap URL {:?}", input))?;

    let cancel = CancellationToken::new();
    cancel_on_interrupt(cancel.clone());

    let started_at = Utc::now();
    let timer = Instant::now();

    let coordinator = Coordinator::new(config, cancel.clone())?;
    let discovery = coordinator.discover(&entrypoint).await?;

    println!(
        "A total of {} links were found in {} pages",
        discovery.links.len(),
        discovery.pages.len()
    );

    if !cli.yes {
        let answer =
            match read_unless_cancelled(&cancel, || prompt("Continue verifying URLs? (y/n) "))
                .await
            {
                Some(answer) => answer?,
                None => {
                    // The runtime would wait on the pending stdin read at shutdown
                    println!();
                    std::process::exit(2);
                }
            };
        if !confirmed(&answer) {
            println!("Verification skipped");
            return Ok(ExitCode::from(1));
        }
    }

    let results = coordinator.verify(discovery.links.clone()).await?;
    let report = aggregate(results);

    let logs_dir = Path::new(&coordinator.config().output.logs_dir);
    let log_path = write_error_log(&report, logs_dir, &host_label(&entrypoint), started_at)
        .with_context(|| format!("failed to write error log in {}", logs_dir.display()))?;

    let stats = RunStatistics::collect(&discovery, &report, timer.elapsed(), log_path);
    print_statistics(&stats, &report);

    Ok(ExitCode::SUCCESS)
}
