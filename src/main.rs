//! Pulseboard - content-marketing analytics dashboard
//!
//! A CLI tool that loads uploaded CSV performance exports (LinkedIn,
//! YouTube, newsletter, lead magnet) from local directories or the managed
//! backend, aggregates them, and renders a dashboard.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (bad config, no sources, write failure, etc.)
//!   2 - Every configured source failed to load

mod analysis;
mod cli;
mod config;
mod models;
mod report;
mod source;

use analysis::{build_dashboard, Aggregator, DashboardOptions};
use anyhow::{bail, Context, Result};
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE};
use indicatif::{ProgressBar, ProgressStyle};
use models::Scope;
use source::{LocalSource, RemoteConfig, RemoteSource, ReportSource, ScanConfig};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("Pulseboard v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run_dashboard(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Dashboard run failed: {}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .pulseboard.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to set directories, backend, scope and column rules.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the complete load → aggregate → render workflow. Returns exit code (0 or 2).
async fn run_dashboard(args: Args) -> Result<i32> {
    let start_time = Instant::now();

    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let scope = config.scope.clone();
    let sources = build_sources(&config)?;
    if sources.is_empty() {
        bail!("No report sources configured; pass --dir or --backend-url, or set them in {}", CONFIG_FILE);
    }

    if args.dry_run {
        return handle_dry_run(&sources, &scope);
    }

    // Step 1: Load reports
    let spinner = (!args.quiet).then(|| {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(format!("Loading reports from {} source(s)...", sources.len()));
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    });

    let outcome = source::load_all(&sources, &scope).await;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    for failure in &outcome.failures {
        eprintln!("⚠️  {}", failure);
    }
    if outcome.reports.is_empty() {
        warn!("No analytics reports found for {}", scope);
    }

    // Step 2: Aggregate
    let aggregator = Aggregator::new(
        config.columns.clone(),
        config.dashboard.revenue_per_conversion,
    );
    let options = DashboardOptions {
        scope: scope.clone(),
        top_limit: config.dashboard.top_limit,
        platforms: config.dashboard.platforms.clone(),
        comparison: config.dashboard.comparison(),
    };
    let all_failed = outcome.all_failed();
    let dashboard = build_dashboard(&aggregator, &outcome.reports, &options, outcome.failures);

    // Step 3: Render and save
    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&dashboard)?,
        OutputFormat::Markdown => report::generate_markdown_report(&dashboard),
    };

    let output_path = PathBuf::from(
        config
            .general
            .output
            .clone()
            .unwrap_or_else(|| args.format.default_output().to_string()),
    );
    std::fs::write(&output_path, &output)
        .with_context(|| format!("Failed to write dashboard to {}", output_path.display()))?;

    if !args.quiet {
        let totals = &dashboard.totals;
        println!("\n📊 Dashboard Summary:");
        println!("   Reports: {}", dashboard.metadata.report_count);
        println!(
            "   Reach: {} | Engagement: {} | Conversions: {} | Revenue: ${:.2}",
            totals.total_reach, totals.engagement, totals.conversions, totals.revenue
        );
        for (platform, channel) in &dashboard.channels {
            println!(
                "   - {}: {} reach, {} engagement, {} posts",
                platform.label(),
                channel.reach,
                channel.engagement,
                channel.posts
            );
        }
        println!("   Duration: {:.1}s", start_time.elapsed().as_secs_f64());
        println!("\n✅ Dashboard saved to: {}", output_path.display());
    }

    if all_failed {
        eprintln!("\n⛔ Every report source failed to load (exit code 2).");
        return Ok(2);
    }

    Ok(0)
}

/// Build the configured report sources.
fn build_sources(config: &Config) -> Result<Vec<ReportSource>> {
    let scan_config = ScanConfig::from(&config.scanner);

    let mut sources: Vec<ReportSource> = config
        .source
        .directories
        .iter()
        .map(|dir| ReportSource::Local(LocalSource::new(PathBuf::from(dir), scan_config.clone())))
        .collect();

    if let Some(ref url) = config.source.backend_url {
        let api_key = config.source.api_key.clone().unwrap_or_else(|| {
            warn!("No backend API key configured; requests will likely be rejected");
            String::new()
        });
        let remote = RemoteSource::new(RemoteConfig {
            base_url: url.clone(),
            api_key,
            table: config.source.table.clone(),
            timeout_seconds: config.source.timeout_seconds,
        })
        .context("Failed to create backend client")?;
        sources.push(ReportSource::Remote(remote));
    }

    Ok(sources)
}

/// Handle --dry-run: list sources and export files, exit.
fn handle_dry_run(sources: &[ReportSource], scope: &Scope) -> Result<i32> {
    println!("\n🔍 Dry run: listing report sources (no aggregation)...\n");
    println!("   Scope: {}", scope);

    for source in sources {
        println!("\n   📂 {}", source.describe());
        match source {
            ReportSource::Local(local) => match local.scan() {
                Ok(files) if files.is_empty() => println!("     No export files found."),
                Ok(files) => {
                    for file in &files {
                        println!("     📄 {} ({} bytes)", file.relative, file.size);
                    }
                    println!("     Total: {} files", files.len());
                }
                Err(e) => println!("     ⚠️  {}", e),
            },
            ReportSource::Remote(_) => {
                if scope.user_id.is_none() || scope.workspace_id.is_none() {
                    println!("     ⚠️  Needs --user and --workspace");
                } else {
                    println!("     Would query reports for {}", scope);
                }
            }
        }
    }

    println!("\n✅ Dry run complete. Nothing was aggregated.");
    Ok(0)
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
