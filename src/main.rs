//! Portal Analytics - dashboard metrics for insurance portal records
//!
//! A CLI tool that aggregates a JSON snapshot of portal records over an
//! analysis period and writes a Markdown or JSON dashboard report.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (bad arguments, unreadable snapshot or config, write failure)

use anyhow::{Context, Result};
use chrono::Utc;
use portal_analytics::cli::{Args, OutputFormat};
use portal_analytics::config::{Config, CONFIG_FILE_NAME};
use portal_analytics::report::{self, Report, ReportMetadata};
use portal_analytics::{load_snapshot, recompute};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        if let Err(e) = handle_init_config() {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
        return;
    }

    // Config is read before logging starts; its source is logged afterwards.
    let (mut config, source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(config.log_level(args.quiet));

    info!("Portal Analytics v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    source.log();

    if let Err(e) = run(&args, &config) {
        error!("Dashboard generation failed: {:#}", e);
        eprintln!("\nError: {:#}", e);
        std::process::exit(1);
    }
}

/// Handle --init-config: generate a default .portal-analytics.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        anyhow::bail!(
            "{} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to change the period, charts and report layout.");
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Load the snapshot, recompute the dashboard and write the report.
fn run(args: &Args, config: &Config) -> Result<()> {
    let input = args.input.as_deref().context("No input snapshot given")?;

    let snapshot = load_snapshot(input)
        .with_context(|| format!("Failed to load snapshot: {}", input.display()))?;

    let now = args.reference_now().unwrap_or_else(|| Utc::now().naive_utc());
    let period = config.dashboard.period;
    info!("Computing {} dashboard as of {}", period.describe(), now);

    let dashboard = recompute(&snapshot, period, now, &config.dashboard_options());

    let report = Report {
        metadata: ReportMetadata {
            source: input.display().to_string(),
            reference_time: now,
            records: snapshot.record_count(),
        },
        dashboard,
    };

    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report, &config.report),
    };

    let output_path = config.output_path(args.format);
    report::write_output(&output, &output_path)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    if output_path != Path::new("-") && !args.quiet {
        print_summary(&report, &output_path);
    }

    Ok(())
}

fn print_summary(report: &Report, output_path: &Path) {
    let summary = &report.dashboard.summary;

    println!("\nDashboard Summary ({}):", report.dashboard.period.describe());
    println!("   Records: {}", report.metadata.records);
    println!(
        "   Revenue: {:.2} | Paid claims: {:.2} | Net: {:.2}",
        summary.total_revenue, summary.total_paid_claims, summary.net_revenue
    );
    println!(
        "   Claims: {} | Approval: {}% | Rejection: {}%",
        summary.total_claims, summary.approval_rate, summary.rejection_rate
    );
    println!(
        "   Collection: {}% | On-time: {}% | Overdue: {}",
        summary.collection_rate, summary.on_time_rate, summary.overdue_payments
    );
    println!(
        "   Customers: {} (+{} new, {:+.1}%)",
        summary.total_customers, summary.new_customers, summary.customer_growth_rate
    );
    println!("\nReport saved to: {}", output_path.display());
}

/// Where the configuration came from.
enum ConfigSource {
    Explicit(PathBuf),
    Discovered,
    Defaults,
    Unreadable(anyhow::Error),
}

impl ConfigSource {
    fn log(&self) {
        match self {
            ConfigSource::Explicit(path) => info!("Loaded config from: {}", path.display()),
            ConfigSource::Discovered => info!("Loaded default config from {}", CONFIG_FILE_NAME),
            ConfigSource::Defaults => debug!("No config file found, using defaults"),
            ConfigSource::Unreadable(e) => warn!("Failed to load config: {:#}", e),
        }
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<(Config, ConfigSource)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, ConfigSource::Explicit(config_path.clone())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, ConfigSource::Discovered)),
        Ok(None) => Ok((Config::default(), ConfigSource::Defaults)),
        Err(e) => Ok((Config::default(), ConfigSource::Unreadable(e))),
    }
}
