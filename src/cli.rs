//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::analysis::{normalize, Period, RawTimestamp};
use crate::dashboard::Chart;
use chrono::NaiveDateTime;
use clap::Parser;
use std::path::PathBuf;

/// Portal Analytics - dashboard metrics for insurance portal records
///
/// Reads a JSON snapshot of claims, payments, policies and customers,
/// aggregates it over an analysis period and writes a Markdown or JSON
/// dashboard report.
///
/// Examples:
///   portal-analytics --input snapshot.json
///   portal-analytics --input snapshot.json --period 1y --format json -o kpis.json
///   portal-analytics --input snapshot.json --now 2024-03-01 --charts claims,customers
///   portal-analytics --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// JSON snapshot of portal records
    #[arg(short, long, value_name = "FILE", required_unless_present = "init_config")]
    pub input: Option<PathBuf>,

    /// Analysis period (7d, 30d, 90d, 1y, all)
    ///
    /// Can also be set via PORTAL_ANALYTICS_PERIOD or the config file.
    #[arg(short, long, value_name = "PERIOD", env = "PORTAL_ANALYTICS_PERIOD")]
    pub period: Option<Period>,

    /// Reference instant for period resolution (ISO-8601)
    ///
    /// Defaults to the current UTC time. Pin it for reproducible reports.
    #[arg(long, value_name = "DATETIME")]
    pub now: Option<String>,

    /// Output file path for the report (`-` for stdout)
    ///
    /// Defaults to dashboard_report.md, or dashboard_report.json with --format json
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Path to configuration file
    ///
    /// If not specified, looks for .portal-analytics.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Charts to compute (comma-separated)
    ///
    /// Example: --charts revenue,claims
    #[arg(long, value_name = "CHARTS", value_delimiter = ',')]
    pub charts: Option<Vec<Chart>>,

    /// Categories shown per distribution before folding into "Other"
    #[arg(long, value_name = "COUNT")]
    pub max_categories: Option<usize>,

    /// Leave month-by-month tables out of the Markdown report
    #[arg(long)]
    pub no_series: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .portal-analytics.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl OutputFormat {
    /// File extension for reports in this format.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Json => "json",
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The pinned reference instant, if `--now` was given and parses.
    pub fn reference_now(&self) -> Option<NaiveDateTime> {
        self.now
            .as_deref()
            .and_then(|text| normalize(&RawTimestamp::from(text)))
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref now) = self.now {
            if self.reference_now().is_none() {
                return Err(format!("--now is not a valid date or date-time: {}", now));
            }
        }

        if self.max_categories == Some(0) {
            return Err("Max categories must be at least 1".to_string());
        }

        if let Some(ref charts) = self.charts {
            if charts.is_empty() {
                return Err("At least one chart must be selected".to_string());
            }
        }

        match self.input {
            Some(ref input) if !input.is_file() => {
                Err(format!("Input file does not exist: {}", input.display()))
            }
            Some(_) => Ok(()),
            None => Err("--input is required".to_string()),
        }
    }
}
