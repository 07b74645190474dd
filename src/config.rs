//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.portal-analytics.toml` files.

use crate::analysis::Period;
use crate::cli::OutputFormat;
use crate::dashboard::{Chart, DashboardOptions};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".portal-analytics.toml";

/// Report file stem used when no output path is configured.
pub const DEFAULT_REPORT_STEM: &str = "dashboard_report";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Dashboard settings.
    #[serde(default)]
    pub dashboard: DashboardConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Output file path (`-` for stdout). When unset the report goes to
    /// `dashboard_report.<ext>` with the extension of the chosen format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Enable debug logging.
    #[serde(default)]
    pub verbose: bool,
}

/// Which period and charts to compute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Analysis period token.
    #[serde(default)]
    pub period: Period,

    /// Charts to include.
    #[serde(default = "default_charts")]
    pub charts: Vec<Chart>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            period: Period::default(),
            charts: default_charts(),
        }
    }
}

fn default_charts() -> Vec<Chart> {
    Chart::ALL.to_vec()
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Include month-by-month tables.
    #[serde(default = "default_true")]
    pub include_series: bool,

    /// Categories shown per distribution before folding into "Other".
    #[serde(default = "default_max_categories")]
    pub max_categories: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            include_series: true,
            max_categories: default_max_categories(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_categories() -> usize {
    10
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load configuration from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were explicitly provided.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(period) = args.period {
            self.dashboard.period = period;
        }

        if let Some(ref charts) = args.charts {
            self.dashboard.charts = charts.clone();
        }

        if let Some(ref output) = args.output {
            self.general.output = Some(output.display().to_string());
        }

        if let Some(max) = args.max_categories {
            self.report.max_categories = max;
        }

        if args.no_series {
            self.report.include_series = false;
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Where the report is written for the given format.
    pub fn output_path(&self, format: OutputFormat) -> PathBuf {
        match self.general.output {
            Some(ref output) => PathBuf::from(output),
            None => PathBuf::from(format!("{}.{}", DEFAULT_REPORT_STEM, format.extension())),
        }
    }

    /// Log level from the merged verbosity settings. `quiet` wins.
    pub fn log_level(&self, quiet: bool) -> tracing::Level {
        if quiet {
            tracing::Level::ERROR
        } else if self.general.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Dashboard options derived from the `[dashboard]` section.
    pub fn dashboard_options(&self) -> DashboardOptions {
        DashboardOptions {
            charts: self.dashboard.charts.clone(),
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.output, None);
        assert!(!config.general.verbose);
        assert_eq!(config.dashboard.period, Period::Last30Days);
        assert_eq!(config.dashboard.charts.len(), 5);
        assert_eq!(config.report.max_categories, 10);
        assert!(config.report.include_series);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output = "kpis.json"
verbose = true

[dashboard]
period = "1y"
charts = ["claims", "customers"]

[report]
max_categories = 4
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output.as_deref(), Some("kpis.json"));
        assert!(config.general.verbose);
        assert_eq!(config.dashboard.period, Period::LastYear);
        assert_eq!(
            config.dashboard.charts,
            vec![Chart::Claims, Chart::Customers]
        );
        assert_eq!(config.report.max_categories, 4);
        assert!(config.report.include_series);

        let options = config.dashboard_options();
        assert!(options.includes(Chart::Claims));
        assert!(!options.includes(Chart::Revenue));
    }

    #[test]
    fn test_invalid_period_rejected() {
        let result: std::result::Result<Config, _> =
            toml::from_str("[dashboard]\nperiod = \"2w\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[dashboard]"));
        assert!(toml_str.contains("[report]"));
        assert!(toml_str.contains("period = \"30d\""));

        // Round-trips through the parser.
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.dashboard.period, Period::Last30Days);
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from_dir(dir.path()).unwrap().is_none());

        let mut file = std::fs::File::create(dir.path().join(CONFIG_FILE_NAME)).unwrap();
        writeln!(file, "[dashboard]\nperiod = \"7d\"").unwrap();

        let config = Config::load_from_dir(dir.path()).unwrap().unwrap();
        assert_eq!(config.dashboard.period, Period::Last7Days);
    }

    #[test]
    fn test_output_path_follows_format() {
        let config = Config::default();
        assert_eq!(
            config.output_path(OutputFormat::Markdown),
            PathBuf::from("dashboard_report.md")
        );
        assert_eq!(
            config.output_path(OutputFormat::Json),
            PathBuf::from("dashboard_report.json")
        );

        let explicit: Config = toml::from_str("[general]\noutput = \"kpis.md\"\n").unwrap();
        assert_eq!(
            explicit.output_path(OutputFormat::Json),
            PathBuf::from("kpis.md")
        );
    }

    #[test]
    fn test_verbose_from_file_sets_log_level() {
        let mut config: Config = toml::from_str("[general]\nverbose = true\n").unwrap();
        assert_eq!(config.log_level(false), tracing::Level::DEBUG);
        assert_eq!(config.log_level(true), tracing::Level::ERROR);

        config.general.verbose = false;
        assert_eq!(config.log_level(false), tracing::Level::INFO);
    }
}
