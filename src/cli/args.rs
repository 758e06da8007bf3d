//! Command-line argument definitions for the KPI engine
//!
//! Uses the clap derive API. Flags given here override values from the
//! optional TOML configuration file.

use crate::config::{PipelineConfig, parse_utc_offset};
use crate::constants::DEFAULT_OUTPUT_DIR;
use crate::{Error, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the order KPI engine
///
/// Cleans customer and order line-item files, derives one header per order,
/// and computes a verified KPI snapshot.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "order-kpi",
    version,
    about = "Compute verified order and customer KPIs from raw CSV sources",
    long_about = "Normalizes and validates customer and order line-item records, collapses \
                  repeated order-level fields into one header per order, and computes a KPI \
                  snapshot that is cross-checked between a polars engine and a SQLite engine."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Run the pipeline over a customer file and an order file
    Run(RunArgs),
    /// Validate a configuration file and print the effective settings
    CheckConfig(CheckConfigArgs),
}

/// Arguments for the run command
#[derive(Debug, Clone, Parser)]
pub struct RunArgs {
    /// Customer CSV file
    #[arg(
        short = 'c',
        long = "customers",
        value_name = "FILE",
        help = "Customer CSV file"
    )]
    pub customers: PathBuf,

    /// Order line-item CSV file, one row per SKU per order
    #[arg(
        short = 'r',
        long = "orders",
        value_name = "FILE",
        help = "Order line-item CSV file"
    )]
    pub orders: PathBuf,

    /// TOML configuration file
    #[arg(long = "config", value_name = "FILE", help = "TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Directory receiving the append-only run history
    #[arg(
        short = 'o',
        long = "output",
        value_name = "DIR",
        default_value = DEFAULT_OUTPUT_DIR,
        help = "Directory for run history files"
    )]
    pub output: PathBuf,

    /// UTC offset for naive timestamps and month buckets, e.g. +05:30
    #[arg(
        long = "utc-offset",
        value_name = "OFFSET",
        allow_hyphen_values = true,
        help = "UTC offset such as +05:30, -0800 or Z"
    )]
    pub utc_offset: Option<String>,

    /// Size of top-N rankings
    #[arg(long = "top-n", value_name = "N", help = "Number of entries in rankings")]
    pub top_n: Option<usize>,

    /// Skip the relational cross-check
    #[arg(long = "no-verify", help = "Compute with one engine only")]
    pub no_verify: bool,

    /// Do not write run history
    #[arg(long = "dry-run", help = "Compute and report without writing history")]
    pub dry_run: bool,

    /// Output format for the final report
    #[arg(
        long = "format",
        value_enum,
        default_value = "human",
        help = "Report format"
    )]
    pub format: OutputFormat,

    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    #[arg(
        short = 'q',
        long = "quiet",
        help = "Suppress output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,
}

/// Arguments for the check-config command
#[derive(Debug, Clone, Parser)]
pub struct CheckConfigArgs {
    /// TOML configuration file to validate
    #[arg(value_name = "FILE")]
    pub path: PathBuf,
}

/// Report formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Coloured summary for terminals
    Human,
    /// The nested snapshot as JSON
    Json,
}

impl RunArgs {
    /// Check that both input files exist
    pub fn validate(&self) -> Result<()> {
        for (label, path) in [("Customer", &self.customers), ("Order", &self.orders)] {
            if !path.exists() {
                return Err(Error::configuration(format!(
                    "{} file does not exist: {}",
                    label,
                    path.display()
                )));
            }
        }
        if let Some(config) = &self.config {
            if !config.exists() {
                return Err(Error::configuration(format!(
                    "Configuration file does not exist: {}",
                    config.display()
                )));
            }
        }
        Ok(())
    }

    /// Defaults, then the config file, then flags
    pub fn to_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_file(path)?,
            None => PipelineConfig::default(),
        };

        if let Some(offset) = &self.utc_offset {
            config = config.with_utc_offset_minutes(parse_utc_offset(offset)?);
        }
        if let Some(top_n) = self.top_n {
            config = config.with_top_n(top_n);
        }
        if self.no_verify {
            config = config.without_verification();
        }
        if self.show_progress() {
            config = config.with_progress();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Progress bars only for human output outside quiet mode
    pub fn show_progress(&self) -> bool {
        !self.quiet && self.format == OutputFormat::Human
    }
}
