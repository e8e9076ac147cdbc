//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// walkstats - descriptive statistics and charts for daily walking metrics
///
/// Reads a month of per-subject walking data, prints the step matrix,
/// per-subject summaries and age significance tests, and writes two
/// PNG figures.
///
/// Examples:
///   walkstats walking.csv
///   walkstats walking.csv --format json --no-charts
///   walkstats walking.csv --output-dir charts --expect-subjects 7 --expect-ages 3
///   walkstats --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Delimited walking-metrics file to analyze
    ///
    /// Must carry a header row with subject, date, age, steps and the five
    /// speed / step length / asymmetry columns.
    #[arg(value_name = "INPUT", required_unless_present = "init_config")]
    pub input: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .walkstats.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format of the stdout report (text, json)
    #[arg(short, long, value_name = "FORMAT", env = "WALKSTATS_FORMAT")]
    pub format: Option<OutputFormat>,

    /// Directory the chart images are written to
    ///
    /// Defaults to the current directory.
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Skip writing the chart images
    #[arg(long)]
    pub no_charts: bool,

    /// Fail unless the input has exactly this many subjects
    #[arg(long, value_name = "N")]
    pub expect_subjects: Option<usize>,

    /// Fail unless the input has exactly this many age brackets
    #[arg(long, value_name = "N")]
    pub expect_ages: Option<usize>,

    /// LOWESS smoothing fraction (0.0 - 1.0]
    ///
    /// Share of each subject's points used in every local fit.
    #[arg(long, value_name = "FRAC")]
    pub frac: Option<f64>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .walkstats.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Plain text tables (default)
    #[default]
    Text,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if let Some(ref input) = self.input {
            if !input.exists() {
                return Err(format!("Input file does not exist: {}", input.display()));
            }
            if !input.is_file() {
                return Err(format!("Input path is not a file: {}", input.display()));
            }
        }

        if let Some(frac) = self.frac {
            if !(frac > 0.0 && frac <= 1.0) {
                return Err("Smoothing fraction must be in (0.0, 1.0]".to_string());
            }
        }

        if self.expect_subjects == Some(0) || self.expect_ages == Some(0) {
            return Err("Expected counts must be at least 1".to_string());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref dir) = self.output_dir {
            if dir.exists() && !dir.is_dir() {
                return Err(format!(
                    "Output path is not a directory: {}",
                    dir.display()
                ));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
impl Args {
    /// Arguments as if only `INPUT` was given.
    pub fn for_input(input: &str) -> Self {
        Self {
            input: Some(PathBuf::from(input)),
            config: None,
            format: None,
            output_dir: None,
            no_charts: false,
            expect_subjects: None,
            expect_ages: None,
            frac: None,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }
}
