//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.walkstats.toml` files.

use crate::cli::OutputFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = ".walkstats.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Input file settings.
    #[serde(default)]
    pub input: InputConfig,

    /// Trend smoothing settings.
    #[serde(default)]
    pub smoothing: SmoothingConfig,

    /// Up-front shape checks on the loaded table.
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Chart output settings.
    #[serde(default)]
    pub charts: ChartsConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory the charts are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Report format on stdout.
    #[serde(default)]
    pub format: OutputFormat,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            format: OutputFormat::default(),
            verbose: false,
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Input table settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Field delimiter, a single ASCII character.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
        }
    }
}

impl InputConfig {
    /// The delimiter as the byte the CSV reader expects.
    ///
    /// Non-ASCII delimiters fall back to a comma; [`Config::validate`]
    /// rejects them before loading.
    pub fn delimiter_byte(&self) -> u8 {
        if self.delimiter.is_ascii() {
            self.delimiter as u8
        } else {
            b','
        }
    }
}

fn default_delimiter() -> char {
    ','
}

/// LOWESS settings for the per-subject step trend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmoothingConfig {
    /// Fraction of the points used in each local fit.
    #[serde(default = "default_frac")]
    pub frac: f64,

    /// Robustness passes after the initial fit.
    #[serde(default = "default_iterations")]
    pub iterations: usize,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            frac: default_frac(),
            iterations: default_iterations(),
        }
    }
}

fn default_frac() -> f64 {
    crate::analysis::trend::DEFAULT_FRAC
}

fn default_iterations() -> usize {
    crate::analysis::trend::DEFAULT_ITERATIONS
}

/// Expected table cardinalities. Unset means no check.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Number of distinct subjects the input must contain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expect_subjects: Option<usize>,

    /// Number of distinct age brackets the input must contain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expect_ages: Option<usize>,
}

/// Chart rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartsConfig {
    /// Write the two PNG figures.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Figure width in pixels.
    #[serde(default = "default_width")]
    pub width: u32,

    /// Figure height in pixels.
    #[serde(default = "default_height")]
    pub height: u32,

    /// File name of the steps / speed figure.
    #[serde(default = "default_activity_file")]
    pub activity_file: String,

    /// File name of the age / asymmetry figure.
    #[serde(default = "default_demographics_file")]
    pub demographics_file: String,
}

impl Default for ChartsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            width: default_width(),
            height: default_height(),
            activity_file: default_activity_file(),
            demographics_file: default_demographics_file(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_width() -> u32 {
    1500
}

fn default_height() -> u32 {
    800
}

fn default_activity_file() -> String {
    "sample_graph(1).png".to_string()
}

fn default_demographics_file() -> String {
    "sample_graph(2).png".to_string()
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
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(format) = args.format {
            self.general.format = format;
        }
        if let Some(ref dir) = args.output_dir {
            self.general.output_dir = dir.clone();
        }
        if let Some(frac) = args.frac {
            self.smoothing.frac = frac;
        }
        if args.expect_subjects.is_some() {
            self.validation.expect_subjects = args.expect_subjects;
        }
        if args.expect_ages.is_some() {
            self.validation.expect_ages = args.expect_ages;
        }

        // Flags always override
        if args.no_charts {
            self.charts.enabled = false;
        }
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Check values the type system can't.
    pub fn validate(&self) -> Result<()> {
        if !self.input.delimiter.is_ascii() {
            anyhow::bail!(
                "Delimiter must be a single ASCII character, got '{}'",
                self.input.delimiter
            );
        }
        if !(self.smoothing.frac > 0.0 && self.smoothing.frac <= 1.0) {
            anyhow::bail!(
                "Smoothing fraction must be in (0, 1], got {}",
                self.smoothing.frac
            );
        }
        if self.charts.enabled && (self.charts.width == 0 || self.charts.height == 0) {
            anyhow::bail!("Chart dimensions must be non-zero");
        }
        Ok(())
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
    use crate::cli::Args;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.output_dir, PathBuf::from("."));
        assert_eq!(config.general.format, OutputFormat::Text);
        assert_eq!(config.input.delimiter_byte(), b',');
        assert_eq!(config.smoothing.frac, 0.12);
        assert_eq!(config.smoothing.iterations, 3);
        assert!(config.validation.expect_subjects.is_none());
        assert!(config.charts.enabled);
        assert_eq!(config.charts.activity_file, "sample_graph(1).png");
        assert_eq!(config.charts.demographics_file, "sample_graph(2).png");
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output_dir = "out"
format = "json"
verbose = true

[input]
delimiter = ";"

[smoothing]
frac = 0.3

[validation]
expect_subjects = 7
expect_ages = 3

[charts]
width = 800
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output_dir, PathBuf::from("out"));
        assert_eq!(config.general.format, OutputFormat::Json);
        assert!(config.general.verbose);
        assert_eq!(config.input.delimiter_byte(), b';');
        assert_eq!(config.smoothing.frac, 0.3);
        assert_eq!(config.smoothing.iterations, 3);
        assert_eq!(config.validation.expect_subjects, Some(7));
        assert_eq!(config.validation.expect_ages, Some(3));
        assert_eq!(config.charts.width, 800);
        assert_eq!(config.charts.height, 800);
        assert!(config.charts.enabled);
    }

    #[test]
    fn test_merge_with_args() {
        let mut config = Config::default();
        config.validation.expect_ages = Some(3);

        let mut args = Args::for_input("walking.csv");
        args.format = Some(OutputFormat::Json);
        args.frac = Some(0.5);
        args.expect_subjects = Some(7);
        args.no_charts = true;

        config.merge_with_args(&args);

        assert_eq!(config.general.format, OutputFormat::Json);
        assert_eq!(config.smoothing.frac, 0.5);
        assert_eq!(config.validation.expect_subjects, Some(7));
        assert_eq!(config.validation.expect_ages, Some(3));
        assert!(!config.charts.enabled);
        assert_eq!(config.general.output_dir, PathBuf::from("."));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.smoothing.frac = 0.0;
        assert!(config.validate().is_err());

        config.smoothing.frac = 0.12;
        config.input.delimiter = 'é';
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[smoothing]"));
        assert!(toml_str.contains("[charts]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.smoothing.frac, 0.12);
        assert_eq!(parsed.general.format, OutputFormat::Text);
    }
}
