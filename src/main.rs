//! walkstats - Walking Metrics Analyzer
//!
//! A CLI tool that reads a month of per-subject daily walking metrics,
//! prints step, mean, minimum and maximum tables plus two age significance
//! tests, and writes two PNG figures.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Any error (bad arguments, unreadable or malformed input, config, charts)

mod analysis;
mod cli;
mod config;
mod error;
mod loader;
mod models;
mod pipeline;
mod report;

#[cfg(test)]
mod test_support;

use anyhow::{Context, Result};
use cli::{Args, OutputFormat};
use config::{Config, DEFAULT_CONFIG_FILE};
use pipeline::PipelineOptions;
use std::path::Path;
use tracing::level_filters::LevelFilter;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> Result<()> {
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

    // Configuration is read before logging so the file's verbose flag applies
    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = init_logging(&args, &config) {
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    info!("walkstats v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    debug!("Configuration: {:?}", config);

    if let Err(e) = run_analysis(&args, &config) {
        error!("Analysis failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .walkstats.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Edit it to customize smoothing, expected counts, chart size, and more.");
    Ok(())
}

/// Initialize logging on stderr; stdout carries only the report.
///
/// `RUST_LOG` takes precedence over the verbosity flags when set.
fn init_logging(args: &Args, config: &Config) -> Result<()> {
    let level = if config.general.verbose && !args.quiet {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Run the complete analysis: compute, draw, then print.
fn run_analysis(args: &Args, config: &Config) -> Result<()> {
    let input = args
        .input
        .as_deref()
        .context("No input file given")?;

    let options = PipelineOptions::from(config);
    let report = pipeline::run(input, &options)?;

    let output = match config.general.format {
        OutputFormat::Json => report::render_json(&report)?,
        OutputFormat::Text => report::render_text(&report),
    };

    if config.charts.enabled {
        let written = report::write_charts(&report, &config.charts, &config.general.output_dir)?;
        debug!("Wrote {} chart(s)", written.len());
    } else {
        info!("Chart rendering disabled");
    }

    print!("{}", output);
    if !output.ends_with('\n') {
        println!();
    }

    Ok(())
}

/// Load configuration from file or use defaults, then apply CLI overrides.
fn load_config(args: &Args) -> Result<Config> {
    let mut config = if let Some(ref config_path) = args.config {
        Config::load(config_path)?
    } else {
        Config::load_default()?.unwrap_or_default()
    };

    config.merge_with_args(args);
    config.validate()?;
    Ok(config)
}
