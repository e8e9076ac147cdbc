//! Error types for loading and analysis.
//!
//! Input problems are reported as [`LoadError`], problems found while
//! computing statistics as [`AnalysisError`]. Both convert into
//! `anyhow::Error` at the orchestration layer.

use std::path::PathBuf;
use thiserror::Error;

/// Failures while reading the walking table from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The input file could not be opened or read.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The delimited file is malformed (wrong field count, bad number, ...).
    #[error("Malformed input: {0}")]
    Csv(#[from] csv::Error),

    /// One or more required header columns are absent.
    #[error("Missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// A date cell did not match `YYYY-MM-DD`.
    #[error("Invalid date '{value}' on line {line} (expected YYYY-MM-DD)")]
    InvalidDate { line: u64, value: String },

    /// The file has a header but no data rows.
    #[error("Input contains no data rows")]
    Empty,
}

/// Failures while aggregating, smoothing or testing the loaded table.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// A group that must contain rows has none.
    #[error("Group '{0}' has no rows; its mean is undefined")]
    EmptyGroup(String),

    /// The number of distinct keys differs from the configured expectation.
    #[error("Expected {expected} distinct {key} value(s), found {found}")]
    CardinalityMismatch {
        key: &'static str,
        expected: usize,
        found: usize,
    },

    /// Smoother input or parameters are unusable.
    #[error("Invalid smoothing input: {0}")]
    InvalidSmoothing(String),

    /// ANOVA input is unusable.
    #[error("Invalid ANOVA input: {0}")]
    InvalidAnova(String),
}
