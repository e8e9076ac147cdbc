//! Trend smoothing with locally weighted regression (LOWESS).
//!
//! Each subject's daily step counts are smoothed against date with the
//! `lowess` crate's batch smoother: tricube distance weights over the nearest
//! `frac * n` points, bisquare robustness passes, and the local mean when
//! every weight in a neighbourhood vanishes.
//!
//! ## Invariants
//!
//! * Output has one `(x, estimate)` pair per input point, sorted by x.
//! * Points with identical x share one estimate.
//! * Identical input produces identical output.

use crate::error::AnalysisError;
use crate::models::{TrendCurve, TrendPoint, WalkingRecord};
use chrono::{NaiveDate, NaiveTime};
use ::lowess::prelude::*;
use tracing::debug;

/// Neighbourhood fraction used for the step trend lines.
pub const DEFAULT_FRAC: f64 = 0.12;

/// Number of robustness passes after the initial fit.
pub const DEFAULT_ITERATIONS: usize = 3;

/// Smoother parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LowessParams {
    /// Fraction of points in each local neighbourhood, in (0, 1].
    pub frac: f64,
    /// Robustness iterations after the initial fit.
    pub iterations: usize,
}

impl Default for LowessParams {
    fn default() -> Self {
        Self {
            frac: DEFAULT_FRAC,
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

impl From<&crate::config::SmoothingConfig> for LowessParams {
    fn from(config: &crate::config::SmoothingConfig) -> Self {
        Self {
            frac: config.frac,
            iterations: config.iterations,
        }
    }
}

fn validate(x: &[f64], y: &[f64], params: &LowessParams) -> Result<(), AnalysisError> {
    if x.len() != y.len() {
        return Err(AnalysisError::InvalidSmoothing(format!(
            "x has {} values but y has {}",
            x.len(),
            y.len()
        )));
    }
    if x.is_empty() {
        return Err(AnalysisError::InvalidSmoothing("no points to smooth".to_string()));
    }
    if !(params.frac > 0.0 && params.frac <= 1.0) {
        return Err(AnalysisError::InvalidSmoothing(format!(
            "fraction {} is outside (0, 1]",
            params.frac
        )));
    }
    if x.iter().chain(y).any(|v| !v.is_finite()) {
        return Err(AnalysisError::InvalidSmoothing(
            "input contains non-finite values".to_string(),
        ));
    }
    Ok(())
}

/// Locally weighted regression of `y` on `x`.
///
/// Returns one `(x, estimate)` pair per input point, sorted by x. Points with
/// equal x keep their input order.
pub fn lowess(x: &[f64], y: &[f64], params: &LowessParams) -> Result<Vec<(f64, f64)>, AnalysisError> {
    validate(x, y, params)?;

    let mut order: Vec<usize> = (0..x.len()).collect();
    order.sort_by(|&a, &b| x[a].total_cmp(&x[b]));
    let xs: Vec<f64> = order.iter().map(|&i| x[i]).collect();
    let ys: Vec<f64> = order.iter().map(|&i| y[i]).collect();

    // A single observation is its own local fit.
    if xs.len() == 1 {
        return Ok(vec![(xs[0], ys[0])]);
    }

    let model = Lowess::new()
        .fraction(params.frac)
        .iterations(params.iterations)
        .delta(0.0)
        .build()
        .map_err(|e| AnalysisError::InvalidSmoothing(e.to_string()))?;

    let result = model
        .fit(&xs, &ys)
        .map_err(|e| AnalysisError::InvalidSmoothing(e.to_string()))?;

    debug!(
        "Smoothed {} points with frac {} ({} robustness pass(es))",
        xs.len(),
        params.frac,
        result.iterations_used.unwrap_or(params.iterations)
    );

    Ok(result.x.into_iter().zip(result.y).collect())
}

/// Unix seconds at UTC midnight of `date`.
pub fn date_to_x(date: NaiveDate) -> f64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp() as f64
}

/// Smooth one subject's steps against date.
pub fn smooth_subject_steps(
    subject: &str,
    rows: &[&WalkingRecord],
    params: &LowessParams,
) -> Result<TrendCurve, AnalysisError> {
    let mut sorted: Vec<&WalkingRecord> = rows.to_vec();
    sorted.sort_by_key(|r| r.date);

    let x: Vec<f64> = sorted.iter().map(|r| date_to_x(r.date)).collect();
    let y: Vec<f64> = sorted.iter().map(|r| r.steps as f64).collect();

    let fitted = lowess(&x, &y, params)?;

    let points = sorted
        .iter()
        .zip(fitted)
        .map(|(row, (x, fitted))| TrendPoint {
            date: row.date,
            x,
            fitted,
        })
        .collect();

    Ok(TrendCurve {
        subject: subject.to_string(),
        points,
    })
}
