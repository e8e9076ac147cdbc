//! Per-subject descriptive statistics.
//!
//! Builds the mean, minimum and maximum tables with one column per subject
//! in first-seen order. Missing (`NaN`) measurements are skipped.

use crate::analysis::slicer::Partition;
use crate::error::AnalysisError;
use crate::models::{SubjectSummaries, SummaryRow, SummaryTable, WalkingRecord};

/// A named numeric column of the walking table.
type Column = (&'static str, fn(&WalkingRecord) -> f64);

/// Every numeric column except date, in table order.
pub const MEAN_COLUMNS: [Column; 8] = [
    ("age", |r| r.age as f64),
    ("steps", |r| r.steps as f64),
    ("min_walking_speed_kph", |r| r.min_walking_speed_kph),
    ("max_walking_speed_kph", |r| r.max_walking_speed_kph),
    ("min_step_length_cm", |r| r.min_step_length_cm),
    ("max_step_length_cm", |r| r.max_step_length_cm),
    ("walking_asymmetry", |r| r.walking_asymmetry),
    ("avg_walking_speed", |r| r.avg_walking_speed),
];

pub const MIN_COLUMNS: [Column; 2] = [
    ("min_step_length_cm", |r| r.min_step_length_cm),
    ("min_walking_speed_kph", |r| r.min_walking_speed_kph),
];

pub const MAX_COLUMNS: [Column; 2] = [
    ("max_step_length_cm", |r| r.max_step_length_cm),
    ("max_walking_speed_kph", |r| r.max_walking_speed_kph),
];

/// Mean of the present values, `NaN` if none are present.
fn nan_mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

fn nan_min(values: impl Iterator<Item = f64>) -> f64 {
    values.filter(|v| !v.is_nan()).fold(f64::NAN, f64::min)
}

fn nan_max(values: impl Iterator<Item = f64>) -> f64 {
    values.filter(|v| !v.is_nan()).fold(f64::NAN, f64::max)
}

/// Build one wide table by reducing each column of each subject.
fn build_table(
    partition: &Partition<'_, String>,
    columns: &[Column],
    reduce: fn(&mut dyn Iterator<Item = f64>) -> f64,
) -> Result<SummaryTable, AnalysisError> {
    let subjects: Vec<String> = partition.keys().cloned().collect();
    let mut rows: Vec<SummaryRow> = columns
        .iter()
        .map(|(name, _)| SummaryRow {
            metric: name.to_string(),
            values: Vec::with_capacity(subjects.len()),
        })
        .collect();

    for (subject, records) in partition.iter() {
        if records.is_empty() {
            return Err(AnalysisError::EmptyGroup(subject.clone()));
        }
        for (row, (_, extract)) in rows.iter_mut().zip(columns) {
            let mut values = records.iter().map(|r| extract(r));
            row.values.push(reduce(&mut values));
        }
    }

    Ok(SummaryTable {
        columns: subjects,
        rows,
    })
}

/// Compute the mean, min and max tables for every subject.
pub fn summarize_subjects(
    partition: &Partition<'_, String>,
) -> Result<SubjectSummaries, AnalysisError> {
    Ok(SubjectSummaries {
        mean: build_table(partition, &MEAN_COLUMNS, |v| nan_mean(v))?,
        min: build_table(partition, &MIN_COLUMNS, |v| nan_min(v))?,
        max: build_table(partition, &MAX_COLUMNS, |v| nan_max(v))?,
    })
}
