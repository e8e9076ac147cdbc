//! Data models for the walking analysis.
//!
//! This module contains the core data structures used throughout the
//! application for representing loaded records, aggregated tables, trend
//! curves, significance results and the final report.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Significance threshold applied to ANOVA p-values.
pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

/// One row of the source table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkingRecord {
    /// Subject identity.
    pub subject: String,
    /// Day the metrics were recorded.
    pub date: NaiveDate,
    /// Age bracket code.
    pub age: u32,
    /// Step count for the day.
    pub steps: u64,
    pub min_walking_speed_kph: f64,
    pub max_walking_speed_kph: f64,
    pub min_step_length_cm: f64,
    pub max_step_length_cm: f64,
    /// Gait asymmetry, percentage-like magnitude.
    pub walking_asymmetry: f64,
    /// Midpoint of min/max walking speed. `NaN` until derived.
    pub avg_walking_speed: f64,
}

/// The loaded table, rows in file order.
#[derive(Debug, Clone, Default)]
pub struct WalkingTable {
    pub records: Vec<WalkingRecord>,
    /// Whether `avg_walking_speed` has been computed for every row.
    pub speed_derived: bool,
}

impl WalkingTable {
    /// Wraps loaded records; the derived column is not yet present.
    pub fn new(records: Vec<WalkingRecord>) -> Self {
        Self {
            records,
            speed_derived: false,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct subjects in first-seen order.
    pub fn subjects(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for record in &self.records {
            if !seen.contains(&record.subject) {
                seen.push(record.subject.clone());
            }
        }
        seen
    }

    /// Distinct age brackets in first-seen order.
    pub fn ages(&self) -> Vec<u32> {
        let mut seen = Vec::new();
        for record in &self.records {
            if !seen.contains(&record.age) {
                seen.push(record.age);
            }
        }
        seen
    }
}

/// Subject x date matrix of summed step counts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepMatrix {
    /// Row labels, sorted.
    pub subjects: Vec<String>,
    /// Column labels, sorted.
    pub dates: Vec<NaiveDate>,
    /// `cells[row][col]`; `None` when the subject has no record that day.
    pub cells: Vec<Vec<Option<u64>>>,
}

#[cfg(test)]
impl StepMatrix {
    /// Returns the cell for a subject and date, if the subject is known.
    pub fn get(&self, subject: &str, date: NaiveDate) -> Option<Option<u64>> {
        let row = self.subjects.iter().position(|s| s == subject)?;
        let col = self.dates.iter().position(|d| *d == date)?;
        Some(self.cells[row][col])
    }

    /// Sum of the present cells in a subject's row.
    pub fn row_total(&self, subject: &str) -> Option<u64> {
        let row = self.subjects.iter().position(|s| s == subject)?;
        Some(self.cells[row].iter().flatten().sum())
    }
}

/// Mean daily steps for one age bracket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeStepMean {
    pub age: u32,
    pub mean_steps: f64,
}

/// Wide table: one row per metric, one column per subject.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummaryTable {
    /// Column labels (subjects) in first-seen order.
    pub columns: Vec<String>,
    /// Metric rows, each with one value per column.
    pub rows: Vec<SummaryRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryRow {
    pub metric: String,
    pub values: Vec<f64>,
}

#[cfg(test)]
impl SummaryTable {
    /// Looks up one cell by metric name and subject.
    pub fn value(&self, metric: &str, subject: &str) -> Option<f64> {
        let col = self.columns.iter().position(|c| c == subject)?;
        self.rows
            .iter()
            .find(|r| r.metric == metric)
            .map(|r| r.values[col])
    }
}

/// The three per-subject summary tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubjectSummaries {
    pub mean: SummaryTable,
    pub min: SummaryTable,
    pub max: SummaryTable,
}

/// One smoothed point of a subject's step trend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    /// Numeric x used for the fit (Unix seconds at UTC midnight).
    pub x: f64,
    pub fitted: f64,
}

/// Smoothed step series for one subject, sorted by date.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrendCurve {
    pub subject: String,
    pub points: Vec<TrendPoint>,
}

/// Raw per-subject series drawn in the charts, rows in file order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubjectSeries {
    pub subject: String,
    pub dates: Vec<NaiveDate>,
    pub steps: Vec<u64>,
    pub avg_walking_speed: Vec<f64>,
    pub walking_asymmetry: Vec<f64>,
}

/// Outcome of a one-way analysis of variance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AnovaResult {
    pub f_statistic: f64,
    pub p_value: f64,
    pub df_between: f64,
    pub df_within: f64,
}

impl AnovaResult {
    /// False when variance conditions degenerate and no p-value exists.
    pub fn is_defined(&self) -> bool {
        !self.p_value.is_nan()
    }

    /// Classifies the p-value against [`SIGNIFICANCE_LEVEL`].
    pub fn relation(&self) -> Relation {
        if !self.is_defined() {
            Relation::Undefined
        } else if self.p_value < SIGNIFICANCE_LEVEL {
            Relation::Related
        } else {
            Relation::NotRelated
        }
    }
}

/// Interpretation of a significance test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    Related,
    NotRelated,
    Undefined,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Relation::Related => write!(f, "related"),
            Relation::NotRelated => write!(f, "not related"),
            Relation::Undefined => write!(f, "undefined"),
        }
    }
}

/// Both age tests as the report prints them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AgeRelationTests {
    /// Age codes vs step counts, classified.
    pub steps: AnovaResult,
    /// Age codes vs average walking speed, reported unclassified.
    pub speed: AnovaResult,
}

/// Metadata about one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub input: String,
    pub rows: usize,
    pub subjects: usize,
    pub ages: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub smoothing_frac: f64,
    /// Subjects recorded under more than one age bracket.
    pub age_crossings: Vec<String>,
}

/// Everything the pipeline produces, ready for rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub metadata: ReportMetadata,
    pub step_matrix: StepMatrix,
    pub age_step_means: Vec<AgeStepMean>,
    pub summaries: SubjectSummaries,
    pub trends: Vec<TrendCurve>,
    pub series: Vec<SubjectSeries>,
    pub anova: AgeRelationTests,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::record;

    #[test]
    fn test_first_seen_subjects_and_ages() {
        let table = WalkingTable::new(vec![
            record("b", "2021-03-01", 40, 100),
            record("a", "2021-03-01", 20, 200),
            record("b", "2021-03-02", 40, 300),
            record("c", "2021-03-01", 60, 400),
        ]);

        assert_eq!(table.subjects(), vec!["b", "a", "c"]);
        assert_eq!(table.ages(), vec![40, 20, 60]);
        assert!(!table.speed_derived);
    }

    #[test]
    fn test_relation_classification() {
        let mut result = AnovaResult {
            f_statistic: 18.0,
            p_value: 0.01,
            df_between: 1.0,
            df_within: 4.0,
        };
        assert_eq!(result.relation(), Relation::Related);

        result.p_value = 0.05;
        assert_eq!(result.relation(), Relation::NotRelated);

        result.p_value = f64::NAN;
        assert!(!result.is_defined());
        assert_eq!(result.relation(), Relation::Undefined);
    }

    #[test]
    fn test_step_matrix_lookup() {
        let d1 = NaiveDate::from_ymd_opt(2021, 3, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2021, 3, 2).unwrap();
        let matrix = StepMatrix {
            subjects: vec!["a".to_string()],
            dates: vec![d1, d2],
            cells: vec![vec![Some(10), None]],
        };

        assert_eq!(matrix.get("a", d1), Some(Some(10)));
        assert_eq!(matrix.get("a", d2), Some(None));
        assert_eq!(matrix.get("z", d1), None);
        assert_eq!(matrix.row_total("a"), Some(10));
    }
}
