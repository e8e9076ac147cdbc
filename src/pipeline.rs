//! End-to-end analysis run.
//!
//! Loads the table, derives the average speed and computes every output of
//! the report before anything is printed or drawn.

use crate::analysis::{aggregator, significance, slicer, summary, trend};
use crate::config::Config;
use crate::error::{AnalysisError, LoadError};
use crate::loader::{self, LoadOptions};
use crate::models::{AnalysisReport, ReportMetadata, SubjectSeries, WalkingTable};
use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info};

/// Everything the analysis needs besides the input itself.
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    pub load: LoadOptions,
    pub smoothing: trend::LowessParams,
    pub expect_subjects: Option<usize>,
    pub expect_ages: Option<usize>,
}

impl From<&Config> for PipelineOptions {
    fn from(config: &Config) -> Self {
        Self {
            load: LoadOptions::from(&config.input),
            smoothing: trend::LowessParams::from(&config.smoothing),
            expect_subjects: config.validation.expect_subjects,
            expect_ages: config.validation.expect_ages,
        }
    }
}

/// Load `input` and analyze it.
pub fn run(input: &Path, options: &PipelineOptions) -> Result<AnalysisReport> {
    let mut table = loader::load_table(input, &options.load)
        .with_context(|| format!("Failed to load {}", input.display()))?;

    loader::derive_average_speed(&mut table);

    analyze(&table, &input.display().to_string(), options)
}

/// Compute the full report for an already loaded table.
pub fn analyze(
    table: &WalkingTable,
    input_label: &str,
    options: &PipelineOptions,
) -> Result<AnalysisReport> {
    if table.is_empty() {
        return Err(LoadError::Empty.into());
    }
    if !table.speed_derived {
        anyhow::bail!("Average walking speed must be derived before analysis");
    }

    let subjects = slicer::by_subject(table);
    let ages = slicer::by_age(table);
    check_cardinality("subject", options.expect_subjects, subjects.len())?;
    check_cardinality("age", options.expect_ages, ages.len())?;

    info!(
        "Analyzing {} rows: {} subjects, {} age brackets",
        table.len(),
        subjects.len(),
        ages.len()
    );

    let age_crossings: Vec<String> = aggregator::subject_age_brackets(table)
        .into_iter()
        .filter(|(_, ages)| ages.len() > 1)
        .map(|(subject, _)| subject)
        .collect();
    let step_matrix = aggregator::step_matrix(table);
    let age_step_means = aggregator::age_step_means(table);

    let trends = subjects
        .iter()
        .map(|(subject, rows)| trend::smooth_subject_steps(subject, rows, &options.smoothing))
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to smooth step trends")?;
    debug!("Smoothed {} step trends", trends.len());

    let summaries = summary::summarize_subjects(&subjects)?;
    let anova = significance::age_relation_tests(table)?;

    let series = subjects
        .iter()
        .map(|(subject, rows)| SubjectSeries {
            subject: subject.clone(),
            dates: rows.iter().map(|r| r.date).collect(),
            steps: rows.iter().map(|r| r.steps).collect(),
            avg_walking_speed: rows.iter().map(|r| r.avg_walking_speed).collect(),
            walking_asymmetry: rows.iter().map(|r| r.walking_asymmetry).collect(),
        })
        .collect();

    let metadata = ReportMetadata {
        input: input_label.to_string(),
        rows: table.len(),
        subjects: subjects.len(),
        ages: ages.len(),
        first_date: table.records.iter().map(|r| r.date).min(),
        last_date: table.records.iter().map(|r| r.date).max(),
        smoothing_frac: options.smoothing.frac,
        age_crossings,
    };

    Ok(AnalysisReport {
        metadata,
        step_matrix,
        age_step_means,
        summaries,
        trends,
        series,
        anova,
    })
}

fn check_cardinality(
    key: &'static str,
    expected: Option<usize>,
    found: usize,
) -> Result<(), AnalysisError> {
    match expected {
        Some(expected) if expected != found => Err(AnalysisError::CardinalityMismatch {
            key,
            expected,
            found,
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::render_text;
    use crate::test_support::{
        assert_close, fixture_path, missing_speed_fixture_path, record, sample_table,
    };
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_run_on_fixture() {
        let report = run(&fixture_path(), &PipelineOptions::default()).unwrap();

        assert_eq!(report.metadata.rows, 8);
        assert_eq!(report.metadata.subjects, 3);
        assert_eq!(report.metadata.ages, 2);
        assert_eq!(report.step_matrix.subjects, vec!["s1", "s2", "s3"]);
        assert_eq!(report.summaries.mean.columns, vec!["s1", "s2", "s3"]);
        assert_eq!(report.trends.len(), 3);
        assert_eq!(report.series.len(), 3);
        assert_eq!(report.series[2].steps, vec![300, 330]);
        assert_close(report.age_step_means[1].mean_steps, 315.0);
        assert!(report.anova.steps.is_defined());
        assert!(report.metadata.age_crossings.is_empty());
    }

    #[test]
    fn test_blank_speed_cell_leaves_speed_test_undefined() {
        let report = run(&missing_speed_fixture_path(), &PipelineOptions::default()).unwrap();

        assert_eq!(report.metadata.rows, 8);
        assert!(report.anova.steps.is_defined());
        assert!(!report.anova.speed.is_defined());
        assert!(report.series[1].avg_walking_speed[1].is_nan());

        let text = render_text(&report);
        assert!(text.contains("(Age and Walking speed): undefined"));
        assert!(text.contains("As no p-value is obtained"));
        assert!(!text.contains("(Age and Steps): undefined"));
    }

    #[test]
    fn test_age_crossings_recorded_in_metadata() {
        let mut table = WalkingTable::new(vec![
            record("x", "2021-03-01", 20, 100),
            record("y", "2021-03-01", 20, 150),
            record("x", "2021-03-02", 40, 120),
            record("y", "2021-03-02", 20, 160),
        ]);
        loader::derive_average_speed(&mut table);

        let report = analyze(&table, "crossing", &PipelineOptions::default()).unwrap();

        assert_eq!(report.metadata.age_crossings, vec!["x"]);
        let json = crate::report::render_json(&report).unwrap();
        assert!(json.contains("\"age_crossings\""));
    }

    #[test]
    fn test_trend_has_one_point_per_row() {
        let report = analyze(&sample_table(), "sample", &PipelineOptions::default()).unwrap();

        for (curve, series) in report.trends.iter().zip(&report.series) {
            assert_eq!(curve.subject, series.subject);
            assert_eq!(curve.points.len(), series.dates.len());
        }
    }

    #[test]
    fn test_cardinality_expectations() {
        let table = sample_table();
        let mut options = PipelineOptions {
            expect_subjects: Some(3),
            expect_ages: Some(2),
            ..Default::default()
        };
        assert!(analyze(&table, "sample", &options).is_ok());

        options.expect_subjects = Some(7);
        let err = analyze(&table, "sample", &options).unwrap_err();
        match err.downcast_ref::<AnalysisError>() {
            Some(AnalysisError::CardinalityMismatch { key, expected, found }) => {
                assert_eq!(*key, "subject");
                assert_eq!(*expected, 7);
                assert_eq!(*found, 3);
            }
            other => panic!("expected CardinalityMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_column_fails_before_analysis() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "subject,date,age,min_walking_speed_kph").unwrap();
        writeln!(file, "s1,2021-03-01,20,2.0").unwrap();

        let err = run(file.path(), &PipelineOptions::default()).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<LoadError>(),
            Some(LoadError::MissingColumns(_))
        ));
    }

    #[test]
    fn test_underived_table_is_rejected() {
        let mut table = sample_table();
        table.speed_derived = false;

        assert!(analyze(&table, "sample", &PipelineOptions::default()).is_err());
    }

    #[test]
    fn test_options_from_config() {
        let mut config = Config::default();
        config.input.delimiter = ';';
        config.smoothing.frac = 0.5;
        config.validation.expect_ages = Some(3);

        let options = PipelineOptions::from(&config);

        assert_eq!(options.load.delimiter, b';');
        assert_eq!(options.smoothing.frac, 0.5);
        assert_eq!(options.expect_ages, Some(3));
        assert_eq!(options.expect_subjects, None);
    }
}
