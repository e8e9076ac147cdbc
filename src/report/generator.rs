//! Text and JSON report generation.
//!
//! This module renders the stdout report from the analysis results, in the
//! order the tables were historically printed: step matrix, mean, minimum
//! and maximum statistics, then the two age significance tests.

use crate::models::{AgeRelationTests, AnalysisReport, Relation, StepMatrix, SummaryTable};
use anyhow::Result;

/// Placeholder printed for missing cells and undefined statistics.
const MISSING: &str = "NaN";

/// Generate the complete plain-text report.
pub fn render_text(report: &AnalysisReport) -> String {
    let mut output = String::new();

    output.push_str("Number of steps taken throughout the month of March:\n");
    output.push_str(&generate_step_matrix_section(&report.step_matrix));
    output.push('\n');

    output.push_str("Average Data Statistics:\n");
    output.push_str(&generate_summary_section(&report.summaries.mean));
    output.push('\n');

    output.push_str("Minimum Data Statistics:\n");
    output.push_str(&generate_summary_section(&report.summaries.min));
    output.push('\n');

    output.push_str("Maximum Data Statistics:\n");
    output.push_str(&generate_summary_section(&report.summaries.max));
    output.push('\n');

    output.push_str(&generate_significance_section(&report.anova));

    output
}

/// Generate the JSON report.
pub fn render_json(report: &AnalysisReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Subjects as rows, dates as columns, summed steps in the cells.
fn generate_step_matrix_section(matrix: &StepMatrix) -> String {
    let mut header = vec!["subject".to_string()];
    header.extend(matrix.dates.iter().map(|d| d.format("%Y-%m-%d").to_string()));

    let rows: Vec<Vec<String>> = matrix
        .subjects
        .iter()
        .zip(&matrix.cells)
        .map(|(subject, cells)| {
            let mut row = vec![subject.clone()];
            row.extend(cells.iter().map(|cell| match cell {
                Some(steps) => steps.to_string(),
                None => MISSING.to_string(),
            }));
            row
        })
        .collect();

    format_table(&header, &rows)
}

/// Metrics as rows, subjects as columns.
fn generate_summary_section(table: &SummaryTable) -> String {
    let mut header = vec![String::new()];
    header.extend(table.columns.iter().cloned());

    let rows: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| {
            let mut cells = vec![row.metric.clone()];
            cells.extend(row.values.iter().map(|v| format_value(*v)));
            cells
        })
        .collect();

    format_table(&header, &rows)
}

/// Both p-values with their interpretation.
fn generate_significance_section(tests: &AgeRelationTests) -> String {
    let mut section = String::new();

    section.push_str(&format!(
        "p-value for the obtained data using ANOVA test (Age and Steps): {}\n\n",
        format_p_value(tests.steps.p_value)
    ));
    match tests.steps.relation() {
        Relation::Related => section.push_str(
            "As p-value < 0.05 we can say that age and number of steps are related.\n\n",
        ),
        Relation::NotRelated => section.push_str(
            "As p-value >= 0.05 we can say that age and number of steps are not related.\n\n",
        ),
        Relation::Undefined => section.push_str(
            "The p-value is undefined, so the relation between age and number of steps \
             cannot be assessed.\n\n",
        ),
    }

    section.push_str(&format!(
        "p-value for the obtained data using ANOVA test (Age and Walking speed): {}\n\n",
        format_p_value(tests.speed.p_value)
    ));
    if !tests.speed.is_defined() {
        section.push_str(
            "As no p-value is obtained it is difficult to comment on the relation between \
             age and walking speed using p-values.\n",
        );
    }

    section
}

/// Align columns: first column left, the rest right.
fn format_table(header: &[String], rows: &[Vec<String>]) -> String {
    let columns = header.len();
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(columns) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let mut table = String::new();
    for row in std::iter::once(header).chain(rows.iter().map(Vec::as_slice)) {
        let line: Vec<String> = row
            .iter()
            .enumerate()
            .take(columns)
            .map(|(i, cell)| {
                if i == 0 {
                    format!("{:<width$}", cell, width = widths[i])
                } else {
                    format!("{:>width$}", cell, width = widths[i])
                }
            })
            .collect();
        table.push_str(line.join("  ").trim_end());
        table.push('\n');
    }

    table
}

fn format_value(value: f64) -> String {
    if value.is_nan() {
        MISSING.to_string()
    } else {
        format!("{:.6}", value)
    }
}

fn format_p_value(p: f64) -> String {
    if p.is_nan() {
        Relation::Undefined.to_string()
    } else if p != 0.0 && p < 1e-4 {
        format!("{:.6e}", p)
    } else {
        format!("{:.6}", p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AnovaResult;
    use crate::pipeline::{analyze, PipelineOptions};
    use crate::test_support::sample_table;

    fn create_test_report() -> AnalysisReport {
        analyze(&sample_table(), "sample.csv", &PipelineOptions::default()).unwrap()
    }

    fn anova(p_value: f64) -> AnovaResult {
        AnovaResult {
            f_statistic: 1.0,
            p_value,
            df_between: 1.0,
            df_within: 10.0,
        }
    }

    #[test]
    fn test_render_text_section_order() {
        let text = render_text(&create_test_report());

        let headings = [
            "Number of steps taken throughout the month of March:",
            "Average Data Statistics:",
            "Minimum Data Statistics:",
            "Maximum Data Statistics:",
            "ANOVA test (Age and Steps)",
            "ANOVA test (Age and Walking speed)",
        ];
        let positions: Vec<usize> = headings
            .iter()
            .map(|h| text.find(h).unwrap_or_else(|| panic!("missing {h}")))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_step_matrix_missing_cell_prints_nan() {
        let report = create_test_report();
        let section = generate_step_matrix_section(&report.step_matrix);

        let s3_line = section.lines().find(|l| l.starts_with("s3")).unwrap();
        assert!(s3_line.contains("300"));
        assert!(s3_line.trim_end().ends_with("NaN"));
        assert!(section.lines().next().unwrap().contains("2021-03-03"));
    }

    #[test]
    fn test_summary_section_layout() {
        let report = create_test_report();
        let section = generate_summary_section(&report.summaries.max);

        let lines: Vec<&str> = section.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("s1") && lines[0].contains("s3"));
        assert!(lines[1].starts_with("max_step_length_cm"));
        assert!(lines[2].contains("5.500000"));
    }

    #[test]
    fn test_significance_interpretation() {
        let related = generate_significance_section(&AgeRelationTests {
            steps: anova(0.01),
            speed: anova(0.3),
        });
        assert!(related.contains("are related"));
        assert!(!related.contains("difficult to comment"));

        let unrelated = generate_significance_section(&AgeRelationTests {
            steps: anova(0.2),
            speed: anova(f64::NAN),
        });
        assert!(unrelated.contains("are not related"));
        assert!(unrelated.contains("(Age and Walking speed): undefined"));
        assert!(unrelated.contains("difficult to comment"));
    }

    #[test]
    fn test_format_p_value() {
        assert_eq!(format_p_value(0.25), "0.250000");
        assert_eq!(format_p_value(0.0), "0.000000");
        assert_eq!(format_p_value(f64::NAN), "undefined");
        assert!(format_p_value(1.5e-7).contains('e'));
    }

    #[test]
    fn test_render_json() {
        let report = create_test_report();
        let json = render_json(&report).unwrap();

        assert!(json.contains("\"step_matrix\""));
        assert!(json.contains("\"summaries\""));
        assert!(json.contains("\"anova\""));

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["metadata"]["subjects"], 3);
        assert!(value["step_matrix"]["cells"][2][2].is_null());
    }
}
