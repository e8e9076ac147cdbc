//! Grouped aggregation over the walking table.
//!
//! This module provides the two group-by passes of the analysis: summed
//! steps per subject per date (pivoted into a matrix) and mean steps per age
//! bracket.

use crate::models::{AgeStepMean, StepMatrix, WalkingTable};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, warn};

/// Group by (subject, date), sum steps and pivot into a subject x date matrix.
///
/// Rows and columns come out sorted. A subject without a record on a date
/// gets `None`, not zero. Duplicate (subject, date) rows are summed.
pub fn step_matrix(table: &WalkingTable) -> StepMatrix {
    let mut grouped: BTreeMap<(String, NaiveDate), u64> = BTreeMap::new();
    let mut row_counts: HashMap<(String, NaiveDate), usize> = HashMap::new();

    for record in &table.records {
        let key = (record.subject.clone(), record.date);
        *grouped.entry(key.clone()).or_default() += record.steps;
        *row_counts.entry(key).or_default() += 1;
    }

    for ((subject, date), count) in &row_counts {
        if *count > 1 {
            warn!(
                "{} rows for subject '{}' on {}; their steps are summed",
                count, subject, date
            );
        }
    }

    let subjects: Vec<String> = grouped
        .keys()
        .map(|(s, _)| s.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let dates: Vec<NaiveDate> = grouped
        .keys()
        .map(|(_, d)| *d)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let cells = subjects
        .iter()
        .map(|subject| {
            dates
                .iter()
                .map(|date| grouped.get(&(subject.clone(), *date)).copied())
                .collect()
        })
        .collect();

    debug!(
        "Step matrix: {} subjects x {} dates",
        subjects.len(),
        dates.len()
    );

    StepMatrix {
        subjects,
        dates,
        cells,
    }
}

/// Mean steps per age bracket.
///
/// Steps are first averaged per (age, date), then those daily means are
/// averaged per age. Ages come out in first-seen order.
pub fn age_step_means(table: &WalkingTable) -> Vec<AgeStepMean> {
    let mut daily: HashMap<u32, BTreeMap<NaiveDate, (f64, usize)>> = HashMap::new();

    for record in &table.records {
        let entry = daily
            .entry(record.age)
            .or_default()
            .entry(record.date)
            .or_insert((0.0, 0));
        entry.0 += record.steps as f64;
        entry.1 += 1;
    }

    table
        .ages()
        .into_iter()
        .map(|age| {
            let per_date: Vec<f64> = daily
                .get(&age)
                .map(|dates| {
                    dates
                        .values()
                        .map(|(sum, count)| sum / *count as f64)
                        .collect()
                })
                .unwrap_or_default();

            let mean_steps = per_date.iter().sum::<f64>() / per_date.len() as f64;
            AgeStepMean { age, mean_steps }
        })
        .collect()
}

/// Map each subject to the distinct age brackets it appears in.
///
/// Subjects are expected to stay in one bracket; crossings are logged.
pub fn subject_age_brackets(table: &WalkingTable) -> BTreeMap<String, BTreeSet<u32>> {
    let mut brackets: BTreeMap<String, BTreeSet<u32>> = BTreeMap::new();

    for record in &table.records {
        brackets
            .entry(record.subject.clone())
            .or_default()
            .insert(record.age);
    }

    for (subject, ages) in &brackets {
        if ages.len() > 1 {
            warn!("Subject '{}' appears in {} age brackets", subject, ages.len());
        }
    }

    brackets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{assert_close, date, record, sample_table};

    #[test]
    fn test_step_matrix_shape_and_missing_cell() {
        let matrix = step_matrix(&sample_table());

        assert_eq!(matrix.subjects, vec!["s1", "s2", "s3"]);
        assert_eq!(
            matrix.dates,
            vec![date("2021-03-01"), date("2021-03-02"), date("2021-03-03")]
        );
        assert_eq!(matrix.cells[0], vec![Some(100), Some(110), Some(120)]);
        assert_eq!(matrix.cells[2], vec![Some(300), Some(330), None]);
    }

    #[test]
    fn test_step_matrix_row_sums_match_input() {
        let table = sample_table();
        let matrix = step_matrix(&table);

        for subject in table.subjects() {
            let expected: u64 = table
                .records
                .iter()
                .filter(|r| r.subject == subject)
                .map(|r| r.steps)
                .sum();
            assert_eq!(matrix.row_total(&subject), Some(expected));
        }
    }

    #[test]
    fn test_step_matrix_sums_duplicates() {
        let table = WalkingTable::new(vec![
            record("a", "2021-03-01", 20, 100),
            record("a", "2021-03-01", 20, 50),
            record("b", "2021-03-02", 20, 10),
        ]);

        let matrix = step_matrix(&table);

        assert_eq!(matrix.get("a", date("2021-03-01")), Some(Some(150)));
        assert_eq!(matrix.get("a", date("2021-03-02")), Some(None));
        assert_eq!(matrix.get("b", date("2021-03-01")), Some(None));
    }

    #[test]
    fn test_age_step_means() {
        let means = age_step_means(&sample_table());

        assert_eq!(means.len(), 2);
        assert_eq!(means[0].age, 20);
        assert_close(means[0].mean_steps, 160.0);
        assert_eq!(means[1].age, 40);
        assert_close(means[1].mean_steps, 315.0);
    }

    #[test]
    fn test_age_step_means_first_seen_order() {
        let table = WalkingTable::new(vec![
            record("x", "2021-03-01", 60, 10),
            record("y", "2021-03-01", 20, 30),
            record("x", "2021-03-02", 60, 20),
        ]);

        let means = age_step_means(&table);

        assert_eq!(means[0].age, 60);
        assert_close(means[0].mean_steps, 15.0);
        assert_eq!(means[1].age, 20);
        assert_close(means[1].mean_steps, 30.0);
    }

    #[test]
    fn test_subject_age_brackets() {
        let table = WalkingTable::new(vec![
            record("x", "2021-03-01", 20, 10),
            record("x", "2021-03-02", 40, 10),
            record("y", "2021-03-01", 20, 10),
        ]);

        let brackets = subject_age_brackets(&table);

        assert_eq!(brackets["x"].len(), 2);
        assert_eq!(brackets["y"].len(), 1);
    }
}
