//! Shared builders for unit tests.

use crate::loader::derive_average_speed;
use crate::models::{WalkingRecord, WalkingTable};
use chrono::NaiveDate;
use std::path::PathBuf;

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// A record with fixed measurement values.
pub fn record(subject: &str, day: &str, age: u32, steps: u64) -> WalkingRecord {
    record_full(subject, day, age, steps, [2.0, 4.0, 50.0, 70.0, 1.0])
}

/// A record with `[min_speed, max_speed, min_len, max_len, asymmetry]`.
pub fn record_full(
    subject: &str,
    day: &str,
    age: u32,
    steps: u64,
    measures: [f64; 5],
) -> WalkingRecord {
    WalkingRecord {
        subject: subject.to_string(),
        date: date(day),
        age,
        steps,
        min_walking_speed_kph: measures[0],
        max_walking_speed_kph: measures[1],
        min_step_length_cm: measures[2],
        max_step_length_cm: measures[3],
        walking_asymmetry: measures[4],
        avg_walking_speed: f64::NAN,
    }
}

/// Same rows as `fixtures/walking_sample.csv`, speed already derived.
pub fn sample_table() -> WalkingTable {
    let mut table = WalkingTable::new(vec![
        record_full("s1", "2021-03-01", 20, 100, [2.0, 4.0, 50.0, 70.0, 1.0]),
        record_full("s2", "2021-03-01", 20, 200, [2.5, 4.5, 60.0, 72.0, 0.5]),
        record_full("s3", "2021-03-01", 40, 300, [1.5, 3.5, 40.0, 65.0, 4.0]),
        record_full("s1", "2021-03-02", 20, 110, [3.0, 5.0, 55.0, 75.0, 2.0]),
        record_full("s2", "2021-03-02", 20, 210, [2.0, 5.5, 58.0, 78.0, 1.5]),
        record_full("s3", "2021-03-02", 40, 330, [2.0, 3.0, 42.0, 60.0, 6.0]),
        record_full("s1", "2021-03-03", 20, 120, [1.0, 6.0, 45.0, 80.0, 3.0]),
        record_full("s2", "2021-03-03", 20, 220, [3.5, 4.0, 62.0, 74.0, f64::NAN]),
    ]);
    derive_average_speed(&mut table);
    table
}

pub fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures/walking_sample.csv")
}

/// The sample rows with `s2`'s 2021-03-02 minimum walking speed left blank.
pub fn missing_speed_fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures/walking_missing_speed.csv")
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
