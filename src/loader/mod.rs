//! Table loading and feature derivation.
//!
//! This module reads the delimited walking-metrics file into an ordered
//! [`WalkingTable`] and appends the derived average walking speed column.

use crate::error::LoadError;
use crate::models::{WalkingRecord, WalkingTable};
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Date format of the `date` column.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Header columns every input file must carry.
pub const REQUIRED_COLUMNS: [&str; 9] = [
    "subject",
    "date",
    "age",
    "steps",
    "min_walking_speed_kph",
    "max_walking_speed_kph",
    "min_step_length_cm",
    "max_step_length_cm",
    "walking_asymmetry",
];

/// Options for reading the input table.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Field delimiter byte.
    pub delimiter: u8,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl From<&crate::config::InputConfig> for LoadOptions {
    fn from(config: &crate::config::InputConfig) -> Self {
        Self {
            delimiter: config.delimiter_byte(),
        }
    }
}

/// A row as it appears in the file, before date parsing.
#[derive(Debug, Deserialize)]
struct RawRecord {
    subject: String,
    date: String,
    age: u32,
    steps: u64,
    min_walking_speed_kph: Option<f64>,
    max_walking_speed_kph: Option<f64>,
    min_step_length_cm: Option<f64>,
    max_step_length_cm: Option<f64>,
    walking_asymmetry: Option<f64>,
}

impl RawRecord {
    fn into_record(self, line: u64) -> Result<WalkingRecord, LoadError> {
        let date = NaiveDate::parse_from_str(&self.date, DATE_FORMAT).map_err(|_| {
            LoadError::InvalidDate {
                line,
                value: self.date.clone(),
            }
        })?;

        Ok(WalkingRecord {
            subject: self.subject,
            date,
            age: self.age,
            steps: self.steps,
            min_walking_speed_kph: self.min_walking_speed_kph.unwrap_or(f64::NAN),
            max_walking_speed_kph: self.max_walking_speed_kph.unwrap_or(f64::NAN),
            min_step_length_cm: self.min_step_length_cm.unwrap_or(f64::NAN),
            max_step_length_cm: self.max_step_length_cm.unwrap_or(f64::NAN),
            walking_asymmetry: self.walking_asymmetry.unwrap_or(f64::NAN),
            avg_walking_speed: f64::NAN,
        })
    }
}

/// Load the walking table from a file path.
pub fn load_table(path: &Path, options: &LoadOptions) -> Result<WalkingTable, LoadError> {
    info!("Loading walking data from: {}", path.display());

    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    read_table(file, options)
}

/// Read the walking table from any reader.
///
/// The header is checked before any row is parsed, so a missing column is
/// reported without touching the data. Rows keep file order.
pub fn read_table<R: Read>(reader: R, options: &LoadOptions) -> Result<WalkingTable, LoadError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    validate_headers(&headers)?;

    let mut records = Vec::new();
    for result in csv_reader.records() {
        let row = result?;
        let line = row.position().map(|p| p.line()).unwrap_or(0);
        let raw: RawRecord = row.deserialize(Some(&headers))?;
        records.push(raw.into_record(line)?);
    }

    if records.is_empty() {
        return Err(LoadError::Empty);
    }

    debug!("Loaded {} rows", records.len());
    Ok(WalkingTable::new(records))
}

/// Check that every required column is present in the header.
fn validate_headers(headers: &csv::StringRecord) -> Result<(), LoadError> {
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !headers.iter().any(|h| h == **col))
        .map(|col| col.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(LoadError::MissingColumns(missing))
    }
}

/// Append `avg_walking_speed` as the midpoint of min and max walking speed.
pub fn derive_average_speed(table: &mut WalkingTable) {
    for record in &mut table.records {
        record.avg_walking_speed =
            (record.min_walking_speed_kph + record.max_walking_speed_kph) / 2.0;
    }
    table.speed_derived = true;
}
