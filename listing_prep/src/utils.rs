//! Cell parsing and CSV helpers shared by the preparation stages

use crate::{PrepError, Result};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::info;

/// Parse a date or datetime cell, keeping only the date
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y/%m/%d"))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S")
                .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S"))
                .ok()
                .map(|dt| dt.date())
        })
}

/// First day of the month containing `date`
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Parse an identifier that may have been exported as a float, e.g. `"42.0"`
pub fn parse_id(raw: &str) -> Result<i64> {
    let trimmed = raw.trim();
    if let Ok(id) = trimmed.parse::<i64>() {
        return Ok(id);
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| v.trunc() as i64)
        .ok_or_else(|| PrepError::ParseError(format!("Invalid identifier '{}'", raw)))
}

/// Parse a price cell such as `"$1,200.00"`.
///
/// Empty and `nan` cells yield `None`; any other non-numeric text is an error.
pub fn parse_price(raw: &str) -> Result<Option<f64>> {
    let cleaned = raw.trim().replace(['$', ','], "");
    if cleaned.is_empty() || cleaned.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    cleaned
        .parse::<f64>()
        .map(Some)
        .map_err(|_| PrepError::ParseError(format!("Invalid price '{}'", raw)))
}

/// Parse a numeric cell, treating anything unparseable as missing
pub fn coerce_f64(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Mean of the present values, `None` if there are none
pub fn mean_present<I: IntoIterator<Item = Option<f64>>>(values: I) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .flatten()
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Read and concatenate CSV part files into typed records, logging each file's row count
pub fn read_parts<T: DeserializeOwned>(paths: &[PathBuf]) -> Result<Vec<T>> {
    let mut combined = Vec::new();
    for path in paths {
        let records = read_csv::<T>(path)?;
        info!(file = %path.display(), rows = records.len(), "read part file");
        combined.extend(records);
    }
    info!(files = paths.len(), rows = combined.len(), "combined part files");
    Ok(combined)
}

/// Read one CSV file with a header row into typed records
pub fn read_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path).map_err(|e| {
        PrepError::DataLoadError(format!("Failed to open {}: {}", path.display(), e))
    })?;
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);
    let mut records = Vec::new();
    for (i, record) in reader.deserialize::<T>().enumerate() {
        let record = record.map_err(|e| {
            PrepError::DataLoadError(format!(
                "Error reading {} at record {}: {}",
                path.display(),
                i + 1,
                e
            ))
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Write records to a CSV file with a header row
pub fn write_csv<T: Serialize, P: AsRef<Path>>(records: &[T], path: P) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}
