//! Calendar-month arithmetic and value coercion shared by the loaders and the pipeline

use crate::error::{ForecastError, Result};
use chrono::{Datelike, NaiveDate};

/// First day of the month containing `date`
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Shift a month-aligned date by `months` calendar months
pub fn add_months(date: NaiveDate, months: i32) -> Result<NaiveDate> {
    let index = date.year() * 12 + date.month0() as i32 + months;
    let year = index.div_euclid(12);
    let month = index.rem_euclid(12) as u32 + 1;
    NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
        ForecastError::InvalidParameter(format!(
            "Cannot shift {} by {} months",
            date, months
        ))
    })
}

/// The `horizon` month starts that follow `start` inclusive, i.e. `start`, `start + 1 month`, ...
pub fn future_months(start: NaiveDate, horizon: usize) -> Result<Vec<NaiveDate>> {
    let start = month_start(start);
    (0..horizon)
        .map(|step| add_months(start, step as i32))
        .collect()
}

/// Parse a date cell as written by CSV exports.
///
/// Accepts plain dates and datetimes with a time part; only the date is kept.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    let date_part = trimmed
        .split(|c| c == 'T' || c == ' ')
        .next()
        .unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(date_part, "%Y/%m/%d"))
        .map_err(|e| ForecastError::DataError(format!("Unparseable date '{}': {}", raw, e)))
}

/// Coerce a price-like string to a number.
///
/// Currency signs, thousands separators and surrounding whitespace are removed.
/// Empty cells yield `None`.
pub fn parse_numeric(raw: &str) -> Result<Option<f64>> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | '€' | ' '))
        .collect();
    if cleaned.is_empty() || cleaned.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    cleaned
        .parse::<f64>()
        .map(Some)
        .map_err(|_| ForecastError::DataError(format!("Non-numeric value '{}'", raw)))
}
