//! Calendar export processing

use crate::utils::{month_start, parse_date, parse_id, read_parts};
use crate::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

/// One raw calendar row; unused export columns are ignored
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CalendarRecord {
    pub listing_id: String,
    pub date: Option<String>,
    pub available: Option<String>,
    pub price: Option<String>,
}

/// Cleaned calendar row at monthly resolution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarEntry {
    pub listing_id: i64,
    /// First day of the month
    pub date: NaiveDate,
    pub available: Option<String>,
    /// Raw nightly price as exported
    pub price: Option<String>,
}

/// Read every calendar part and clean the combined rows
pub fn process_calendar(paths: &[PathBuf]) -> Result<Vec<CalendarEntry>> {
    let records: Vec<CalendarRecord> = read_parts(paths)?;
    clean_calendar(records)
}

/// Keep bookable nights, one row per listing and month.
///
/// Rows marked unavailable (`"f"`) or with an unparseable date are dropped. The
/// first row of each (listing, month) in source order survives.
pub fn clean_calendar(records: Vec<CalendarRecord>) -> Result<Vec<CalendarEntry>> {
    let initial = records.len();
    let available: Vec<CalendarRecord> = records
        .into_iter()
        .filter(|r| r.available.as_deref() != Some("f"))
        .collect();
    info!(
        before = initial,
        after = available.len(),
        "filtered unavailable nights"
    );

    let mut invalid_dates = 0usize;
    let mut entries = Vec::with_capacity(available.len());
    for record in available {
        let Some(date) = record.date.as_deref().and_then(parse_date) else {
            invalid_dates += 1;
            continue;
        };
        entries.push(CalendarEntry {
            listing_id: parse_id(&record.listing_id)?,
            date: month_start(date),
            available: record.available,
            price: record.price,
        });
    }
    info!(invalid_dates, rows = entries.len(), "dropped rows with invalid dates");

    // Stable, so the earliest source row wins the de-duplication below
    entries.sort_by_key(|e| (e.listing_id, e.date));
    entries.dedup_by_key(|e| (e.listing_id, e.date));
    info!(rows = entries.len(), "dropped duplicate listing months");

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(id: &str, date: &str, available: &str, price: &str) -> CalendarRecord {
        CalendarRecord {
            listing_id: id.to_string(),
            date: Some(date.to_string()),
            available: Some(available.to_string()),
            price: Some(price.to_string()),
        }
    }

    #[test]
    fn keeps_first_night_per_listing_month() {
        let rows = vec![
            record("2", "2023-09-03", "t", "$90.00"),
            record("1.0", "2023-09-20", "t", "$120.00"),
            record("1", "2023-09-02", "t", "$110.00"),
            record("1", "2023-10-01", "f", "$130.00"),
            record("1", "not a date", "t", "$140.00"),
        ];

        let entries = clean_calendar(rows).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].listing_id, 1);
        assert_eq!(entries[0].date, NaiveDate::from_ymd_opt(2023, 9, 1).unwrap());
        assert_eq!(entries[0].price.as_deref(), Some("$120.00"));
        assert_eq!(entries[1].listing_id, 2);
    }
}
