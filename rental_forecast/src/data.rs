//! Observation tables: loading, typed extraction and output assembly

use crate::emit::ForecastRow;
use crate::error::{ForecastError, Result};
use crate::utils::{parse_date, parse_numeric};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

/// Names of the three columns the forecaster reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMap {
    /// Categorical key that defines a group (a neighbourhood)
    pub group: String,
    /// Observation date
    pub date: String,
    /// Numeric value to forecast
    pub value: String,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            group: "neighbourhood_cleansed".to_string(),
            date: "date".to_string(),
            value: "price".to_string(),
        }
    }
}

/// One typed row of the source table
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Group the row belongs to; rows without a key pass through untouched
    pub group_key: Option<String>,
    /// Observation date
    pub date: NaiveDate,
    /// Observed value; empty cells are kept as `None` and ignored by aggregation
    pub value: Option<f64>,
}

impl Observation {
    /// Convenience constructor for a fully populated row
    pub fn new(group_key: &str, date: NaiveDate, value: f64) -> Self {
        Self {
            group_key: Some(group_key.to_string()),
            date,
            value: Some(value),
        }
    }
}

/// Data loader for observation tables
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load a table from a CSV file with a header row
    pub fn from_csv<P: AsRef<Path>>(path: P, columns: &ColumnMap) -> Result<ObservationTable> {
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        ObservationTable::from_dataframe(df, columns.clone())
    }

    /// Create an observation table from an existing DataFrame
    pub fn from_dataframe(df: DataFrame, columns: &ColumnMap) -> Result<ObservationTable> {
        ObservationTable::from_dataframe(df, columns.clone())
    }
}

/// A source table together with its typed (group, date, value) view.
///
/// Every column of the source frame is kept so the combined output can carry
/// the original rows unchanged.
#[derive(Debug, Clone)]
pub struct ObservationTable {
    df: DataFrame,
    columns: ColumnMap,
    observations: Vec<Observation>,
}

impl ObservationTable {
    /// Extract the typed view from a frame, failing fast on schema violations
    pub fn from_dataframe(df: DataFrame, columns: ColumnMap) -> Result<Self> {
        let groups = string_column(&df, &columns.group)?;
        let dates = string_column(&df, &columns.date)?;
        let values = numeric_column(&df, &columns.value)?;

        let mut observations = Vec::with_capacity(df.height());
        for (row, ((group_key, date), value)) in groups
            .into_iter()
            .zip(dates)
            .zip(values)
            .enumerate()
        {
            let raw_date = date.ok_or_else(|| {
                ForecastError::DataError(format!(
                    "Row {}: missing value in date column '{}'",
                    row, columns.date
                ))
            })?;
            let date = parse_date(&raw_date)
                .map_err(|e| ForecastError::DataError(format!("Row {}: {}", row, e)))?;
            observations.push(Observation {
                group_key,
                date,
                value,
            });
        }

        Ok(Self {
            df,
            columns,
            observations,
        })
    }

    /// Build a three-column table directly from observations
    pub fn from_observations(observations: Vec<Observation>, columns: ColumnMap) -> Result<Self> {
        let groups: Vec<Option<&str>> = observations
            .iter()
            .map(|o| o.group_key.as_deref())
            .collect();
        let values: Vec<Option<f64>> = observations.iter().map(|o| o.value).collect();
        let df = DataFrame::new(vec![
            Series::new(&columns.group, groups),
            date_series(&columns.date, observations.iter().map(|o| o.date))?,
            Series::new(&columns.value, values),
        ])?;

        Ok(Self {
            df,
            columns,
            observations,
        })
    }

    /// Source frame as loaded
    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    /// Column names in use
    pub fn columns(&self) -> &ColumnMap {
        &self.columns
    }

    /// Typed rows in source order
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Check if the table has no rows
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Distinct non-null group keys in first-seen order
    pub fn group_keys(&self) -> Vec<String> {
        self.grouped().into_iter().map(|(key, _)| key).collect()
    }

    /// Rows partitioned by group key, groups in first-seen order
    pub fn grouped(&self) -> Vec<(String, Vec<Observation>)> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut groups: Vec<(String, Vec<Observation>)> = Vec::new();
        for observation in &self.observations {
            let Some(key) = observation.group_key.as_deref() else {
                continue;
            };
            let slot = *index.entry(key).or_insert_with(|| {
                groups.push((key.to_string(), Vec::new()));
                groups.len() - 1
            });
            groups[slot].1.push(observation.clone());
        }
        groups
    }

    /// Source frame with the key column as text, the date column as `Date`
    /// and the value column as `Float64`
    pub fn normalized_frame(&self) -> Result<DataFrame> {
        let groups: Vec<Option<&str>> = self
            .observations
            .iter()
            .map(|o| o.group_key.as_deref())
            .collect();
        let values: Vec<Option<f64>> = self.observations.iter().map(|o| o.value).collect();

        let mut df = self.df.clone();
        df.with_column(Series::new(&self.columns.group, groups))?;
        df.with_column(date_series(
            &self.columns.date,
            self.observations.iter().map(|o| o.date),
        )?)?;
        df.with_column(Series::new(&self.columns.value, values))?;
        Ok(df)
    }

    /// Append forecast rows to the normalised source rows and sort by (group, date).
    ///
    /// Forecast rows carry nulls in every column other than the three core columns.
    /// The sort is stable, so rows sharing a (group, date) keep their source order.
    pub fn combine_with(&self, forecasts: &[ForecastRow]) -> Result<DataFrame> {
        let mut combined = self.normalized_frame()?;
        let extension = forecast_frame(&combined, &self.columns, forecasts)?;
        combined.vstack_mut(&extension)?;
        let sorted = combined.sort(
            [self.columns.group.as_str(), self.columns.date.as_str()],
            vec![false, false],
            true,
        )?;
        Ok(sorted)
    }
}

/// Write a frame to CSV with a header row
pub fn write_csv<P: AsRef<Path>>(df: &mut DataFrame, path: P) -> Result<()> {
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).has_header(true).finish(df)?;
    Ok(())
}

fn forecast_frame(
    template: &DataFrame,
    columns: &ColumnMap,
    rows: &[ForecastRow],
) -> Result<DataFrame> {
    let mut out = Vec::with_capacity(template.width());
    for series in template.get_columns() {
        let name = series.name();
        let column = if name == columns.group {
            let keys: Vec<&str> = rows.iter().map(|r| r.group_key.as_str()).collect();
            Series::new(name, keys)
        } else if name == columns.date {
            date_series(name, rows.iter().map(|r| r.date))?
        } else if name == columns.value {
            let values: Vec<Option<f64>> = rows.iter().map(|r| Some(r.value)).collect();
            Series::new(name, values)
        } else {
            Series::full_null(name, rows.len(), series.dtype())
        };
        out.push(column);
    }
    Ok(DataFrame::new(out)?)
}

fn date_series(name: &str, dates: impl Iterator<Item = NaiveDate>) -> Result<Series> {
    let days: Vec<i32> = dates.map(days_since_epoch).collect();
    Ok(Series::new(name, days).cast(&DataType::Date)?)
}

fn days_since_epoch(date: NaiveDate) -> i32 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();
    (date - epoch).num_days() as i32
}

fn string_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let col = df.column(name).map_err(|e| {
        ForecastError::DataError(format!("Column '{}' not found: {}", name, e))
    })?;
    let text = col.cast(&DataType::Utf8)?;
    let values = text
        .utf8()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect();
    Ok(values)
}

fn numeric_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let col = df.column(name).map_err(|e| {
        ForecastError::DataError(format!("Column '{}' not found: {}", name, e))
    })?;

    match col.dtype() {
        DataType::Utf8 => col
            .utf8()?
            .into_iter()
            .enumerate()
            .map(|(row, raw)| match raw {
                Some(raw) => parse_numeric(raw).map_err(|e| {
                    ForecastError::DataError(format!("Row {} of '{}': {}", row, name, e))
                }),
                None => Ok(None),
            })
            .collect(),
        dtype if dtype.is_numeric() => {
            let cast = col.cast(&DataType::Float64)?;
            Ok(cast.f64()?.into_iter().collect())
        }
        other => Err(ForecastError::DataError(format!(
            "Column '{}' has type {} which cannot be converted to f64",
            name, other
        ))),
    }
}
