//! Turning a fitted model into dated forecast rows

use crate::error::Result;
use crate::models::TrainedForecastModel;
use crate::utils::future_months;
use chrono::NaiveDate;
use serde::Serialize;

/// One forecasted (group, month, value) row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastRow {
    pub group_key: String,
    pub date: NaiveDate,
    pub value: f64,
}

/// Forecast `steps` months ahead and stamp each value with a consecutive
/// month start, beginning at `start_date`'s month.
pub fn emit_forecast<M: TrainedForecastModel + ?Sized>(
    model: &M,
    steps: usize,
    group_key: &str,
    start_date: NaiveDate,
) -> Result<Vec<ForecastRow>> {
    let forecast = model.forecast(steps)?;
    let months = future_months(start_date, steps)?;

    Ok(months
        .into_iter()
        .zip(forecast.values())
        .map(|(date, value)| ForecastRow {
            group_key: group_key.to_string(),
            date,
            value: *value,
        })
        .collect())
}
