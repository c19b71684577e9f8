//! Per-group forecasting over a whole observation table
//!
//! Each group is handled independently by [`process_group`], which never looks at
//! another group's rows. The driver maps that function over the groups, in
//! parallel when enabled, and reduces the results in first-seen group order.

use crate::data::{write_csv, ColumnMap, DataLoader, Observation, ObservationTable};
use crate::emit::{emit_forecast, ForecastRow};
use crate::error::{ForecastError, Result};
use crate::fallback::fallback_with;
use crate::models::arima::{ArimaOrder, TrainedArimaModel};
use crate::search::{OrderSearch, SearchSpace};
use crate::series::MonthlySeries;
use crate::utils::{add_months, month_start};
use chrono::NaiveDate;
use polars::prelude::DataFrame;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use series_math::NelderMeadConfig;
use std::path::Path;
use tracing::{debug, info, warn};

/// Settings for one forecasting run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Column names of the input table
    pub columns: ColumnMap,
    /// First day of the training window, inclusive
    pub train_start: NaiveDate,
    /// Last day of the training window, inclusive
    pub train_end: NaiveDate,
    /// First forecast month; defaults to the month after `train_end`
    pub forecast_start: Option<NaiveDate>,
    /// Number of months to forecast per group
    pub horizon: usize,
    /// Orders explored by the grid search
    pub search: SearchSpace,
    /// Minimum number of monthly points a group needs at all
    pub min_points: usize,
    /// Minimum number of monthly points inside the training window
    pub min_train_points: usize,
    /// Process groups on the rayon thread pool
    pub parallel: bool,
    pub optimizer: NelderMeadConfig,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            columns: ColumnMap::default(),
            train_start: NaiveDate::from_ymd_opt(2023, 9, 1).unwrap_or_default(),
            train_end: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap_or_default(),
            forecast_start: None,
            horizon: 2,
            search: SearchSpace::default(),
            min_points: 2,
            min_train_points: 6,
            parallel: true,
            optimizer: NelderMeadConfig::default(),
        }
    }
}

impl ForecastConfig {
    /// Check the settings before any group is touched
    pub fn validate(&self) -> Result<()> {
        if self.horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "horizon must be at least 1".to_string(),
            ));
        }
        if self.train_start > self.train_end {
            return Err(ForecastError::InvalidParameter(format!(
                "training window starts ({}) after it ends ({})",
                self.train_start, self.train_end
            )));
        }
        if self.min_points == 0 || self.min_train_points == 0 {
            return Err(ForecastError::InvalidParameter(
                "minimum point counts must be positive".to_string(),
            ));
        }
        self.search.validate()
    }

    /// Month stamped on the first forecast row
    pub fn forecast_start_month(&self) -> Result<NaiveDate> {
        match self.forecast_start {
            Some(start) => Ok(month_start(start)),
            None => add_months(month_start(self.train_end), 1),
        }
    }
}

/// Why a group received no forecast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    /// Too few monthly points overall
    TooFewPoints { points: usize, required: usize },
    /// Too few monthly points inside the training window
    TooFewTrainingPoints { points: usize, required: usize },
}

/// Forecast produced for one group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupForecast {
    pub order: ArimaOrder,
    pub used_fallback: bool,
    pub aic: f64,
    pub rows: Vec<ForecastRow>,
}

/// Result of processing one group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GroupOutcome {
    Forecasted(GroupForecast),
    Skipped(SkipReason),
}

impl GroupOutcome {
    /// Forecast rows, empty for skipped groups
    pub fn rows(&self) -> &[ForecastRow] {
        match self {
            GroupOutcome::Forecasted(forecast) => &forecast.rows,
            GroupOutcome::Skipped(_) => &[],
        }
    }
}

/// Build the monthly series of one group, select an order and forecast it.
///
/// Only a failing fallback is an error; too-short groups are skipped.
pub fn process_group(
    group_key: &str,
    observations: &[Observation],
    config: &ForecastConfig,
) -> Result<GroupOutcome> {
    let series = MonthlySeries::from_observations(group_key, observations);
    if series.len() < config.min_points {
        info!(
            group = group_key,
            points = series.len(),
            "skipping group with too few monthly points"
        );
        return Ok(GroupOutcome::Skipped(SkipReason::TooFewPoints {
            points: series.len(),
            required: config.min_points,
        }));
    }

    let train = series.window(config.train_start, config.train_end);
    if train.len() < config.min_train_points {
        info!(
            group = group_key,
            points = train.len(),
            "skipping group with too few points in the training window"
        );
        return Ok(GroupOutcome::Skipped(SkipReason::TooFewTrainingPoints {
            points: train.len(),
            required: config.min_train_points,
        }));
    }

    let report = OrderSearch::new(config.search)
        .with_optimizer(config.optimizer)
        .run(&train);
    let failures = report.failures();
    let (model, used_fallback, rows) =
        forecast_with_fallback(group_key, report.best, &train, config)?;

    debug!(
        group = group_key,
        order = %model.order(),
        aic = model.aic(),
        failures,
        used_fallback,
        "order selected"
    );

    Ok(GroupOutcome::Forecasted(GroupForecast {
        order: model.order(),
        used_fallback,
        aic: model.aic(),
        rows,
    }))
}

/// Forecast with the selected model, switching to the random walk when nothing was
/// selected or the selected model's forecast is unusable.
///
/// Returns the model that produced the rows and whether it is the fallback.
fn forecast_with_fallback(
    group_key: &str,
    selected: Option<TrainedArimaModel>,
    train: &MonthlySeries,
    config: &ForecastConfig,
) -> Result<(TrainedArimaModel, bool, Vec<ForecastRow>)> {
    let start = config.forecast_start_month()?;

    if let Some(model) = selected {
        match emit_forecast(&model, config.horizon, group_key, start) {
            Ok(rows) => return Ok((model, false, rows)),
            Err(err) => warn!(
                group = group_key,
                order = %model.order(),
                error = %err,
                "selected model could not forecast"
            ),
        }
    }

    let model = fallback_with(train, config.optimizer)?;
    let rows = emit_forecast(&model, config.horizon, group_key, start).map_err(|cause| {
        ForecastError::FallbackFailed {
            group: group_key.to_string(),
            cause: cause.to_string(),
        }
    })?;
    Ok((model, true, rows))
}

/// Output of a full run
#[derive(Debug, Clone)]
pub struct ForecastRun {
    /// Source rows plus forecast rows, sorted by (group, date)
    pub frame: DataFrame,
    /// Per-group outcomes in first-seen group order
    pub outcomes: Vec<(String, GroupOutcome)>,
}

impl ForecastRun {
    /// All forecast rows in group order
    pub fn forecast_rows(&self) -> Vec<ForecastRow> {
        self.outcomes
            .iter()
            .flat_map(|(_, outcome)| outcome.rows().iter().cloned())
            .collect()
    }

    /// Number of groups that received a forecast
    pub fn forecasted_groups(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, GroupOutcome::Forecasted(_)))
            .count()
    }

    /// Number of groups that were skipped
    pub fn skipped_groups(&self) -> usize {
        self.outcomes.len() - self.forecasted_groups()
    }

    /// Number of groups forecast with the random-walk fallback
    pub fn fallback_groups(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, GroupOutcome::Forecasted(f) if f.used_fallback))
            .count()
    }
}

/// Drives [`process_group`] over every group of a table
#[derive(Debug, Clone, Default)]
pub struct ForecastPipeline {
    config: ForecastConfig,
}

impl ForecastPipeline {
    /// Create a pipeline, rejecting invalid settings
    pub fn new(config: ForecastConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Settings in use
    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Forecast every group and combine the result with the source rows
    pub fn run(&self, table: &ObservationTable) -> Result<ForecastRun> {
        let groups = table.grouped();
        info!(
            rows = table.len(),
            groups = groups.len(),
            parallel = self.config.parallel,
            "forecasting groups"
        );

        let config = &self.config;
        let outcomes: Vec<(String, GroupOutcome)> = if config.parallel {
            groups
                .par_iter()
                .map(|(key, rows)| process_group(key, rows, config).map(|o| (key.clone(), o)))
                .collect::<Result<_>>()?
        } else {
            groups
                .iter()
                .map(|(key, rows)| process_group(key, rows, config).map(|o| (key.clone(), o)))
                .collect::<Result<_>>()?
        };

        let forecasts: Vec<ForecastRow> = outcomes
            .iter()
            .flat_map(|(_, outcome)| outcome.rows().iter().cloned())
            .collect();
        let frame = table.combine_with(&forecasts)?;

        let run = ForecastRun { frame, outcomes };
        info!(
            forecasted = run.forecasted_groups(),
            skipped = run.skipped_groups(),
            fallback = run.fallback_groups(),
            "forecasting finished"
        );
        Ok(run)
    }

    /// Load a CSV, forecast it and write the combined table to `output`
    pub fn run_csv<P: AsRef<Path>, Q: AsRef<Path>>(&self, input: P, output: Q) -> Result<ForecastRun> {
        let table = DataLoader::from_csv(input, &self.config.columns)?;
        let mut run = self.run(&table)?;
        write_csv(&mut run.frame, output)?;
        Ok(run)
    }
}
