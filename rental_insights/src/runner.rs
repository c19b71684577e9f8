//! Per-city pipeline runs

use crate::config::AppConfig;
use crate::error::Result;
use listing_prep::prepare::{enrich, prepare_city, write_prepared, Enrichers};
use listing_prep::sources::CitySource;
use rental_forecast::{ForecastPipeline, ForecastRun};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// File name of the merged, pre-forecast table of a city
pub fn merged_file_name(city: &str) -> String {
    format!("{}_merged.csv", city)
}

/// File name of the final table of a city
pub fn output_file_name(city: &str) -> String {
    format!("{}_final_data.csv", city)
}

/// Summary of one city's run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityReport {
    pub city: String,
    pub prepared_rows: usize,
    pub output_rows: usize,
    pub forecasted_groups: usize,
    pub skipped_groups: usize,
    pub fallback_groups: usize,
    pub merged_path: PathBuf,
    pub output_path: PathBuf,
}

/// Prepare a city and write its merged table, returning the path and row count
pub fn prepare_to_file(
    config: &AppConfig,
    source: &dyn CitySource,
    city: &str,
    enrichers: &Enrichers<'_>,
) -> Result<(PathBuf, usize)> {
    let files = source.fetch(city)?;
    let mut rows = prepare_city(&files, &config.prep)?;
    enrich(&mut rows, &files, &config.prep, enrichers)?;

    fs::create_dir_all(&config.output_dir)?;
    let merged_path = config.output_dir.join(merged_file_name(&files.city));
    write_prepared(&rows, &merged_path)?;
    info!(city = %files.city, rows = rows.len(), path = %merged_path.display(), "wrote merged table");

    Ok((merged_path, rows.len()))
}

/// Forecast an existing CSV and write the combined table
pub fn forecast_file(config: &AppConfig, input: &Path, output: &Path) -> Result<ForecastRun> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let pipeline = ForecastPipeline::new(config.forecast.clone())?;
    let run = pipeline.run_csv(input, output)?;
    info!(
        input = %input.display(),
        output = %output.display(),
        rows = run.frame.height(),
        "wrote forecast table"
    );
    Ok(run)
}

/// Prepare, forecast and write the final table of one city
pub fn run_city(
    config: &AppConfig,
    source: &dyn CitySource,
    city: &str,
    enrichers: &Enrichers<'_>,
) -> Result<CityReport> {
    let (merged_path, prepared_rows) = prepare_to_file(config, source, city, enrichers)?;
    let city = city.trim().to_lowercase();
    let output_path = config.output_dir.join(output_file_name(&city));
    let run = forecast_file(config, &merged_path, &output_path)?;

    let report = CityReport {
        city,
        prepared_rows,
        output_rows: run.frame.height(),
        forecasted_groups: run.forecasted_groups(),
        skipped_groups: run.skipped_groups(),
        fallback_groups: run.fallback_groups(),
        merged_path,
        output_path,
    };
    info!(
        city = %report.city,
        prepared_rows = report.prepared_rows,
        output_rows = report.output_rows,
        forecasted = report.forecasted_groups,
        skipped = report.skipped_groups,
        fallback = report.fallback_groups,
        "city finished"
    );
    Ok(report)
}
