//! # Rental Forecast
//!
//! Per-neighbourhood monthly forecasting for short-term rental prices.
//!
//! ## Features
//!
//! - Observation tables loaded from CSV or built from a polars `DataFrame`
//! - Monthly aggregation per group, averaging rows within a calendar month
//! - ARIMA(p,d,q) fitted by conditional sum of squares
//! - Exhaustive order search by AIC with a random-walk fallback
//! - Forecast rows appended to the source table and sorted by (group, date)
//! - Optional parallel processing of groups with rayon
//!
//! ## Quick Start
//!
//! ```no_run
//! use rental_forecast::data::DataLoader;
//! use rental_forecast::pipeline::{ForecastConfig, ForecastPipeline};
//!
//! let config = ForecastConfig::default();
//! let table = DataLoader::from_csv("barcelona_merged.csv", &config.columns)?;
//!
//! let pipeline = ForecastPipeline::new(config)?;
//! let mut run = pipeline.run(&table)?;
//!
//! rental_forecast::data::write_csv(&mut run.frame, "barcelona_final_data.csv")?;
//! # Ok::<(), rental_forecast::ForecastError>(())
//! ```

pub mod data;
pub mod emit;
pub mod error;
pub mod fallback;
pub mod models;
pub mod pipeline;
pub mod search;
pub mod series;
pub mod utils;

// Re-export commonly used types
pub use crate::data::{ColumnMap, DataLoader, Observation, ObservationTable};
pub use crate::emit::{emit_forecast, ForecastRow};
pub use crate::error::ForecastError;
pub use crate::fallback::fallback;
pub use crate::models::arima::{ArimaModel, ArimaOrder, TrainedArimaModel};
pub use crate::models::{ForecastModel, PointForecast, TrainedForecastModel};
pub use crate::pipeline::{
    process_group, ForecastConfig, ForecastPipeline, ForecastRun, GroupForecast, GroupOutcome,
    SkipReason,
};
pub use crate::search::{grid_search, OrderRange, OrderSearch, SearchReport, SearchSpace};
pub use crate::series::MonthlySeries;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
