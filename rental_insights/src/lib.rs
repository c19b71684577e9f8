//! # Rental Insights
//!
//! Application layer tying the preparation and forecasting crates together.
//!
//! A run extracts or resolves a city's exports in a local directory, prepares them into
//! one monthly table, forecasts every neighbourhood two months past the training
//! window and writes `<city>_final_data.csv`.
//!
//! ```no_run
//! use listing_prep::prepare::Enrichers;
//! use listing_prep::ArchiveSource;
//! use rental_insights::{config::load_config, runner::run_city};
//!
//! let config = load_config(None)?;
//! let source = ArchiveSource::new(&config.data_dir, config.prep.parts);
//! let report = run_city(&config, &source, "madrid", &Enrichers::default())?;
//! println!("{} rows written to {}", report.output_rows, report.output_path.display());
//! # Ok::<(), rental_insights::AppError>(())
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runner;

pub use crate::config::{load_config, AppConfig};
pub use crate::error::AppError;
pub use crate::logging::init_tracing;
pub use crate::runner::{forecast_file, run_city, CityReport};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
