//! # Rental Insights Workspace
//!
//! Umbrella crate re-exporting the workspace members:
//!
//! - [`series_math`]: differencing, bounded Nelder-Mead and likelihood helpers
//! - [`rental_forecast`]: per-neighbourhood ARIMA order search and forecasting
//! - [`listing_prep`]: calendar, listing and review preparation
//! - [`rental_insights`]: configuration, logging and per-city runs
//!
//! ## Example
//!
//! ```
//! use rental_insights_workspace::rental_forecast::{ArimaOrder, ForecastConfig};
//!
//! let config = ForecastConfig::default();
//! assert_eq!(config.horizon, 2);
//! assert_eq!(ArimaOrder::random_walk().to_string(), "(0,1,0)");
//! ```

pub use listing_prep;
pub use rental_forecast;
pub use rental_insights;
pub use series_math;
