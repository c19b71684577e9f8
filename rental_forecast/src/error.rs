//! Error types for the rental_forecast crate

use polars::prelude::PolarsError;
use series_math::MathError;
use thiserror::Error;

/// Custom error types for the rental_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Input table violates the expected schema or contains unusable values
    #[error("Data error: {0}")]
    DataError(String),

    /// A single model could not be fitted or used
    #[error("Model error: {0}")]
    ModelError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The drift-free random walk could not be fitted, leaving the group without a forecast
    #[error("Fallback ARIMA(0,1,0) failed for group '{group}': {cause}")]
    FallbackFailed { group: String, cause: String },

    /// Error from numeric routines
    #[error("Math error: {0}")]
    MathError(#[from] MathError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}
