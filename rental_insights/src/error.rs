//! Error type for the application layer

use config::ConfigError;
use listing_prep::PrepError;
use rental_forecast::ForecastError;
use thiserror::Error;

/// Errors surfaced by a pipeline run
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration loading failed: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Preparation failed: {0}")]
    Prep(#[from] PrepError),

    #[error("Forecasting failed: {0}")]
    Forecast(#[from] ForecastError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for the application layer
pub type Result<T> = std::result::Result<T, AppError>;
