//! # Series Math
//!
//! Numeric building blocks for fitting small autoregressive models to monthly series.
//! This crate provides the pieces the forecasting crate composes:
//!
//! - Differencing and its inverse (`differencing`)
//! - A bounded Nelder-Mead simplex minimiser (`optimization`)
//! - Descriptive statistics and Gaussian likelihood helpers (`stats`)

use thiserror::Error;

pub mod differencing;
pub mod optimization;
pub mod stats;

pub use differencing::{difference, integrate};
pub use optimization::{nelder_mead, NelderMeadConfig, NelderMeadResult};
pub use stats::{akaike_information_criterion, gaussian_log_likelihood, mean, variance};

/// Errors that can occur in numeric routines
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for numeric operations
pub type Result<T> = std::result::Result<T, MathError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_carry_context() {
        let err = MathError::InsufficientData("need 3 points, got 1".to_string());
        assert_eq!(
            err.to_string(),
            "Insufficient data for calculation: need 3 points, got 1"
        );
    }
}
