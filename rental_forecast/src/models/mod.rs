//! Forecasting models for monthly series

use crate::error::{ForecastError, Result};
use crate::series::MonthlySeries;
use std::fmt::Debug;

/// Point forecasts for consecutive future months
#[derive(Debug, Clone, PartialEq)]
pub struct PointForecast {
    values: Vec<f64>,
}

impl PointForecast {
    /// Wrap `steps` forecast values, rejecting a wrong count or non-finite values
    pub fn new(values: Vec<f64>, steps: usize) -> Result<Self> {
        if values.len() != steps {
            return Err(ForecastError::ModelError(format!(
                "expected {} forecast values, got {}",
                steps,
                values.len()
            )));
        }
        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(ForecastError::ModelError(format!(
                "forecast produced a non-finite value ({})",
                bad
            )));
        }
        Ok(Self { values })
    }

    /// Values, one per month ahead
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Months forecast
    pub fn steps(&self) -> usize {
        self.values.len()
    }
}

/// A fitted model able to extrapolate its training series
pub trait TrainedForecastModel: Debug {
    /// Forecast `steps` months past the end of the training series
    fn forecast(&self, steps: usize) -> Result<PointForecast>;

    /// Penalised fit score; lower is better
    fn score(&self) -> f64;

    fn name(&self) -> &str;
}

/// An unfitted model configuration that can be trained to a monthly series
pub trait ForecastModel: Debug + Clone {
    type Trained: TrainedForecastModel;

    /// Fit to the values of `series` in month order
    fn train(&self, series: &MonthlySeries) -> Result<Self::Trained>;

    fn name(&self) -> &str;
}

pub mod arima;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_count_and_nan() {
        assert!(PointForecast::new(vec![1.0], 2).is_err());
        assert!(PointForecast::new(vec![1.0, f64::NAN], 2).is_err());
        assert_eq!(PointForecast::new(vec![1.0, 2.0], 2).unwrap().steps(), 2);
    }
}
