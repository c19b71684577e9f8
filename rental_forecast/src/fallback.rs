//! Random-walk fallback for groups where no searched order could be fitted

use crate::error::{ForecastError, Result};
use crate::models::arima::{ArimaModel, ArimaOrder, TrainedArimaModel};
use crate::series::MonthlySeries;
use series_math::NelderMeadConfig;
use tracing::warn;

/// Fit ARIMA(0,1,0) to the training window.
///
/// Its forecast repeats the last training value. Failure here is fatal for the
/// whole run and is reported with the group that caused it.
pub fn fallback(train: &MonthlySeries) -> Result<TrainedArimaModel> {
    fallback_with(train, NelderMeadConfig::default())
}

/// Same as [`fallback`] with explicit optimiser settings
pub fn fallback_with(
    train: &MonthlySeries,
    optimizer: NelderMeadConfig,
) -> Result<TrainedArimaModel> {
    warn!(
        group = train.group_key(),
        points = train.len(),
        "no candidate order could be fitted, using ARIMA{}",
        ArimaOrder::random_walk()
    );

    ArimaModel::from_order(ArimaOrder::random_walk())
        .with_optimizer(optimizer)
        .fit(&train.values())
        .map_err(|cause| ForecastError::FallbackFailed {
            group: train.group_key().to_string(),
            cause: cause.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TrainedForecastModel;
    use chrono::NaiveDate;

    fn ymd(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    #[test]
    fn repeats_last_value() {
        let train = MonthlySeries::new(
            "Centro",
            vec![(ymd(2024, 1), 90.0), (ymd(2024, 2), 95.0), (ymd(2024, 3), 93.0)],
        );

        let model = fallback(&train).unwrap();

        assert_eq!(model.order(), ArimaOrder::random_walk());
        assert_eq!(model.forecast(2).unwrap().values(), &[93.0, 93.0]);
    }

    #[test]
    fn single_point_is_fatal() {
        let train = MonthlySeries::new("Centro", vec![(ymd(2024, 1), 90.0)]);

        let err = fallback(&train).unwrap_err();

        match err {
            ForecastError::FallbackFailed { group, .. } => assert_eq!(group, "Centro"),
            other => panic!("Expected FallbackFailed, got {:?}", other),
        }
    }
}
