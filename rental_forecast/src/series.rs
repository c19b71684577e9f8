//! Monthly series construction for a single group

use crate::data::Observation;
use crate::utils::month_start;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Month-aligned series for one group.
///
/// Points are strictly increasing in date. Months that had no usable
/// observation are absent rather than filled.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlySeries {
    group_key: String,
    points: Vec<(NaiveDate, f64)>,
}

impl MonthlySeries {
    /// Create a series from points that are already month-aligned and sorted
    pub fn new(group_key: &str, points: Vec<(NaiveDate, f64)>) -> Self {
        Self {
            group_key: group_key.to_string(),
            points,
        }
    }

    /// Aggregate raw observations of one group into a monthly series.
    ///
    /// Rows with another key or without a value are ignored; rows falling in the
    /// same calendar month are averaged.
    pub fn from_observations<'a, I>(group_key: &str, observations: I) -> Self
    where
        I: IntoIterator<Item = &'a Observation>,
    {
        let mut buckets: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
        for observation in observations {
            if observation.group_key.as_deref() != Some(group_key) {
                continue;
            }
            let Some(value) = observation.value else {
                continue;
            };
            if !value.is_finite() {
                continue;
            }
            let bucket = buckets
                .entry(month_start(observation.date))
                .or_insert((0.0, 0));
            bucket.0 += value;
            bucket.1 += 1;
        }

        let points = buckets
            .into_iter()
            .map(|(month, (sum, count))| (month, sum / count as f64))
            .collect();

        Self::new(group_key, points)
    }

    /// Group key
    pub fn group_key(&self) -> &str {
        &self.group_key
    }

    /// (month, value) pairs
    pub fn points(&self) -> &[(NaiveDate, f64)] {
        &self.points
    }

    /// Values in date order
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|(_, v)| *v).collect()
    }

    /// Months in date order
    pub fn months(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|(m, _)| *m).collect()
    }

    /// Number of monthly points
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the series has no points
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Last month present in the series
    pub fn last_month(&self) -> Option<NaiveDate> {
        self.points.last().map(|(m, _)| *m)
    }

    /// Points whose month lies in `[start, end]`, both bounds inclusive
    pub fn window(&self, start: NaiveDate, end: NaiveDate) -> MonthlySeries {
        let start = month_start(start);
        let points = self
            .points
            .iter()
            .filter(|(month, _)| *month >= start && *month <= end)
            .copied()
            .collect();
        Self::new(&self.group_key, points)
    }
}
