//! Differencing and integration of regularly spaced series

/// Difference a series `d` times.
///
/// Each pass replaces the series with its first differences, so the result has
/// `len - d` elements (or is empty once the series runs out).
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() < 2 {
            return Vec::new();
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Undo `d` rounds of differencing for values that continue `history`.
///
/// `differenced` holds future values on the `d`-times differenced scale. The
/// returned values are on the original scale of `history` and directly follow
/// its last observation.
pub fn integrate(differenced: &[f64], history: &[f64], d: usize) -> Vec<f64> {
    if d == 0 || differenced.is_empty() {
        return differenced.to_vec();
    }

    let mut result = differenced.to_vec();
    for level in (0..d).rev() {
        let anchor = difference(history, level).last().copied().unwrap_or(0.0);
        let mut running = anchor;
        for value in result.iter_mut() {
            running += *value;
            *value = running;
        }
    }
    result
}
