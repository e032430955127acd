//! Error metrics for regression models.

use std::iter;

/// Mean squared error between observations and predictions.
///
/// Returns `None` when the slices are empty or differ in length.
///
/// # Examples
///
/// ```
/// use mirrorball_stats::regression::mean_squared_error;
///
/// assert_eq!(mean_squared_error(&[1.0, 2.0], &[1.0, 4.0]), Some(2.0));
/// assert_eq!(mean_squared_error(&[], &[]), None);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn mean_squared_error(observed: &[f64], predicted: &[f64]) -> Option<f64> {
    if observed.is_empty() || observed.len() != predicted.len() {
        return None;
    }
    let sum = iter::zip(observed, predicted)
        .map(|(y, p)| (y - p).powi(2))
        .sum::<f64>();
    Some(sum / observed.len() as f64)
}

/// Mean absolute error between observations and predictions.
///
/// Returns `None` when the slices are empty or differ in length.
///
/// # Examples
///
/// ```
/// use mirrorball_stats::regression::mean_absolute_error;
///
/// assert_eq!(mean_absolute_error(&[1.0, 2.0], &[2.0, 4.0]), Some(1.5));
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn mean_absolute_error(observed: &[f64], predicted: &[f64]) -> Option<f64> {
    if observed.is_empty() || observed.len() != predicted.len() {
        return None;
    }
    let sum = iter::zip(observed, predicted)
        .map(|(y, p)| (y - p).abs())
        .sum::<f64>();
    Some(sum / observed.len() as f64)
}
