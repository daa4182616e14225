//! Forward variances between reset dates from a term structure of spot vols.
//!
//! Cumulative variance `σ_i² t_i` is kept only where it strictly increases
//! over the last kept value, read back onto every reset by linear
//! interpolation and differenced. The result is one non-negative variance
//! rate per interval, the first being `σ_0²` over `[0, t_0]`.

use crate::core::PricingError;
use crate::math::linear_interpolate;

/// Bootstraps per-interval variance rates for resets at `times` with spot
/// vols `vols`.
///
/// # Errors
/// [`PricingError::InvalidInput`] when the arrays differ in length, are empty,
/// or `times` decreases.
pub fn forward_variances(times: &[f64], vols: &[f64]) -> Result<Vec<f64>, PricingError> {
    if times.is_empty() || times.len() != vols.len() {
        return Err(PricingError::input(format!(
            "forward variance needs matching non-empty times ({}) and vols ({})",
            times.len(),
            vols.len()
        )));
    }
    if times.windows(2).any(|w| w[1] < w[0]) {
        return Err(PricingError::input("reset times must be non-decreasing"));
    }

    let mut kept_times = vec![times[0]];
    let mut kept_variance = vec![vols[0] * vols[0] * times[0]];
    for (&t, &vol) in times.iter().zip(vols).skip(1) {
        let total = vol * vol * t;
        if kept_variance.last().is_some_and(|&last| total > last) {
            kept_times.push(t);
            kept_variance.push(total);
        }
    }

    let total_variance = times
        .iter()
        .map(|&t| linear_interpolate(&kept_times, &kept_variance, t))
        .collect::<Result<Vec<_>, _>>()?;

    let mut forward = Vec::with_capacity(times.len());
    forward.push(vols[0] * vols[0]);
    for i in 1..times.len() {
        let dt = times[i] - times[i - 1];
        forward.push(if dt > 0.0 {
            ((total_variance[i] - total_variance[i - 1]) / dt).max(0.0)
        } else {
            0.0
        });
    }
    Ok(forward)
}
