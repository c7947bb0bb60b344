//! Changepoint placement.
//!
//! Candidate trend changepoints sit on evenly spaced history rows within the
//! first `changepoint_range` share of the history. The first row is never a
//! changepoint. The fitter then decides how much each one bends the trend; most
//! end up near zero under the prior.

use crate::error::AppError;

/// Generate `steps` evenly spaced points between `min` and `max` (inclusive).
pub fn lin_space(min: f64, max: f64, steps: usize) -> Vec<f64> {
    match steps {
        0 => Vec::new(),
        1 => vec![min],
        _ => {
            let step = (max - min) / (steps as f64 - 1.0);
            (0..steps).map(|i| min + step * i as f64).collect()
        }
    }
}

/// Row indices of the changepoints for a history of `n_rows` rows.
///
/// At most `min(n_changepoints, floor(n_rows · range) - 1)` indices are
/// returned, strictly increasing and all `>= 1`.
pub fn changepoint_indices(n_rows: usize, n_changepoints: usize, range: f64) -> Result<Vec<usize>, AppError> {
    if !(range.is_finite() && range > 0.0 && range <= 1.0) {
        return Err(AppError::input(format!(
            "Invalid changepoint range {range} (must be in (0, 1])."
        )));
    }

    let hist_size = (n_rows as f64 * range).floor() as usize;
    let n_cp = n_changepoints.min(hist_size.saturating_sub(1));
    if n_cp == 0 {
        return Ok(Vec::new());
    }

    // Spacing is at least one row, so rounding never yields duplicates.
    let grid = lin_space(0.0, (hist_size - 1) as f64, n_cp + 1);
    Ok(grid.into_iter().skip(1).map(|x| x.round() as usize).collect())
}
