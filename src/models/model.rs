//! Additive trend + weekly seasonality model.
//!
//! ```text
//! y(t) = g(t) + s(t)
//! g(t) = m + k·t + Σ_j δ_j · (t - s_j)₊           piecewise-linear trend
//! s(t) = Σ_n a_n sin(2πn·d/7) + b_n cos(2πn·d/7)  weekly Fourier series
//! ```
//!
//! `t` is time scaled so the training history spans `[0, 1]`; `d` is the
//! number of days since the Unix epoch, so the weekly phase is tied to the
//! calendar and not to the first training date. Values are modelled in units
//! of `y / y_scale`.
//!
//! The fitter relies on two primitive operations implemented here:
//! - fill a design row for a given time (for least squares)
//! - evaluate the fitted components at a date (for predictions and plots)

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const WEEK_PERIOD_DAYS: f64 = 7.0;

/// Fitted parameters plus the scaling needed to evaluate them at a date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastModel {
    /// Date mapped to `t = 0`.
    pub start: NaiveDate,
    /// Number of days mapped to `t = 1`.
    pub t_scale_days: f64,
    pub y_scale: f64,
    /// Base growth rate.
    pub k: f64,
    /// Offset.
    pub m: f64,
    pub changepoint_dates: Vec<NaiveDate>,
    /// Changepoint locations in scaled time.
    pub changepoints_t: Vec<f64>,
    /// Rate adjustments at each changepoint.
    pub deltas: Vec<f64>,
    /// Fourier order of the weekly term, 0 when disabled.
    pub weekly_order: usize,
    /// `[a_1, b_1, a_2, b_2, …]`.
    pub weekly_betas: Vec<f64>,
    /// Residual standard deviation in scaled units.
    pub sigma_obs: f64,
    pub n_obs: usize,
}

impl ForecastModel {
    pub fn weekly_enabled(&self) -> bool {
        self.weekly_order > 0
    }

    pub fn scaled_time(&self, date: NaiveDate) -> f64 {
        (date - self.start).num_days() as f64 / self.t_scale_days
    }

    /// Trend in scaled units.
    pub fn trend_scaled(&self, t: f64) -> f64 {
        piecewise_linear(t, self.k, self.m, &self.changepoints_t, &self.deltas)
    }

    /// Weekly effect in scaled units.
    pub fn weekly_scaled(&self, date: NaiveDate) -> f64 {
        if !self.weekly_enabled() {
            return 0.0;
        }
        let mut terms = vec![0.0; 2 * self.weekly_order];
        fourier_terms(epoch_days(date), WEEK_PERIOD_DAYS, self.weekly_order, &mut terms);
        terms.iter().zip(&self.weekly_betas).map(|(x, b)| x * b).sum()
    }

    pub fn trend(&self, date: NaiveDate) -> f64 {
        self.trend_scaled(self.scaled_time(date)) * self.y_scale
    }

    pub fn weekly(&self, date: NaiveDate) -> f64 {
        self.weekly_scaled(date) * self.y_scale
    }

    /// Point estimate at `date`.
    pub fn predict(&self, date: NaiveDate) -> f64 {
        self.trend(date) + self.weekly(date)
    }
}

/// Days since 1970-01-01.
pub fn epoch_days(date: NaiveDate) -> f64 {
    (date - NaiveDate::default()).num_days() as f64
}

/// Fill `out` (length `2 * order`) with `[sin(2π·1·d/P), cos(2π·1·d/P), …]`.
pub fn fourier_terms(days: f64, period: f64, order: usize, out: &mut [f64]) {
    let x = 2.0 * std::f64::consts::PI * days / period;
    for n in 0..order {
        let arg = (n + 1) as f64 * x;
        out[2 * n] = arg.sin();
        out[2 * n + 1] = arg.cos();
    }
}

/// `m + k·t + Σ δ_j (t - s_j)₊`.
///
/// Changepoints do not need to be sorted.
pub fn piecewise_linear(t: f64, k: f64, m: f64, changepoints: &[f64], deltas: &[f64]) -> f64 {
    let hinge: f64 = changepoints
        .iter()
        .zip(deltas)
        .map(|(s, d)| d * (t - s).max(0.0))
        .sum();
    m + k * t + hinge
}

/// Number of design columns for a model layout.
pub fn design_width(n_changepoints: usize, weekly_order: usize) -> usize {
    2 + n_changepoints + 2 * weekly_order
}

/// Fill a design row: `[1, t, (t - s_1)₊ … (t - s_S)₊, fourier…]`.
///
/// # Panics
/// Panics if `out` is shorter than `design_width(changepoints.len(), weekly_order)`.
pub fn fill_design_row(t: f64, date: NaiveDate, changepoints: &[f64], weekly_order: usize, out: &mut [f64]) {
    out[0] = 1.0;
    out[1] = t;
    for (j, s) in changepoints.iter().enumerate() {
        out[2 + j] = (t - s).max(0.0);
    }
    let offset = 2 + changepoints.len();
    fourier_terms(
        epoch_days(date),
        WEEK_PERIOD_DAYS,
        weekly_order,
        &mut out[offset..offset + 2 * weekly_order],
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn piecewise_linear_bends_at_changepoint() {
        let y0 = piecewise_linear(0.4, 1.0, 0.0, &[0.5], &[2.0]);
        let y1 = piecewise_linear(1.0, 1.0, 0.0, &[0.5], &[2.0]);
        assert!((y0 - 0.4).abs() < 1e-12);
        assert!((y1 - (1.0 + 2.0 * 0.5)).abs() < 1e-12);
    }

    #[test]
    fn fourier_terms_repeat_weekly() {
        let mut a = [0.0; 6];
        let mut b = [0.0; 6];
        fourier_terms(3.0, WEEK_PERIOD_DAYS, 3, &mut a);
        fourier_terms(10.0, WEEK_PERIOD_DAYS, 3, &mut b);
        for (x, y) in a.iter().zip(&b) {
            assert!((x - y).abs() < 1e-9);
        }
    }

    #[test]
    fn design_row_layout() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut row = vec![f64::NAN; design_width(2, 1)];
        fill_design_row(0.6, date, &[0.25, 0.75], 1, &mut row);
        assert_eq!(row[0], 1.0);
        assert_eq!(row[1], 0.6);
        assert!((row[2] - 0.35).abs() < 1e-12);
        assert_eq!(row[3], 0.0);
        assert!(row[4].is_finite() && row[5].is_finite());
    }

    #[test]
    fn epoch_is_day_zero() {
        assert_eq!(epoch_days(NaiveDate::from_ymd_opt(1970, 1, 2).unwrap()), 1.0);
    }
}
