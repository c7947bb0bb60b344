//! Predictions over history + future, with uncertainty intervals.
//!
//! Interval construction simulates `uncertainty_samples` plausible futures:
//!
//! - beyond the history (`t > 1`) new changepoints arrive as a Poisson process
//!   with the same density as the fitted ones, each with a Laplace-distributed
//!   rate change whose scale is the mean absolute fitted delta;
//! - observation noise is Gaussian with the fitted `sigma_obs`.
//!
//! Bounds are the `(1 ± interval_width) / 2` quantiles of the simulated values.
//! Every path has its own `StdRng` seeded with `seed + path index`, so results
//! are reproducible regardless of how rayon schedules the work.

use chrono::{Days, NaiveDate};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::{Exp, Normal, Poisson};
use rayon::prelude::*;
use serde::Serialize;

use crate::domain::ForecastConfig;
use crate::error::AppError;
use crate::math::{quantile_sorted, sorted};
use crate::models::{ForecastModel, piecewise_linear};

/// One predicted day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub ds: NaiveDate,
    /// Observed value, for history rows.
    pub actual: Option<f64>,
    pub yhat: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
    pub trend: f64,
    pub trend_lower: f64,
    pub trend_upper: f64,
    pub weekly: f64,
}

/// `horizon` consecutive days following `last`.
///
/// Fails when the last future day falls outside the supported calendar.
pub fn future_dates(last: NaiveDate, horizon: usize) -> Result<Vec<NaiveDate>, AppError> {
    let out_of_range = || AppError::input(format!("Forecast horizon of {horizon} days from {last} is out of the date range."));
    let horizon_days = u64::try_from(horizon).map_err(|_| out_of_range())?;
    last.checked_add_days(Days::new(horizon_days)).ok_or_else(out_of_range)?;

    Ok((1..=horizon_days).filter_map(|i| last.checked_add_days(Days::new(i))).collect())
}

/// Predict every date in `dates`.
pub fn predict(model: &ForecastModel, dates: &[NaiveDate], config: &ForecastConfig) -> Result<Vec<ForecastPoint>, AppError> {
    if !(config.interval_width.is_finite() && config.interval_width > 0.0 && config.interval_width < 1.0) {
        return Err(AppError::input(format!(
            "Invalid interval width {} (must be in (0, 1)).",
            config.interval_width
        )));
    }

    let t: Vec<f64> = dates.iter().map(|d| model.scaled_time(*d)).collect();
    let seasonal: Vec<f64> = dates.iter().map(|d| model.weekly_scaled(*d)).collect();

    let mut points: Vec<ForecastPoint> = dates
        .iter()
        .zip(&t)
        .zip(&seasonal)
        .map(|((ds, ti), si)| {
            let trend = model.trend_scaled(*ti) * model.y_scale;
            let weekly = si * model.y_scale;
            let yhat = trend + weekly;
            ForecastPoint {
                ds: *ds,
                actual: None,
                yhat,
                yhat_lower: yhat,
                yhat_upper: yhat,
                trend,
                trend_lower: trend,
                trend_upper: trend,
                weekly,
            }
        })
        .collect();

    if config.uncertainty_samples == 0 || points.is_empty() {
        return Ok(points);
    }

    let paths: Vec<SamplePath> = (0..config.uncertainty_samples)
        .into_par_iter()
        .map(|i| sample_path(model, &t, &seasonal, config.seed.wrapping_add(i as u64)))
        .collect::<Result<_, _>>()?;

    let lower_q = (1.0 - config.interval_width) / 2.0;
    let upper_q = (1.0 + config.interval_width) / 2.0;

    for (row, point) in points.iter_mut().enumerate() {
        let yhat_col = sorted(&paths.iter().map(|p| p.yhat[row]).collect::<Vec<_>>());
        let trend_col = sorted(&paths.iter().map(|p| p.trend[row]).collect::<Vec<_>>());

        point.yhat_lower = quantile_sorted(&yhat_col, lower_q).unwrap_or(point.yhat);
        point.yhat_upper = quantile_sorted(&yhat_col, upper_q).unwrap_or(point.yhat);
        point.trend_lower = quantile_sorted(&trend_col, lower_q).unwrap_or(point.trend);
        point.trend_upper = quantile_sorted(&trend_col, upper_q).unwrap_or(point.trend);
    }

    Ok(points)
}

struct SamplePath {
    yhat: Vec<f64>,
    trend: Vec<f64>,
}

fn sample_path(model: &ForecastModel, t: &[f64], seasonal: &[f64], seed: u64) -> Result<SamplePath, AppError> {
    let mut rng = StdRng::seed_from_u64(seed);

    let (changepoints, deltas) = sample_future_changepoints(model, t, &mut rng)?;
    let noise = Normal::new(0.0, model.sigma_obs)
        .map_err(|e| AppError::runtime(format!("Noise distribution error: {e}")))?;

    let mut yhat = Vec::with_capacity(t.len());
    let mut trend = Vec::with_capacity(t.len());
    for (ti, si) in t.iter().zip(seasonal) {
        let g = piecewise_linear(*ti, model.k, model.m, &changepoints, &deltas);
        let eps = noise.sample(&mut rng);
        trend.push(g * model.y_scale);
        yhat.push((g + si + eps) * model.y_scale);
    }

    Ok(SamplePath { yhat, trend })
}

/// Fitted changepoints plus randomly drawn ones beyond the history.
fn sample_future_changepoints(
    model: &ForecastModel,
    t: &[f64],
    rng: &mut StdRng,
) -> Result<(Vec<f64>, Vec<f64>), AppError> {
    let mut changepoints = model.changepoints_t.clone();
    let mut deltas = model.deltas.clone();

    let t_max = t.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let s = model.changepoints_t.len() as f64;
    if !(t_max > 1.0) || s == 0.0 {
        return Ok((changepoints, deltas));
    }

    let rate = s * (t_max - 1.0);
    let n_new = Poisson::new(rate)
        .map_err(|e| AppError::runtime(format!("Changepoint distribution error: {e}")))?
        .sample(rng) as usize;
    if n_new == 0 {
        return Ok((changepoints, deltas));
    }

    let scale = model.deltas.iter().map(|d| d.abs()).sum::<f64>() / s + 1e-8;
    let magnitude =
        Exp::new(1.0 / scale).map_err(|e| AppError::runtime(format!("Changepoint distribution error: {e}")))?;

    for _ in 0..n_new {
        changepoints.push(1.0 + rng.r#gen::<f64>() * (t_max - 1.0));
        let sign = if rng.r#gen::<bool>() { 1.0 } else { -1.0 };
        deltas.push(sign * magnitude.sample(rng));
    }

    Ok((changepoints, deltas))
}
