//! Maximum a posteriori fit of the trend + weekly model.
//!
//! With changepoint locations and Fourier order fixed, the model is linear in
//! `[m, k, δ…, a…]`. Gaussian priors on those coefficients turn the MAP
//! estimate into a ridge regression whose per-column penalty is
//! `σ² / prior_scale²`:
//!
//! - offset / slope: scale 5 (essentially free)
//! - changepoint deltas: `changepoint_prior_scale`, treated as a Laplace scale
//!   (variance `2·scale²`)
//! - Fourier coefficients: `seasonality_prior_scale`
//!
//! The noise level `σ` is taken from a changepoint-free pre-fit, so the amount
//! of trend flexibility adapts to how noisy the series is.

use chrono::NaiveDate;
use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::domain::{ForecastConfig, WeeklyMode};
use crate::error::AppError;
use crate::forecast::TrainingRow;
use crate::forecast::changepoints::changepoint_indices;
use crate::math::solve_ridge;
use crate::models::{ForecastModel, design_width, fill_design_row};

/// Prior scale of the offset and base growth rate.
const TREND_PRIOR_SCALE: f64 = 5.0;

/// Noise floor (scaled units) so that exact fits keep a non-zero prior strength.
const SIGMA_FLOOR: f64 = 0.01;

/// Minimum history span for `WeeklyMode::Auto` to model a weekly cycle.
const WEEKLY_AUTO_MIN_DAYS: i64 = 14;

/// Validate and sort a training table.
///
/// Requires at least two rows, strictly distinct dates and finite values.
pub fn prepare_history(history: &[TrainingRow]) -> Result<Vec<TrainingRow>, AppError> {
    let mut rows = history.to_vec();
    rows.sort_by_key(|r| r.ds);

    if let Some(w) = rows.windows(2).find(|w| w[0].ds == w[1].ds) {
        return Err(AppError::runtime(format!(
            "Forecast training table has duplicate date {}.",
            w[0].ds
        )));
    }
    if let Some(r) = rows.iter().find(|r| !r.y.is_finite()) {
        return Err(AppError::runtime(format!(
            "Forecast training table has a non-finite value on {}.",
            r.ds
        )));
    }
    if rows.len() < 2 {
        return Err(AppError::runtime(format!(
            "Forecast needs at least 2 distinct dates, got {}.",
            rows.len()
        )));
    }
    Ok(rows)
}

/// Resolve the weekly Fourier order for a history spanning `span_days`.
pub fn resolve_weekly_order(config: &ForecastConfig, span_days: i64) -> usize {
    match config.weekly {
        WeeklyMode::Off => 0,
        WeeklyMode::On => config.weekly_fourier_order,
        WeeklyMode::Auto if span_days >= WEEKLY_AUTO_MIN_DAYS => config.weekly_fourier_order,
        WeeklyMode::Auto => 0,
    }
}

/// Fit the model on a training table.
pub fn fit_model(history: &[TrainingRow], config: &ForecastConfig) -> Result<ForecastModel, AppError> {
    validate_config(config)?;
    let rows = prepare_history(history)?;
    let n = rows.len();

    let start = rows[0].ds;
    let span_days = (rows[n - 1].ds - start).num_days();
    let t_scale_days = span_days as f64;

    let y_scale = rows.iter().map(|r| r.y.abs()).fold(0.0, f64::max);
    let y_scale = if y_scale > 0.0 { y_scale } else { 1.0 };

    let dates: Vec<NaiveDate> = rows.iter().map(|r| r.ds).collect();
    let t: Vec<f64> = dates.iter().map(|d| (*d - start).num_days() as f64 / t_scale_days).collect();
    let y = DVector::from_iterator(n, rows.iter().map(|r| r.y / y_scale));

    let cp_idx = changepoint_indices(n, config.n_changepoints, config.changepoint_range)?;
    let changepoints_t: Vec<f64> = cp_idx.iter().map(|&i| t[i]).collect();
    let changepoint_dates: Vec<NaiveDate> = cp_idx.iter().map(|&i| dates[i]).collect();

    let weekly_order = resolve_weekly_order(config, span_days);

    // 1) Noise level from a changepoint-free fit.
    let x_pre = design_matrix(&t, &dates, &[], weekly_order);
    let pre_penalties = penalties(0, weekly_order, SIGMA_FLOOR, config);
    let beta_pre = solve_ridge(&x_pre, &y, &pre_penalties)
        .ok_or_else(|| AppError::runtime("Forecast pre-fit failed: singular design matrix."))?;
    let sigma_pre = rms(&(&y - &x_pre * &beta_pre)).max(SIGMA_FLOOR);

    // 2) Full fit with changepoints.
    let x = design_matrix(&t, &dates, &changepoints_t, weekly_order);
    let full_penalties = penalties(changepoints_t.len(), weekly_order, sigma_pre, config);
    let beta = solve_ridge(&x, &y, &full_penalties)
        .ok_or_else(|| AppError::runtime("Forecast fit failed: singular design matrix."))?;

    let sigma_obs = rms(&(&y - &x * &beta));
    if !sigma_obs.is_finite() {
        return Err(AppError::runtime("Forecast fit produced non-finite residuals."));
    }

    let s = changepoints_t.len();
    let model = ForecastModel {
        start,
        t_scale_days,
        y_scale,
        m: beta[0],
        k: beta[1],
        changepoint_dates,
        changepoints_t,
        deltas: beta.rows(2, s).iter().copied().collect(),
        weekly_order,
        weekly_betas: beta.rows(2 + s, 2 * weekly_order).iter().copied().collect(),
        sigma_obs,
        n_obs: n,
    };

    debug!(
        n,
        changepoints = s,
        weekly_order,
        sigma_pre,
        sigma_obs,
        k = model.k,
        m = model.m,
        "fitted forecast model"
    );

    Ok(model)
}

fn validate_config(config: &ForecastConfig) -> Result<(), AppError> {
    if !(config.changepoint_prior_scale.is_finite() && config.changepoint_prior_scale > 0.0) {
        return Err(AppError::input("Changepoint prior scale must be finite and > 0."));
    }
    if !(config.seasonality_prior_scale.is_finite() && config.seasonality_prior_scale > 0.0) {
        return Err(AppError::input("Seasonality prior scale must be finite and > 0."));
    }
    if config.weekly != WeeklyMode::Off && config.weekly_fourier_order == 0 {
        return Err(AppError::input("Weekly Fourier order must be >= 1."));
    }
    Ok(())
}

fn design_matrix(t: &[f64], dates: &[NaiveDate], changepoints: &[f64], weekly_order: usize) -> DMatrix<f64> {
    let p = design_width(changepoints.len(), weekly_order);
    let mut x = DMatrix::<f64>::zeros(t.len(), p);
    let mut row = vec![0.0; p];
    for (i, (ti, di)) in t.iter().zip(dates).enumerate() {
        fill_design_row(*ti, *di, changepoints, weekly_order, &mut row);
        for (j, v) in row.iter().enumerate() {
            x[(i, j)] = *v;
        }
    }
    x
}

fn penalties(n_changepoints: usize, weekly_order: usize, sigma: f64, config: &ForecastConfig) -> Vec<f64> {
    let var = sigma * sigma;
    let trend = var / (TREND_PRIOR_SCALE * TREND_PRIOR_SCALE);
    let delta = var / (2.0 * config.changepoint_prior_scale * config.changepoint_prior_scale);
    let season = var / (config.seasonality_prior_scale * config.seasonality_prior_scale);

    let mut out = Vec::with_capacity(design_width(n_changepoints, weekly_order));
    out.extend([trend, trend]);
    out.extend(std::iter::repeat_n(delta, n_changepoints));
    out.extend(std::iter::repeat_n(season, 2 * weekly_order));
    out
}

fn rms(residuals: &DVector<f64>) -> f64 {
    if residuals.is_empty() {
        return 0.0;
    }
    (residuals.norm_squared() / residuals.len() as f64).sqrt()
}
