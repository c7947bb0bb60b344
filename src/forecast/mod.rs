//! Sales forecast: fit a trend + weekly model on `{ds, y}` and predict the
//! history plus a fixed horizon of future days.
//!
//! Responsibilities:
//!
//! - reshape the sales table into the training contract (`training_table`)
//! - place changepoints and fit the model (`changepoints`, `fitter`)
//! - predict with uncertainty intervals (`predict`)
//! - memoise runs by content (`cache`)

use chrono::{Duration, NaiveDate, Weekday};
use serde::Serialize;

use crate::domain::{Dataset, ForecastConfig};
use crate::error::AppError;
use crate::models::ForecastModel;
use crate::report::derive::WEEK;

pub mod cache;
pub mod changepoints;
pub mod fitter;
pub mod predict;

pub use cache::*;
pub use fitter::{fit_model, prepare_history};
pub use predict::{ForecastPoint, future_dates};

/// One training observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrainingRow {
    pub ds: NaiveDate,
    pub y: f64,
}

/// Everything the forecast view renders.
#[derive(Debug, Clone)]
pub struct ForecastRun {
    pub model: ForecastModel,
    /// History rows followed by `horizon` future rows.
    pub rows: Vec<ForecastPoint>,
    pub history_len: usize,
    pub horizon: usize,
    /// Weekly effect Monday→Sunday; empty when weekly seasonality is off.
    pub weekly_profile: Vec<(Weekday, f64)>,
}

impl ForecastRun {
    pub fn history(&self) -> &[ForecastPoint] {
        &self.rows[..self.history_len]
    }

    pub fn future(&self) -> &[ForecastPoint] {
        &self.rows[self.history_len..]
    }
}

/// `{date, sales}` renamed to `{ds, y}`.
pub fn training_table(dataset: &Dataset) -> Vec<TrainingRow> {
    dataset
        .records
        .iter()
        .map(|r| TrainingRow { ds: r.date, y: r.sales })
        .collect()
}

/// Fit the model and predict history + `config.horizon` future days.
pub fn fit_and_forecast(history: &[TrainingRow], config: &ForecastConfig) -> Result<ForecastRun, AppError> {
    let rows = prepare_history(history)?;
    let last = rows[rows.len() - 1].ds;
    let future = future_dates(last, config.horizon)?;
    let model = fit_model(&rows, config)?;

    let mut dates: Vec<NaiveDate> = rows.iter().map(|r| r.ds).collect();
    dates.extend(future);

    let mut points = predict::predict(&model, &dates, config)?;
    for (point, row) in points.iter_mut().zip(&rows) {
        point.actual = Some(row.y);
    }

    let weekly_profile = weekly_profile(&model);

    Ok(ForecastRun {
        model,
        rows: points,
        history_len: rows.len(),
        horizon: config.horizon,
        weekly_profile,
    })
}

/// Weekly effect for each weekday, evaluated on a reference week.
pub fn weekly_profile(model: &ForecastModel) -> Vec<(Weekday, f64)> {
    if !model.weekly_enabled() {
        return Vec::new();
    }
    // 2017-01-02 is a Monday.
    let monday = NaiveDate::default() + Duration::days(17_168);
    WEEK.iter()
        .enumerate()
        .map(|(i, day)| (*day, model.weekly(monday + Duration::days(i as i64))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SalesRecord;
    use chrono::Datelike;

    const FIXTURE_SALES: [f64; 10] = [100.0, 120.0, 90.0, 110.0, 130.0, 95.0, 105.0, 115.0, 125.0, 108.0];

    fn fixture() -> Dataset {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let records = FIXTURE_SALES
            .iter()
            .enumerate()
            .map(|(i, &sales)| SalesRecord {
                date: start + Duration::days(i as i64),
                sales,
                customers: 10,
                promotion: i % 2 == 0,
            })
            .collect();
        Dataset::from_records(records).unwrap()
    }

    #[test]
    fn training_table_renames_columns() {
        let table = training_table(&fixture());
        assert_eq!(table.len(), 10);
        assert_eq!(table[1].y, 120.0);
        assert_eq!(table[1].ds, NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
    }

    #[test]
    fn forecast_adds_exactly_horizon_rows() {
        let config = ForecastConfig {
            uncertainty_samples: 100,
            ..ForecastConfig::default()
        };
        let run = fit_and_forecast(&training_table(&fixture()), &config).unwrap();
        assert_eq!(run.rows.len(), 10 + 30);
        assert_eq!(run.history().len(), 10);
        assert_eq!(run.future().len(), 30);
        assert!(run.history().iter().all(|p| p.actual.is_some()));
        assert!(run.future().iter().all(|p| p.actual.is_none()));
        assert_eq!(
            run.future()[0].ds,
            NaiveDate::from_ymd_opt(2024, 3, 11).unwrap()
        );
        for p in &run.rows {
            assert!(p.yhat.is_finite());
            assert!(p.yhat_lower <= p.yhat_upper);
        }
        // Ten days is too short to identify a weekly cycle.
        assert!(run.weekly_profile.is_empty());
    }

    #[test]
    fn oversized_horizon_is_rejected_before_fitting() {
        let config = ForecastConfig {
            horizon: 100_000_000,
            uncertainty_samples: 0,
            ..ForecastConfig::default()
        };
        let err = fit_and_forecast(&training_table(&fixture()), &config).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_INPUT);
    }

    #[test]
    fn weekly_profile_starts_on_monday() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let history: Vec<TrainingRow> = (0..35)
            .map(|i| TrainingRow {
                ds: start + Duration::days(i),
                y: if i % 7 == 5 { 180.0 } else { 100.0 },
            })
            .collect();
        let config = ForecastConfig {
            uncertainty_samples: 0,
            ..ForecastConfig::default()
        };
        let run = fit_and_forecast(&history, &config).unwrap();
        assert_eq!(run.weekly_profile.len(), 7);
        assert_eq!(run.weekly_profile[0].0, Weekday::Mon);
        let (best_day, _) = run
            .weekly_profile
            .iter()
            .copied()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .unwrap();
        // Index 5 from a Monday start is Saturday.
        assert_eq!(best_day, Weekday::Sat);
    }

    #[test]
    fn reference_monday_is_a_monday() {
        let monday = NaiveDate::default() + Duration::days(17_168);
        assert_eq!(monday, NaiveDate::from_ymd_opt(2017, 1, 2).unwrap());
        assert_eq!(monday.weekday(), Weekday::Mon);
    }
}
