//! Shared dashboard state used by both the text commands and the TUI.
//!
//! The workflow is a small explicit state machine:
//! load -> derive columns -> select a view -> compute that view -> render
//!
//! The front-ends only decide *which* view is selected and how its
//! `ViewOutput` is drawn (printing vs widgets).

use std::sync::Arc;

use crate::domain::{Dataset, ForecastConfig, View};
use crate::error::AppError;
use crate::forecast::{ForecastCache, ForecastRun, training_table};
use crate::report::aggregate::{
    MonthlyCustomers, MonthlySales, PromotionGroup, WeekdayCustomers, monthly_customers, monthly_sales,
    promotion_split, weekday_customers,
};
use crate::report::derive::{DerivedRow, derive_rows};

/// Computed output of the selected view.
#[derive(Debug, Clone)]
pub enum ViewOutput {
    MonthlySales(Vec<MonthlySales>),
    MonthlyCustomers(Vec<MonthlyCustomers>),
    WeekdayCustomers(Vec<WeekdayCustomers>),
    PromotionSales(Vec<PromotionGroup>),
    Forecast(Arc<ForecastRun>),
}

impl ViewOutput {
    pub fn view(&self) -> View {
        match self {
            ViewOutput::MonthlySales(_) => View::MonthlySales,
            ViewOutput::MonthlyCustomers(_) => View::MonthlyCustomers,
            ViewOutput::WeekdayCustomers(_) => View::WeekdayCustomers,
            ViewOutput::PromotionSales(_) => View::PromotionSales,
            ViewOutput::Forecast(_) => View::Forecast,
        }
    }
}

/// Dashboard session: the immutable base table, the selected view and the
/// forecast memo.
#[derive(Debug)]
pub struct Dashboard {
    dataset: Arc<Dataset>,
    rows: Vec<DerivedRow>,
    selected: View,
    forecast_config: ForecastConfig,
    cache: ForecastCache,
}

impl Dashboard {
    pub fn new(dataset: Arc<Dataset>, forecast_config: ForecastConfig) -> Self {
        let rows = derive_rows(&dataset.records);
        Self {
            dataset,
            rows,
            selected: View::MonthlySales,
            forecast_config,
            cache: ForecastCache::new(),
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn selected(&self) -> View {
        self.selected
    }

    /// Set the selected view and recompute its output.
    pub fn select(&mut self, view: View) -> Result<ViewOutput, AppError> {
        self.selected = view;
        self.compute(view)
    }

    /// Recompute `view` from the base table. Only the forecast is memoised.
    pub fn compute(&mut self, view: View) -> Result<ViewOutput, AppError> {
        let output = match view {
            View::MonthlySales => ViewOutput::MonthlySales(monthly_sales(&self.rows)),
            View::MonthlyCustomers => ViewOutput::MonthlyCustomers(monthly_customers(&self.rows)),
            View::WeekdayCustomers => ViewOutput::WeekdayCustomers(weekday_customers(&self.rows)),
            View::PromotionSales => ViewOutput::PromotionSales(promotion_split(&self.rows)),
            View::Forecast => {
                let history = training_table(&self.dataset);
                ViewOutput::Forecast(self.cache.get_or_fit(&history, &self.forecast_config)?)
            }
        };
        Ok(output)
    }

    /// True when selecting the forecast would run a new fit.
    pub fn forecast_needs_fit(&self) -> bool {
        !self.cache.is_warm()
    }

    /// Number of forecast fits performed in this session.
    pub fn forecast_fits(&self) -> usize {
        self.cache.fit_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SalesRecord;
    use chrono::{Duration, NaiveDate};

    fn dataset(days: i64) -> Arc<Dataset> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let records = (0..days)
            .map(|i| SalesRecord {
                date: start + Duration::days(i),
                sales: 100.0 + (i % 7) as f64 * 10.0,
                customers: 8 + (i % 3) as u32,
                promotion: i % 4 == 0,
            })
            .collect();
        Arc::new(Dataset::from_records(records).unwrap())
    }

    fn quick_config() -> ForecastConfig {
        ForecastConfig {
            uncertainty_samples: 20,
            ..ForecastConfig::default()
        }
    }

    #[test]
    fn select_switches_state_and_output() {
        let mut dash = Dashboard::new(dataset(60), quick_config());
        assert_eq!(dash.selected(), View::MonthlySales);

        for view in View::ALL {
            let out = dash.select(view).unwrap();
            assert_eq!(dash.selected(), view);
            assert_eq!(out.view(), view);
        }
    }

    #[test]
    fn monthly_sales_output_conserves_total() {
        let data = dataset(60);
        let total = data.stats.total_sales;
        let mut dash = Dashboard::new(data, quick_config());
        let ViewOutput::MonthlySales(rows) = dash.select(View::MonthlySales).unwrap() else {
            panic!("wrong output variant");
        };
        let sum: f64 = rows.iter().map(|r| r.sales).sum();
        assert!((sum - total).abs() < 1e-9);
    }

    #[test]
    fn reselecting_forecast_fits_once() {
        let mut dash = Dashboard::new(dataset(30), quick_config());
        assert!(dash.forecast_needs_fit());

        dash.select(View::Forecast).unwrap();
        dash.select(View::WeekdayCustomers).unwrap();
        let out = dash.select(View::Forecast).unwrap();

        assert_eq!(dash.forecast_fits(), 1);
        assert!(!dash.forecast_needs_fit());
        let ViewOutput::Forecast(run) = out else {
            panic!("wrong output variant");
        };
        assert_eq!(run.rows.len(), 30 + 30);
    }

    #[test]
    fn forecast_error_surfaces_and_is_not_cached() {
        let mut dash = Dashboard::new(dataset(1), quick_config());
        let err = dash.select(View::Forecast).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_RUNTIME);
        assert_eq!(dash.selected(), View::Forecast);
        assert_eq!(dash.forecast_fits(), 0);
    }
}
