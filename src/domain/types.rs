//! Shared domain types.
//!
//! - the typed sales table (`SalesRecord`, `Dataset`)
//! - the closed set of dashboard views (`View`)
//! - run configuration (`DashboardConfig`, `ForecastConfig`, `SampleConfig`)

use std::fmt;
use std::path::PathBuf;

use chrono::{Datelike, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// One business day of the shop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SalesRecord {
    pub date: NaiveDate,
    /// Revenue for the day (currency units).
    pub sales: f64,
    pub customers: u32,
    pub promotion: bool,
}

/// Summary of the loaded table.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetStats {
    pub n_rows: usize,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub total_sales: f64,
}

/// The validated, date-sorted sales table. Read-only once loaded.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub records: Vec<SalesRecord>,
    pub stats: DatasetStats,
}

impl Dataset {
    /// Build a dataset from records, sorting them by date.
    ///
    /// Returns `None` for an empty table. Callers are expected to have rejected
    /// duplicate dates already.
    pub fn from_records(mut records: Vec<SalesRecord>) -> Option<Self> {
        records.sort_by_key(|r| r.date);
        let first = records.first()?.date;
        let last = records.last()?.date;
        let stats = DatasetStats {
            n_rows: records.len(),
            first_date: first,
            last_date: last,
            total_sales: records.iter().map(|r| r.sales).sum(),
        };
        Some(Self { records, stats })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Calendar year-month used as a grouping key.
///
/// Ordering is chronological, which matches the lexicographic order of the
/// `YYYY-MM` rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthBucket {
    pub year: i32,
    pub month: u32,
}

impl MonthBucket {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for MonthBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Category label derived from the promotion flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromotionLabel {
    WithPromotion,
    WithoutPromotion,
}

impl PromotionLabel {
    /// Display order of the two categories.
    pub const ALL: [PromotionLabel; 2] = [PromotionLabel::WithPromotion, PromotionLabel::WithoutPromotion];

    pub fn from_flag(promotion: bool) -> Self {
        if promotion {
            PromotionLabel::WithPromotion
        } else {
            PromotionLabel::WithoutPromotion
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            PromotionLabel::WithPromotion => "with promotion",
            PromotionLabel::WithoutPromotion => "without promotion",
        }
    }
}

/// The five dashboard views, in menu order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum View {
    MonthlySales,
    MonthlyCustomers,
    WeekdayCustomers,
    PromotionSales,
    Forecast,
}

impl View {
    pub const ALL: [View; 5] = [
        View::MonthlySales,
        View::MonthlyCustomers,
        View::WeekdayCustomers,
        View::PromotionSales,
        View::Forecast,
    ];

    /// Label shown in the view selector.
    pub fn menu_label(self) -> &'static str {
        match self {
            View::MonthlySales => "Sales by Month",
            View::MonthlyCustomers => "Avg Customers by Month (% Promotion)",
            View::WeekdayCustomers => "Customers by Weekday",
            View::PromotionSales => "Sales: With vs Without Promotion",
            View::Forecast => "Sales Forecast",
        }
    }

    /// Chart title.
    pub fn title(self) -> &'static str {
        match self {
            View::MonthlySales => "Total Sales by Month",
            View::MonthlyCustomers => "Average Customers by Month (colour = % promotion days)",
            View::WeekdayCustomers => "Average Customers by Weekday",
            View::PromotionSales => "Sales Distribution - With vs Without Promotion",
            View::Forecast => "Sales Forecast",
        }
    }

    /// Short caption placed under the chart.
    pub fn caption(self) -> &'static str {
        match self {
            View::MonthlySales => "x: month | y: sales",
            View::MonthlyCustomers => "x: month | y: customers | colour: % promotion",
            View::WeekdayCustomers => "x: weekday | y: customers",
            View::PromotionSales => "box: quartiles | whiskers: 1.5 IQR | dots: outliers",
            View::Forecast => "white: actual | cyan: forecast | blue: uncertainty interval",
        }
    }

    /// Stable identifier used in file names and on the command line.
    pub fn slug(self) -> &'static str {
        match self {
            View::MonthlySales => "monthly-sales",
            View::MonthlyCustomers => "monthly-customers",
            View::WeekdayCustomers => "weekday-customers",
            View::PromotionSales => "promotion-sales",
            View::Forecast => "forecast",
        }
    }

    pub fn index(self) -> usize {
        View::ALL.iter().position(|v| *v == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        View::ALL[(self.index() + 1) % View::ALL.len()]
    }

    pub fn prev(self) -> Self {
        View::ALL[(self.index() + View::ALL.len() - 1) % View::ALL.len()]
    }
}

/// Whether the forecast models a weekly cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum WeeklyMode {
    /// Enabled when the history spans at least two weeks.
    Auto,
    On,
    Off,
}

/// Forecast model and prediction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Number of future days appended after the last observed date.
    pub horizon: usize,
    /// Upper bound on the number of trend changepoints.
    pub n_changepoints: usize,
    /// Share of the history (from the start) eligible for changepoints.
    pub changepoint_range: f64,
    pub changepoint_prior_scale: f64,
    pub seasonality_prior_scale: f64,
    pub weekly: WeeklyMode,
    pub weekly_fourier_order: usize,
    /// Probability mass covered by `[yhat_lower, yhat_upper]`.
    pub interval_width: f64,
    /// Simulated paths used for the interval (0 disables it).
    pub uncertainty_samples: usize,
    pub seed: u64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon: 30,
            n_changepoints: 25,
            changepoint_range: 0.8,
            changepoint_prior_scale: 0.05,
            seasonality_prior_scale: 10.0,
            weekly: WeeklyMode::Auto,
            weekly_fourier_order: 3,
            interval_width: 0.8,
            uncertainty_samples: 1000,
            seed: 0,
        }
    }
}

/// Everything the dashboard needs to start.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub data_path: PathBuf,
    pub forecast: ForecastConfig,
}

/// Settings for the synthetic dataset generator.
#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub start: NaiveDate,
    pub days: usize,
    pub seed: u64,
    /// Probability that a given day runs a promotion.
    pub promotion_rate: f64,
    /// Average ticket per customer (currency units).
    pub ticket: f64,
}
