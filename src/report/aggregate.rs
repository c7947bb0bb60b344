//! The four aggregation views.
//!
//! Each function is a pure mapping from the derived base table to a small,
//! chart-ready table. No view reads another view's output.
//!
//! Categories without any matching record (a weekday never worked, or a
//! promotion class that never occurs) are left out of the result instead of
//! being reported with an undefined value.

use std::collections::BTreeMap;

use chrono::Weekday;

use crate::domain::{MonthBucket, PromotionLabel};
use crate::math::{mean, quantile_sorted, round1, sorted};
use crate::report::derive::{DerivedRow, WEEK};

/// Total sales of one calendar month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlySales {
    pub month: MonthBucket,
    pub sales: f64,
}

/// Average customers of one month alongside the share of promotion days.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyCustomers {
    pub month: MonthBucket,
    pub mean_customers: f64,
    /// Percentage of days with a promotion, rounded to one decimal.
    pub promo_percent: f64,
    pub days: usize,
}

/// Average customers for one weekday.
#[derive(Debug, Clone, PartialEq)]
pub struct WeekdayCustomers {
    pub weekday: Weekday,
    pub mean_customers: f64,
    pub days: usize,
}

/// Five-number summary plus Tukey whiskers.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxSummary {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    /// Lowest value within `q1 - 1.5·IQR`.
    pub whisker_low: f64,
    /// Highest value within `q3 + 1.5·IQR`.
    pub whisker_high: f64,
    pub outliers: Vec<f64>,
    pub mean: f64,
}

impl BoxSummary {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let s = sorted(values);
        let q1 = quantile_sorted(&s, 0.25)?;
        let median = quantile_sorted(&s, 0.5)?;
        let q3 = quantile_sorted(&s, 0.75)?;
        let iqr = q3 - q1;
        let lo_fence = q1 - 1.5 * iqr;
        let hi_fence = q3 + 1.5 * iqr;

        let inside: Vec<f64> = s.iter().copied().filter(|v| *v >= lo_fence && *v <= hi_fence).collect();
        let outliers = s.iter().copied().filter(|v| *v < lo_fence || *v > hi_fence).collect();

        Some(Self {
            min: *s.first()?,
            q1,
            median,
            q3,
            max: *s.last()?,
            whisker_low: inside.first().copied().unwrap_or(q1),
            whisker_high: inside.last().copied().unwrap_or(q3),
            outliers,
            mean: mean(&s)?,
        })
    }
}

/// Full sales distribution of one promotion class.
#[derive(Debug, Clone, PartialEq)]
pub struct PromotionGroup {
    pub label: PromotionLabel,
    /// Daily sales in date order.
    pub sales: Vec<f64>,
    pub summary: BoxSummary,
}

/// Sum of sales per month, in chronological order.
pub fn monthly_sales(rows: &[DerivedRow]) -> Vec<MonthlySales> {
    let mut by_month: BTreeMap<MonthBucket, f64> = BTreeMap::new();
    for row in rows {
        *by_month.entry(row.month).or_insert(0.0) += row.record.sales;
    }
    by_month
        .into_iter()
        .map(|(month, sales)| MonthlySales { month, sales })
        .collect()
}

/// Mean customers and promotion share per month, in chronological order.
pub fn monthly_customers(rows: &[DerivedRow]) -> Vec<MonthlyCustomers> {
    #[derive(Default)]
    struct Acc {
        customers: f64,
        promo_days: usize,
        days: usize,
    }

    let mut by_month: BTreeMap<MonthBucket, Acc> = BTreeMap::new();
    for row in rows {
        let acc = by_month.entry(row.month).or_default();
        acc.customers += f64::from(row.record.customers);
        acc.promo_days += usize::from(row.record.promotion);
        acc.days += 1;
    }

    by_month
        .into_iter()
        .map(|(month, acc)| {
            let days = acc.days as f64;
            MonthlyCustomers {
                month,
                mean_customers: acc.customers / days,
                promo_percent: round1(acc.promo_days as f64 / days * 100.0),
                days: acc.days,
            }
        })
        .collect()
}

/// Mean customers per weekday, Monday through Sunday.
pub fn weekday_customers(rows: &[DerivedRow]) -> Vec<WeekdayCustomers> {
    let mut totals = [0.0_f64; 7];
    let mut counts = [0usize; 7];
    for row in rows {
        let idx = row.weekday.num_days_from_monday() as usize;
        totals[idx] += f64::from(row.record.customers);
        counts[idx] += 1;
    }

    WEEK.iter()
        .enumerate()
        .filter(|(idx, _)| counts[*idx] > 0)
        .map(|(idx, day)| WeekdayCustomers {
            weekday: *day,
            mean_customers: totals[idx] / counts[idx] as f64,
            days: counts[idx],
        })
        .collect()
}

/// Sales distributions with and without promotion, in that order.
pub fn promotion_split(rows: &[DerivedRow]) -> Vec<PromotionGroup> {
    PromotionLabel::ALL
        .iter()
        .filter_map(|label| {
            let sales: Vec<f64> = rows
                .iter()
                .filter(|r| r.promotion == *label)
                .map(|r| r.record.sales)
                .collect();
            let summary = BoxSummary::from_values(&sales)?;
            Some(PromotionGroup {
                label: *label,
                sales,
                summary,
            })
        })
        .collect()
}
