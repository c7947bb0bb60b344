//! Reporting: derived columns, per-view aggregations and text formatting.

pub mod aggregate;
pub mod derive;
pub mod format;

pub use aggregate::{
    BoxSummary, MonthlyCustomers, MonthlySales, PromotionGroup, WeekdayCustomers, monthly_customers,
    monthly_sales, promotion_split, weekday_customers,
};
pub use derive::{DerivedRow, derive_rows};
