//! Domain types used throughout the dashboard.
//!
//! This module defines:
//!
//! - the typed sales table (`SalesRecord`, `Dataset`) and derived keys
//!   (`MonthBucket`, `PromotionLabel`)
//! - the view enumeration (`View`)
//! - configuration (`DashboardConfig`, `ForecastConfig`, `SampleConfig`)

pub mod types;

pub use types::*;
