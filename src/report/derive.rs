//! Calendar-derived columns shared by the aggregation views.

use chrono::{Datelike, NaiveDate, Weekday};

use crate::domain::{MonthBucket, PromotionLabel, SalesRecord};

/// Weekdays in display order.
pub const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// A sales record with its grouping keys attached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedRow {
    pub record: SalesRecord,
    pub month: MonthBucket,
    pub weekday: Weekday,
    pub promotion: PromotionLabel,
}

pub fn month_bucket(date: NaiveDate) -> MonthBucket {
    MonthBucket::of(date)
}

/// English weekday label.
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

pub fn weekday_short(day: Weekday) -> &'static str {
    &weekday_name(day)[..3]
}

/// Attach the derived keys to every record, preserving order.
pub fn derive_rows(records: &[SalesRecord]) -> Vec<DerivedRow> {
    records
        .iter()
        .map(|r| DerivedRow {
            record: *r,
            month: month_bucket(r.date),
            weekday: r.date.weekday(),
            promotion: PromotionLabel::from_flag(r.promotion),
        })
        .collect()
}
