//! Synthetic daily sales for demos and tests.
//!
//! Each day draws a customer count from a weekly footfall profile with a slow
//! upward drift, a promotion lift and Gaussian noise; sales are customers times
//! a lognormal ticket (discounted on promotion days).

use chrono::{Datelike, Duration};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{SalesRecord, SampleConfig};
use crate::error::AppError;

/// Average customers on a neutral day.
const BASE_CUSTOMERS: f64 = 12.0;

/// Footfall multiplier, Monday to Sunday.
const WEEKDAY_FACTOR: [f64; 7] = [0.6, 0.8, 0.85, 0.95, 1.2, 1.5, 0.4];

/// Relative growth per day.
const DAILY_DRIFT: f64 = 0.001;

const PROMOTION_LIFT: f64 = 1.25;
const PROMOTION_DISCOUNT: f64 = 0.9;

/// Customer count noise (absolute).
const CUSTOMER_NOISE_SD: f64 = 2.0;

/// Log-ticket noise.
const TICKET_NOISE_SD: f64 = 0.08;

/// Generate `config.days` consecutive records starting at `config.start`.
pub fn generate_sales(config: &SampleConfig) -> Result<Vec<SalesRecord>, AppError> {
    if config.days == 0 {
        return Err(AppError::input("Sample days must be > 0."));
    }
    if !(0.0..=1.0).contains(&config.promotion_rate) {
        return Err(AppError::input("Promotion rate must be within [0, 1]."));
    }
    if !(config.ticket.is_finite() && config.ticket > 0.0) {
        return Err(AppError::input("Average ticket must be finite and > 0."));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let customer_noise = Normal::new(0.0, CUSTOMER_NOISE_SD)
        .map_err(|e| AppError::runtime(format!("Noise distribution error: {e}")))?;
    let ticket_noise = Normal::new(0.0, TICKET_NOISE_SD)
        .map_err(|e| AppError::runtime(format!("Noise distribution error: {e}")))?;

    let mut records = Vec::with_capacity(config.days);
    for i in 0..config.days {
        let date = config.start + Duration::days(i as i64);
        let promotion = rng.gen_bool(config.promotion_rate);

        let weekday = WEEKDAY_FACTOR[date.weekday().num_days_from_monday() as usize];
        let drift = 1.0 + DAILY_DRIFT * i as f64;
        let lift = if promotion { PROMOTION_LIFT } else { 1.0 };
        let expected = BASE_CUSTOMERS * weekday * drift * lift;
        let customers = (expected + customer_noise.sample(&mut rng)).round().max(0.0) as u32;

        let discount = if promotion { PROMOTION_DISCOUNT } else { 1.0 };
        let ticket = config.ticket * discount * ticket_noise.sample(&mut rng).exp();
        let sales = (customers as f64 * ticket * 100.0).round() / 100.0;

        records.push(SalesRecord {
            date,
            sales,
            customers,
            promotion,
        });
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Weekday};

    fn config(days: usize, seed: u64) -> SampleConfig {
        SampleConfig {
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            days,
            seed,
            promotion_rate: 0.3,
            ticket: 45.0,
        }
    }

    #[test]
    fn same_seed_same_data() {
        let a = generate_sales(&config(60, 9)).unwrap();
        let b = generate_sales(&config(60, 9)).unwrap();
        let c = generate_sales(&config(60, 10)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn dates_are_contiguous_and_values_sane() {
        let records = generate_sales(&config(45, 1)).unwrap();
        assert_eq!(records.len(), 45);
        for pair in records.windows(2) {
            assert_eq!(pair[1].date - pair[0].date, Duration::days(1));
        }
        for r in &records {
            assert!(r.sales >= 0.0 && r.sales.is_finite());
            if r.customers == 0 {
                assert_eq!(r.sales, 0.0);
            }
        }
    }

    #[test]
    fn saturdays_outsell_sundays() {
        let records = generate_sales(&config(364, 3)).unwrap();
        let mean_on = |day: Weekday| {
            let v: Vec<f64> = records
                .iter()
                .filter(|r| r.date.weekday() == day)
                .map(|r| r.customers as f64)
                .collect();
            v.iter().sum::<f64>() / v.len() as f64
        };
        assert!(mean_on(Weekday::Sat) > 2.0 * mean_on(Weekday::Sun));
    }

    #[test]
    fn invalid_settings_are_rejected() {
        assert!(generate_sales(&config(0, 1)).is_err());
        let mut bad = config(10, 1);
        bad.promotion_rate = 1.5;
        assert!(generate_sales(&bad).is_err());
        let mut bad = config(10, 1);
        bad.ticket = 0.0;
        assert!(generate_sales(&bad).is_err());
    }
}
