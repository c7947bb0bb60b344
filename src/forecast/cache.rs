//! Content-addressed memo for the forecast fit.
//!
//! The key is a BLAKE3 digest of the training table together with the
//! forecast configuration, so an unchanged dataset re-selected in the same
//! session reuses the previous run while any edit to the data or settings
//! triggers a refit. The cache holds a single slot; a new key replaces it.
//! Failed fits are never stored.

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::ForecastConfig;
use crate::error::AppError;
use crate::forecast::{ForecastRun, TrainingRow, fit_and_forecast};

#[derive(Debug, Default)]
pub struct ForecastCache {
    slot: Option<(blake3::Hash, Arc<ForecastRun>)>,
    fits: usize,
}

impl ForecastCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached run for `history` + `config`, fitting on a miss.
    pub fn get_or_fit(&mut self, history: &[TrainingRow], config: &ForecastConfig) -> Result<Arc<ForecastRun>, AppError> {
        let key = training_key(history, config)?;

        if let Some((cached, run)) = &self.slot {
            if *cached == key {
                debug!(key = %key.to_hex(), "forecast cache hit");
                return Ok(Arc::clone(run));
            }
        }

        info!(rows = history.len(), horizon = config.horizon, "fitting forecast model");
        let run = Arc::new(fit_and_forecast(history, config)?);
        self.fits += 1;
        self.slot = Some((key, Arc::clone(&run)));
        Ok(run)
    }

    /// Number of fits performed so far.
    pub fn fit_count(&self) -> usize {
        self.fits
    }

    pub fn is_warm(&self) -> bool {
        self.slot.is_some()
    }
}

/// Digest of the training table and the settings that shape the output.
pub fn training_key(history: &[TrainingRow], config: &ForecastConfig) -> Result<blake3::Hash, AppError> {
    let mut hasher = blake3::Hasher::new();

    hasher.update(&(history.len() as u64).to_le_bytes());
    for row in history {
        hasher.update(row.ds.format("%Y-%m-%d").to_string().as_bytes());
        hasher.update(&row.y.to_bits().to_le_bytes());
    }

    let settings = serde_json::to_vec(config)
        .map_err(|e| AppError::runtime(format!("Failed to encode forecast settings: {e}")))?;
    hasher.update(&settings);

    Ok(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn history(n: usize, bump: f64) -> Vec<TrainingRow> {
        let start = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        (0..n)
            .map(|i| TrainingRow {
                ds: start + Duration::days(i as i64),
                y: 100.0 + (i % 5) as f64 * 3.0 + bump,
            })
            .collect()
    }

    fn quick_config() -> ForecastConfig {
        ForecastConfig {
            uncertainty_samples: 20,
            ..ForecastConfig::default()
        }
    }

    #[test]
    fn identical_input_fits_once() {
        let mut cache = ForecastCache::new();
        let h = history(40, 0.0);
        let config = quick_config();

        let a = cache.get_or_fit(&h, &config).unwrap();
        let b = cache.get_or_fit(&h, &config).unwrap();
        assert_eq!(cache.fit_count(), 1);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn changed_data_or_settings_refit() {
        let mut cache = ForecastCache::new();
        let config = quick_config();

        cache.get_or_fit(&history(40, 0.0), &config).unwrap();
        cache.get_or_fit(&history(40, 1.0), &config).unwrap();
        assert_eq!(cache.fit_count(), 2);

        let wider = ForecastConfig {
            horizon: 45,
            ..config.clone()
        };
        let run = cache.get_or_fit(&history(40, 1.0), &wider).unwrap();
        assert_eq!(cache.fit_count(), 3);
        assert_eq!(run.rows.len(), 85);
    }

    #[test]
    fn failures_are_not_cached() {
        let mut cache = ForecastCache::new();
        let config = quick_config();
        assert!(cache.get_or_fit(&history(1, 0.0), &config).is_err());
        assert_eq!(cache.fit_count(), 0);
        assert!(!cache.is_warm());
    }

    #[test]
    fn key_depends_on_values() {
        let config = quick_config();
        let a = training_key(&history(10, 0.0), &config).unwrap();
        let b = training_key(&history(10, 0.5), &config).unwrap();
        let c = training_key(&history(10, 0.0), &config).unwrap();
        assert_ne!(a, b);
        assert_eq!(a, c);
    }
}
