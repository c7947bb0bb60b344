//! Forecast model definition and evaluation.
//!
//! The model is implemented as small, pure functions so the fitter and the
//! uncertainty simulation can share them.

pub mod model;

pub use model::*;
