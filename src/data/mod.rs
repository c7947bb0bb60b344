//! Data sources beyond the input CSV.

pub mod sample;

pub use sample::*;
