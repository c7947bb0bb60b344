//! `barber-dash` library crate.
//!
//! The binary (`barber`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the dashboard and the text commands share one pipeline
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod forecast;
pub mod io;
pub mod logging;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
pub mod tui;
