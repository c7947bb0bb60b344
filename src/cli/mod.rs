//! Command-line parsing for the barbershop sales dashboard.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the aggregation/forecast code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::domain::{View, WeeklyMode};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "barber", version, about = "Barbershop sales dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Launch the interactive dashboard (default).
    Tui(TuiArgs),
    /// Print one view as a table plus an ASCII chart.
    Show(ShowArgs),
    /// Fit the forecast, print it, and optionally export rows / model.
    Forecast(ForecastCmdArgs),
    /// Write a synthetic dataset in the input schema.
    Sample(SampleArgs),
}

/// Input dataset location.
#[derive(Debug, Args, Clone)]
pub struct DataArgs {
    /// Sales CSV (columns: data, vendas, clientes, promocao).
    #[arg(short = 'd', long = "data", env = "BARBER_DATA", default_value = "dados.csv")]
    pub data: PathBuf,
}

/// Forecast model settings shared by every command that can fit.
#[derive(Debug, Args, Clone)]
pub struct ForecastArgs {
    /// Future days to predict.
    #[arg(long, default_value_t = 30)]
    pub horizon: usize,

    /// Simulated paths for the uncertainty interval (0 disables it).
    #[arg(long, default_value_t = 1000)]
    pub uncertainty_samples: usize,

    /// Coverage of the uncertainty interval, in (0, 1).
    #[arg(long, default_value_t = 0.8)]
    pub interval_width: f64,

    /// Maximum number of trend changepoints.
    #[arg(long = "changepoints", default_value_t = 25)]
    pub n_changepoints: usize,

    /// Trend flexibility (prior scale of the changepoint rate changes).
    #[arg(long, default_value_t = 0.05)]
    pub changepoint_prior_scale: f64,

    /// Prior scale of the weekly seasonal coefficients.
    #[arg(long, default_value_t = 10.0)]
    pub seasonality_prior_scale: f64,

    /// Weekly seasonality (auto: on when the history spans two weeks).
    #[arg(long, value_enum, default_value_t = WeeklyMode::Auto)]
    pub weekly: WeeklyMode,

    /// Random seed for the uncertainty simulation.
    #[arg(long, default_value_t = 0)]
    pub seed: u64,
}

#[derive(Debug, Args, Clone)]
pub struct TuiArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub forecast: ForecastArgs,

    /// Log file (the terminal is owned by the dashboard).
    #[arg(long, env = "BARBER_LOG", default_value = "barber.log")]
    pub log_file: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct ShowArgs {
    /// View to print.
    #[arg(value_enum)]
    pub view: View,

    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub forecast: ForecastArgs,

    /// Chart width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Chart height (rows), used by the forecast plot.
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Export the view's rows to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct ForecastCmdArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub forecast: ForecastArgs,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Export history + future rows to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export the fitted model parameters to JSON.
    #[arg(long = "export-model")]
    pub export_model: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct SampleArgs {
    /// Output CSV path.
    #[arg(long)]
    pub out: PathBuf,

    /// First date (YYYY-MM-DD).
    #[arg(long, default_value = "2024-01-01", value_parser = parse_start_date)]
    pub start: NaiveDate,

    /// Number of consecutive days.
    #[arg(long, default_value_t = 180)]
    pub days: usize,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Share of days running a promotion, in [0, 1].
    #[arg(long, default_value_t = 0.3)]
    pub promotion_rate: f64,

    /// Average ticket per customer.
    #[arg(long, default_value_t = 45.0)]
    pub ticket: f64,
}

fn parse_start_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|e| format!("invalid date '{s}': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn show_parses_view_and_forecast_flags() {
        let cli = Cli::parse_from([
            "barber",
            "show",
            "weekday-customers",
            "--data",
            "x.csv",
            "--weekly",
            "off",
            "--horizon",
            "10",
        ]);
        let Command::Show(args) = cli.command else {
            panic!("expected show");
        };
        assert_eq!(args.view, View::WeekdayCustomers);
        assert_eq!(args.data.data, PathBuf::from("x.csv"));
        assert_eq!(args.forecast.weekly, WeeklyMode::Off);
        assert_eq!(args.forecast.horizon, 10);
    }

    #[test]
    fn sample_parses_start_date() {
        let cli = Cli::parse_from(["barber", "sample", "--out", "s.csv", "--start", "2023-05-01"]);
        let Command::Sample(args) = cli.command else {
            panic!("expected sample");
        };
        assert_eq!(args.start, NaiveDate::from_ymd_opt(2023, 5, 1).unwrap());
        assert_eq!(args.days, 180);
    }
}
