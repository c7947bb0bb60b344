//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - sets up logging
//! - loads the sales table
//! - dispatches to the dashboard or a text command
//! - writes optional exports

use std::sync::Arc;

use clap::Parser;
use tracing::info;

use crate::cli::{Command, DataArgs, ForecastArgs, ForecastCmdArgs, SampleArgs, ShowArgs, TuiArgs};
use crate::domain::{DashboardConfig, ForecastConfig, SampleConfig, View};
use crate::error::AppError;

pub mod pipeline;

use pipeline::{Dashboard, ViewOutput};

/// Entry point for the `barber` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();

    // `barber` and `barber --data x.csv` behave like `barber tui ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Tui(args) => handle_tui(args),
        Command::Show(args) => handle_show(args),
        Command::Forecast(args) => handle_forecast(args),
        Command::Sample(args) => handle_sample(args),
    }
}

fn handle_tui(args: TuiArgs) -> Result<(), AppError> {
    crate::logging::init_file(&args.log_file)?;
    let config = config_from_args(&args.data, &args.forecast);
    let dashboard = open_dashboard(&config)?;
    crate::tui::run(dashboard)
}

fn handle_show(args: ShowArgs) -> Result<(), AppError> {
    crate::logging::init_stderr();
    let config = config_from_args(&args.data, &args.forecast);
    let mut dashboard = open_dashboard(&config)?;

    let output = dashboard.select(args.view)?;
    print_view(&dashboard, args.view, &output, args.width, args.height);

    if let Some(path) = &args.export {
        crate::io::export_view_csv(path, &output)?;
        info!(path = %path.display(), view = args.view.slug(), "exported view");
    }
    Ok(())
}

fn handle_forecast(args: ForecastCmdArgs) -> Result<(), AppError> {
    crate::logging::init_stderr();
    let config = config_from_args(&args.data, &args.forecast);
    let mut dashboard = open_dashboard(&config)?;

    let output = dashboard.select(View::Forecast)?;
    print_view(&dashboard, View::Forecast, &output, args.width, args.height);

    let ViewOutput::Forecast(run) = &output else {
        return Err(AppError::runtime("Forecast view produced no forecast."));
    };
    if let Some(path) = &args.export {
        crate::io::export_view_csv(path, &output)?;
        info!(path = %path.display(), rows = run.rows.len(), "exported forecast rows");
    }
    if let Some(path) = &args.export_model {
        crate::io::write_model_json(path, run, &config.forecast)?;
        info!(path = %path.display(), "exported model");
    }
    Ok(())
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    crate::logging::init_stderr();
    let config = sample_config_from_args(&args);
    let records = crate::data::generate_sales(&config)?;
    crate::io::write_sales_csv(&args.out, &records)?;
    info!(path = %args.out.display(), rows = records.len(), seed = config.seed, "wrote sample dataset");
    Ok(())
}

fn open_dashboard(config: &DashboardConfig) -> Result<Dashboard, AppError> {
    let dataset = crate::io::load_sales(&config.data_path)?;
    Ok(Dashboard::new(Arc::new(dataset), config.forecast.clone()))
}

fn print_view(dashboard: &Dashboard, view: View, output: &ViewOutput, width: usize, height: usize) {
    println!("{}", crate::report::format::format_dataset_summary(&dashboard.dataset().stats));
    println!("{}", crate::report::format::format_view(view, output));
    println!("{}", crate::plot::render_view_chart(output, width, height));
}

pub fn config_from_args(data: &DataArgs, forecast: &ForecastArgs) -> DashboardConfig {
    DashboardConfig {
        data_path: data.data.clone(),
        forecast: ForecastConfig {
            horizon: forecast.horizon,
            n_changepoints: forecast.n_changepoints,
            changepoint_prior_scale: forecast.changepoint_prior_scale,
            seasonality_prior_scale: forecast.seasonality_prior_scale,
            weekly: forecast.weekly,
            interval_width: forecast.interval_width,
            uncertainty_samples: forecast.uncertainty_samples,
            seed: forecast.seed,
            ..ForecastConfig::default()
        },
    }
}

pub fn sample_config_from_args(args: &SampleArgs) -> SampleConfig {
    SampleConfig {
        start: args.start,
        days: args.days,
        seed: args.seed,
        promotion_rate: args.promotion_rate,
        ticket: args.ticket,
    }
}

/// Rewrite argv so `barber` defaults to `barber tui`.
///
/// Rules:
/// - `barber`                         -> `barber tui`
/// - `barber --data x.csv ...`        -> `barber tui --data x.csv ...`
/// - `barber --help/--version/-h`     -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "tui" | "show" | "forecast" | "sample");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_defaults_to_tui() {
        assert_eq!(rewrite_args(argv(&["barber"])), argv(&["barber", "tui"]));
        assert_eq!(
            rewrite_args(argv(&["barber", "--data", "x.csv"])),
            argv(&["barber", "tui", "--data", "x.csv"])
        );
    }

    #[test]
    fn subcommands_and_help_are_untouched() {
        for cmd in [
            argv(&["barber", "show", "forecast"]),
            argv(&["barber", "sample", "--out", "a.csv"]),
            argv(&["barber", "--help"]),
            argv(&["barber", "-V"]),
        ] {
            assert_eq!(rewrite_args(cmd.clone()), cmd);
        }
    }

    #[test]
    fn forecast_flags_map_into_config() {
        let cli = crate::cli::Cli::parse_from(argv(&[
            "barber",
            "forecast",
            "--data",
            "d.csv",
            "--horizon",
            "14",
            "--uncertainty-samples",
            "0",
            "--changepoints",
            "5",
        ]));
        let Command::Forecast(args) = cli.command else {
            panic!("expected forecast");
        };
        let config = config_from_args(&args.data, &args.forecast);
        assert_eq!(config.data_path, std::path::PathBuf::from("d.csv"));
        assert_eq!(config.forecast.horizon, 14);
        assert_eq!(config.forecast.uncertainty_samples, 0);
        assert_eq!(config.forecast.n_changepoints, 5);
        assert_eq!(config.forecast.changepoint_range, 0.8);
        assert_eq!(config.forecast.weekly_fourier_order, 3);
    }
}
