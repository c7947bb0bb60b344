//! Exports: view tables and forecast rows to CSV, model parameters to JSON,
//! and sales records back to the input schema.
//!
//! The exports are meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::app::pipeline::ViewOutput;
use crate::domain::{ForecastConfig, SalesRecord};
use crate::error::AppError;
use crate::forecast::ForecastRun;
use crate::io::ingest::{COL_CUSTOMERS, COL_DATE, COL_PROMOTION, COL_SALES};
use crate::models::ForecastModel;
use crate::report::derive::weekday_name;

/// Write the rows behind a view to a CSV file.
pub fn export_view_csv(path: &Path, output: &ViewOutput) -> Result<(), AppError> {
    let file = create(path, "export CSV")?;
    write_view_csv(file, output)
}

/// Write the rows behind a view as CSV.
pub fn write_view_csv<W: Write>(writer: W, output: &ViewOutput) -> Result<(), AppError> {
    let mut w = csv::Writer::from_writer(writer);

    match output {
        ViewOutput::MonthlySales(rows) => {
            w.write_record(["month", "sales"]).map_err(write_err)?;
            for r in rows {
                w.write_record([r.month.to_string(), format!("{:.2}", r.sales)])
                    .map_err(write_err)?;
            }
        }
        ViewOutput::MonthlyCustomers(rows) => {
            w.write_record(["month", "mean_customers", "promo_percent", "days"])
                .map_err(write_err)?;
            for r in rows {
                w.write_record([
                    r.month.to_string(),
                    format!("{:.4}", r.mean_customers),
                    format!("{:.1}", r.promo_percent),
                    r.days.to_string(),
                ])
                .map_err(write_err)?;
            }
        }
        ViewOutput::WeekdayCustomers(rows) => {
            w.write_record(["weekday", "mean_customers", "days"]).map_err(write_err)?;
            for r in rows {
                w.write_record([
                    weekday_name(r.weekday).to_string(),
                    format!("{:.4}", r.mean_customers),
                    r.days.to_string(),
                ])
                .map_err(write_err)?;
            }
        }
        ViewOutput::PromotionSales(groups) => {
            w.write_record(["group", "sales"]).map_err(write_err)?;
            for g in groups {
                for s in &g.sales {
                    w.write_record([g.label.display_name().to_string(), format!("{s:.2}")])
                        .map_err(write_err)?;
                }
            }
        }
        ViewOutput::Forecast(run) => {
            for p in &run.rows {
                w.serialize(p).map_err(write_err)?;
            }
        }
    }

    w.flush()
        .map_err(|e| AppError::runtime(format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}

/// Portable representation of a fitted forecast.
#[derive(Debug, Serialize)]
struct ModelFile<'a> {
    tool: &'static str,
    config: &'a ForecastConfig,
    model: &'a ForecastModel,
    weekly_profile: Vec<WeeklyEffect>,
}

#[derive(Debug, Serialize)]
struct WeeklyEffect {
    weekday: &'static str,
    effect: f64,
}

/// Write the fitted model parameters and settings to a JSON file.
pub fn write_model_json(path: &Path, run: &ForecastRun, config: &ForecastConfig) -> Result<(), AppError> {
    let file = create(path, "model JSON")?;
    serde_json::to_writer_pretty(file, &model_file(run, config))
        .map_err(|e| AppError::runtime(format!("Failed to write model JSON: {e}")))
}

fn model_file<'a>(run: &'a ForecastRun, config: &'a ForecastConfig) -> ModelFile<'a> {
    ModelFile {
        tool: "barber",
        config,
        model: &run.model,
        weekly_profile: run
            .weekly_profile
            .iter()
            .map(|(day, effect)| WeeklyEffect {
                weekday: weekday_name(*day),
                effect: *effect,
            })
            .collect(),
    }
}

/// Write records in the input schema (`data,vendas,clientes,promocao`).
pub fn write_sales_csv(path: &Path, records: &[SalesRecord]) -> Result<(), AppError> {
    let file = create(path, "sales CSV")?;
    write_sales(file, records)
}

pub fn write_sales<W: Write>(writer: W, records: &[SalesRecord]) -> Result<(), AppError> {
    let mut w = csv::Writer::from_writer(writer);
    w.write_record([COL_DATE, COL_SALES, COL_CUSTOMERS, COL_PROMOTION])
        .map_err(write_err)?;
    for r in records {
        w.write_record([
            r.date.format("%Y-%m-%d").to_string(),
            format!("{:.2}", r.sales),
            r.customers.to_string(),
            if r.promotion { "1" } else { "0" }.to_string(),
        ])
        .map_err(write_err)?;
    }
    w.flush()
        .map_err(|e| AppError::runtime(format!("Failed to flush sales CSV: {e}")))?;
    Ok(())
}

fn create(path: &Path, what: &str) -> Result<File, AppError> {
    File::create(path).map_err(|e| AppError::runtime(format!("Failed to create {what} '{}': {e}", path.display())))
}

fn write_err(e: csv::Error) -> AppError {
    AppError::runtime(format!("Failed to write CSV row: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Dataset, MonthBucket};
    use crate::io::ingest::read_sales;
    use crate::report::aggregate::MonthlySales;
    use chrono::NaiveDate;

    #[test]
    fn monthly_sales_csv_has_header_and_rows() {
        let out = ViewOutput::MonthlySales(vec![MonthlySales {
            month: MonthBucket { year: 2024, month: 3 },
            sales: 1500.0,
        }]);
        let mut buf = Vec::new();
        write_view_csv(&mut buf, &out).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "month,sales\n2024-03,1500.00\n");
    }

    #[test]
    fn sales_csv_reads_back_through_ingest() {
        let d = |day| NaiveDate::from_ymd_opt(2024, 5, day).unwrap();
        let records = vec![
            SalesRecord {
                date: d(1),
                sales: 320.5,
                customers: 9,
                promotion: true,
            },
            SalesRecord {
                date: d(2),
                sales: 210.0,
                customers: 6,
                promotion: false,
            },
        ];
        let mut buf = Vec::new();
        write_sales(&mut buf, &records).unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("data,vendas,clientes,promocao\n"));

        let back: Dataset = read_sales(text.as_bytes()).unwrap();
        assert_eq!(back.records, records);
    }

    #[test]
    fn forecast_csv_leaves_future_actuals_empty() {
        use crate::forecast::{fit_and_forecast, training_table};

        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let records = (0..20)
            .map(|i| SalesRecord {
                date: start + chrono::Duration::days(i),
                sales: 100.0 + i as f64,
                customers: 5,
                promotion: false,
            })
            .collect();
        let data = Dataset::from_records(records).unwrap();
        let config = ForecastConfig {
            horizon: 3,
            uncertainty_samples: 0,
            ..ForecastConfig::default()
        };
        let run = fit_and_forecast(&training_table(&data), &config).unwrap();

        let mut buf = Vec::new();
        write_view_csv(&mut buf, &ViewOutput::Forecast(std::sync::Arc::new(run.clone()))).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 1 + 23);
        assert!(lines[0].starts_with("ds,actual,yhat,yhat_lower,yhat_upper"));
        assert!(lines[23].starts_with("2024-01-23,,"));

        let json = serde_json::to_value(model_file(&run, &config)).unwrap();
        assert_eq!(json["tool"], "barber");
        assert_eq!(json["config"]["horizon"], 3);
        assert_eq!(json["weekly_profile"].as_array().unwrap().len(), 7);
    }
}
