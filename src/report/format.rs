//! Formatted terminal output: dataset summary and one text table per view.
//!
//! We keep formatting code in one place so:
//! - the aggregation/forecast code stays clean and testable
//! - output changes are localized (important for snapshot tests)

use crate::app::pipeline::ViewOutput;
use crate::domain::{DatasetStats, View};
use crate::forecast::ForecastRun;
use crate::report::aggregate::{MonthlyCustomers, MonthlySales, PromotionGroup, WeekdayCustomers};
use crate::report::derive::weekday_name;

/// Header printed before any view.
pub fn format_dataset_summary(stats: &DatasetStats) -> String {
    let mut out = String::new();
    out.push_str("=== barber - Barbershop Sales Dashboard ===\n");
    out.push_str(&format!(
        "Rows: n={} | dates=[{}, {}] | total sales={:.2}\n",
        stats.n_rows, stats.first_date, stats.last_date, stats.total_sales
    ));
    out
}

/// Title, caption and table for one computed view.
pub fn format_view(view: View, output: &ViewOutput) -> String {
    let mut out = String::new();
    out.push_str(&format!("\n{}\n", view.title()));
    out.push_str(&format!("{}\n\n", view.caption()));

    match output {
        ViewOutput::MonthlySales(rows) => out.push_str(&format_monthly_sales(rows)),
        ViewOutput::MonthlyCustomers(rows) => out.push_str(&format_monthly_customers(rows)),
        ViewOutput::WeekdayCustomers(rows) => out.push_str(&format_weekday_customers(rows)),
        ViewOutput::PromotionSales(groups) => out.push_str(&format_promotion_groups(groups)),
        ViewOutput::Forecast(run) => out.push_str(&format_forecast_summary(run)),
    }
    out
}

fn format_monthly_sales(rows: &[MonthlySales]) -> String {
    let mut out = header_line(&[("month", 8, false), ("sales", 14, true)]);
    for r in rows {
        push_line(&mut out, format!("{:<8} {:>14.2}", r.month.to_string(), r.sales));
    }
    out
}

fn format_monthly_customers(rows: &[MonthlyCustomers]) -> String {
    let mut out = header_line(&[
        ("month", 8, false),
        ("customers", 10, true),
        ("promo %", 8, true),
        ("days", 5, true),
    ]);
    for r in rows {
        push_line(
            &mut out,
            format!(
                "{:<8} {:>10.2} {:>8.1} {:>5}",
                r.month.to_string(),
                r.mean_customers,
                r.promo_percent,
                r.days
            ),
        );
    }
    out
}

fn format_weekday_customers(rows: &[WeekdayCustomers]) -> String {
    let mut out = header_line(&[("weekday", 10, false), ("customers", 10, true), ("days", 5, true)]);
    for r in rows {
        push_line(
            &mut out,
            format!("{:<10} {:>10.2} {:>5}", weekday_name(r.weekday), r.mean_customers, r.days),
        );
    }
    out
}

fn format_promotion_groups(groups: &[PromotionGroup]) -> String {
    let mut out = header_line(&[
        ("group", 18, false),
        ("n", 4, true),
        ("min", 10, true),
        ("q1", 10, true),
        ("median", 10, true),
        ("q3", 10, true),
        ("max", 10, true),
        ("mean", 10, true),
        ("outliers", 8, true),
    ]);
    for g in groups {
        let s = &g.summary;
        push_line(
            &mut out,
            format!(
                "{:<18} {:>4} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>8}",
                g.label.display_name(),
                g.sales.len(),
                s.min,
                s.q1,
                s.median,
                s.q3,
                s.max,
                s.mean,
                s.outliers.len()
            ),
        );
    }
    out
}

/// Model diagnostics, the future rows and the weekly profile.
pub fn format_forecast_summary(run: &ForecastRun) -> String {
    let m = &run.model;
    let mut out = String::new();

    out.push_str("Model:\n");
    out.push_str(&format!(
        "- history: n={} | start={} | horizon={}d\n",
        run.history_len, m.start, run.horizon
    ));
    out.push_str(&format!(
        "- trend: k={:.6} m={:.6} | changepoints={}\n",
        m.k,
        m.m,
        m.changepoints_t.len()
    ));
    if m.weekly_enabled() {
        out.push_str(&format!("- weekly: order={} betas={}\n", m.weekly_order, fmt_vec(&m.weekly_betas)));
    } else {
        out.push_str("- weekly: off\n");
    }
    out.push_str(&format!("- sigma_obs: {:.2}\n", m.sigma_obs * m.y_scale));

    out.push_str("\nForecast:\n");
    out.push_str(&header_line(&[
        ("date", 10, false),
        ("yhat", 10, true),
        ("lower", 10, true),
        ("upper", 10, true),
        ("trend", 10, true),
        ("weekly", 10, true),
    ]));
    for p in run.future() {
        push_line(
            &mut out,
            format!(
                "{:<10} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>10.2}",
                p.ds.to_string(),
                p.yhat,
                p.yhat_lower,
                p.yhat_upper,
                p.trend,
                p.weekly
            ),
        );
    }

    if !run.weekly_profile.is_empty() {
        out.push_str("\nWeekly effect:\n");
        for (day, effect) in &run.weekly_profile {
            out.push_str(&format!("{:<10} {:>+10.2}\n", weekday_name(*day), effect));
        }
    }

    out
}

/// Column header plus dash ruler. `(name, width, right_aligned)`.
fn header_line(cols: &[(&str, usize, bool)]) -> String {
    let names: Vec<String> = cols
        .iter()
        .map(|(name, w, right)| if *right { format!("{name:>w$}") } else { format!("{name:<w$}") })
        .collect();
    let rules: Vec<String> = cols.iter().map(|(_, w, _)| "-".repeat(*w)).collect();

    let mut out = String::new();
    push_line(&mut out, names.join(" "));
    push_line(&mut out, rules.join(" "));
    out
}

fn push_line(out: &mut String, line: String) {
    out.push_str(line.trim_end());
    out.push('\n');
}

fn fmt_vec(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:.4}")).collect();
    format!("[{}]", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MonthBucket;
    use chrono::{NaiveDate, Weekday};

    #[test]
    fn monthly_sales_table_is_aligned() {
        let rows = vec![
            MonthlySales {
                month: MonthBucket { year: 2024, month: 1 },
                sales: 1234.5,
            },
            MonthlySales {
                month: MonthBucket { year: 2024, month: 2 },
                sales: 99.0,
            },
        ];
        let txt = format_monthly_sales(&rows);
        let expected = concat!(
            "month             sales\n",
            "-------- --------------\n",
            "2024-01         1234.50\n",
            "2024-02           99.00\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn weekday_table_uses_english_names() {
        let rows = vec![WeekdayCustomers {
            weekday: Weekday::Sat,
            mean_customers: 12.5,
            days: 4,
        }];
        let txt = format_weekday_customers(&rows);
        assert!(txt.lines().nth(2).unwrap().starts_with("Saturday"));
    }

    #[test]
    fn dataset_summary_mentions_range() {
        let stats = DatasetStats {
            n_rows: 3,
            first_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            last_date: NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
            total_sales: 300.0,
        };
        let txt = format_dataset_summary(&stats);
        assert!(txt.contains("n=3"));
        assert!(txt.contains("[2024-01-01, 2024-01-03]"));
        assert!(txt.contains("300.00"));
    }
}
