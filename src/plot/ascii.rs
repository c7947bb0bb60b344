//! ASCII plotting for non-interactive terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual checks when the dashboard is not running
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - bars: `#`
//! - box plots: `-` whiskers, `[===|===]` box with median, `o` outliers
//! - forecast: `o` actual, `-` prediction, `.` interval bounds

use crate::app::pipeline::ViewOutput;
use crate::forecast::ForecastRun;
use crate::report::aggregate::PromotionGroup;
use crate::report::derive::weekday_name;

/// Chart for any view output.
pub fn render_view_chart(output: &ViewOutput, width: usize, height: usize) -> String {
    let bar_width = width.saturating_sub(30).max(10);
    match output {
        ViewOutput::MonthlySales(rows) => {
            let bars: Vec<(String, f64)> = rows.iter().map(|r| (r.month.to_string(), r.sales)).collect();
            render_bars(&bars, bar_width, |v| format!("{v:.2}"))
        }
        ViewOutput::MonthlyCustomers(rows) => {
            let bars: Vec<(String, f64)> = rows
                .iter()
                .map(|r| (format!("{} ({:>5.1}%)", r.month, r.promo_percent), r.mean_customers))
                .collect();
            render_bars(&bars, bar_width, |v| format!("{v:.1}"))
        }
        ViewOutput::WeekdayCustomers(rows) => {
            let bars: Vec<(String, f64)> = rows
                .iter()
                .map(|r| (weekday_name(r.weekday).to_string(), r.mean_customers))
                .collect();
            render_bars(&bars, bar_width, |v| format!("{v:.1}"))
        }
        ViewOutput::PromotionSales(groups) => render_box_plots(groups, width.saturating_sub(20)),
        ViewOutput::Forecast(run) => render_forecast_plot(run, width, height),
    }
}

/// Render horizontal bars, one line per `(label, value)`.
pub fn render_bars(rows: &[(String, f64)], bar_width: usize, fmt_value: fn(f64) -> String) -> String {
    let label_width = rows.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);
    let max = rows.iter().map(|(_, v)| *v).fold(0.0, f64::max);

    let mut out = String::new();
    for (label, value) in rows {
        let n = if max > 0.0 && value.is_finite() {
            ((value.max(0.0) / max) * bar_width as f64).round() as usize
        } else {
            0
        };
        out.push_str(&format!(
            "{label:<label_width$} | {} {}\n",
            "#".repeat(n),
            fmt_value(*value)
        ));
    }
    out
}

/// Render one horizontal box plot per group on a shared value axis.
pub fn render_box_plots(groups: &[PromotionGroup], width: usize) -> String {
    let width = width.max(10);
    let label_width = groups
        .iter()
        .map(|g| g.label.display_name().len())
        .max()
        .unwrap_or(0);

    let lo = groups.iter().map(|g| g.summary.min).fold(f64::INFINITY, f64::min);
    let hi = groups.iter().map(|g| g.summary.max).fold(f64::NEG_INFINITY, f64::max);
    if !(lo.is_finite() && hi.is_finite()) {
        return String::new();
    }
    let (lo, hi) = pad_range(lo, hi, 0.02);

    let mut out = format!("Box: sales=[{lo:.2}, {hi:.2}]\n");
    for g in groups {
        let s = &g.summary;
        let mut line = vec![' '; width];
        let col = |v: f64| map_x(v, lo, hi, width);

        for c in col(s.whisker_low)..=col(s.whisker_high) {
            line[c] = '-';
        }
        for c in col(s.q1)..=col(s.q3) {
            line[c] = '=';
        }
        line[col(s.q1)] = '[';
        line[col(s.q3)] = ']';
        line[col(s.median)] = '|';
        for o in &s.outliers {
            line[col(*o)] = 'o';
        }

        let label = g.label.display_name();
        out.push_str(&format!(
            "{label:<label_width$} {}\n",
            line.into_iter().collect::<String>().trim_end()
        ));
    }
    out
}

/// Render the forecast: actuals, prediction and interval bounds over time.
pub fn render_forecast_plot(run: &ForecastRun, width: usize, height: usize) -> String {
    let Some(first) = run.rows.first() else {
        return String::new();
    };
    let origin = first.ds;
    let x = |p: &crate::forecast::ForecastPoint| (p.ds - origin).num_days() as f64;

    let actual: Vec<(f64, f64)> = run
        .rows
        .iter()
        .filter_map(|p| p.actual.map(|a| (x(p), a)))
        .collect();
    let line: Vec<(f64, f64)> = run.rows.iter().map(|p| (x(p), p.yhat)).collect();
    let lower: Vec<(f64, f64)> = run.rows.iter().map(|p| (x(p), p.yhat_lower)).collect();
    let upper: Vec<(f64, f64)> = run.rows.iter().map(|p| (x(p), p.yhat_upper)).collect();

    let last = run.rows.last().map(|p| p.ds).unwrap_or(origin);
    let x_max = (last - origin).num_days().max(1) as f64;

    let header = format!("Plot: date=[{origin}, {last}]");
    render_plot(&header, &actual, &line, &[&lower, &upper], 0.0, x_max, width, height)
}

#[allow(clippy::too_many_arguments)]
fn render_plot(
    header: &str,
    points: &[(f64, f64)],
    line: &[(f64, f64)],
    bands: &[&[(f64, f64)]],
    x_min: f64,
    x_max: f64,
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let all = points.iter().chain(line).chain(bands.iter().flat_map(|b| b.iter()));
    let (y_min, y_max) = y_range(all).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Bands first, then the prediction, then observations on top.
    for band in bands {
        for &(x, y) in band.iter() {
            let cx = map_x(x, x_min, x_max, width);
            let cy = map_y(y, y_min, y_max, height);
            if grid[cy][cx] == ' ' {
                grid[cy][cx] = '.';
            }
        }
    }
    draw_curve(&mut grid, line, x_min, x_max, y_min, y_max);
    for &(x, y) in points {
        grid[map_y(y, y_min, y_max, height)][map_x(x, x_min, x_max, width)] = 'o';
    }

    let mut out = String::new();
    out.push_str(&format!("{header} | y=[{y_min:.2}, {y_max:.2}]\n"));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out
}

fn y_range<'a>(values: impl Iterator<Item = &'a (f64, f64)>) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for &(_, y) in values {
        if y.is_finite() {
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
    }
    if min_y.is_finite() && max_y.is_finite() && max_y > min_y {
        Some((min_y, max_y))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(grid: &mut [Vec<char>], curve: &[(f64, f64)], x_min: f64, x_max: f64, y_min: f64, y_max: f64) {
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(x, y) in curve {
        let cx = map_x(x, x_min, x_max, width);
        let cy = map_y(y, y_min, y_max, height);
        if let Some((x0, y0)) = prev {
            draw_line(grid, x0, y0, cx, cy, '-');
        } else {
            grid[cy][cx] = '-';
        }
        prev = Some((cx, cy));
    }
}

/// Integer line drawing (Bresenham-ish). Only paints empty or band cells.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0 && (y0 as usize) < grid.len() && x0 >= 0 && (x0 as usize) < grid[0].len() {
            let cell = &mut grid[y0 as usize][x0 as usize];
            if *cell == ' ' || *cell == '.' {
                *cell = ch;
            }
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PromotionLabel;
    use crate::report::aggregate::BoxSummary;

    #[test]
    fn plot_golden_snapshot_small() {
        let points = [(0.0, 100.0), (9.0, 110.0)];
        let line = [(0.0, 100.0), (9.0, 100.0)];

        let txt = render_plot("Plot: x", &points, &line, &[], 0.0, 9.0, 10, 5);
        let expected = concat!(
            "Plot: x | y=[99.50, 110.50]\n",
            "         o\n",
            "          \n",
            "          \n",
            "          \n",
            "o---------\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn bars_scale_to_the_largest_value() {
        let rows = vec![("a".to_string(), 10.0), ("bb".to_string(), 5.0)];
        let txt = render_bars(&rows, 10, |v| format!("{v:.1}"));
        assert_eq!(txt, "a  | ########## 10.0\nbb | ##### 5.0\n");
    }

    #[test]
    fn box_plot_marks_median_and_outliers() {
        let sales = vec![10.0, 11.0, 12.0, 13.0, 40.0];
        let group = PromotionGroup {
            label: PromotionLabel::WithPromotion,
            summary: BoxSummary::from_values(&sales).unwrap(),
            sales,
        };
        let txt = render_box_plots(&[group], 40);
        let line = txt.lines().nth(1).unwrap();
        assert!(line.starts_with("with promotion "));
        assert!(line.contains('|'));
        assert!(line.contains('['));
        assert!(line.ends_with('o'));
    }
}
