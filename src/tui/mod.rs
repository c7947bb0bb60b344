//! Ratatui-based terminal dashboard.
//!
//! A sidebar lists the five views; the main panel shows the selected view's
//! chart with its caption. Selecting a view recomputes it immediately. The
//! forecast fit can take a moment, so its "Training model…" status is drawn
//! before the fit starts.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use plotters::style::RGBColor;
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};
use tracing::{info, warn};

use crate::app::pipeline::{Dashboard, ViewOutput};
use crate::domain::View;
use crate::error::AppError;
use crate::forecast::ForecastRun;
use crate::report::aggregate::{MonthlyCustomers, PromotionGroup};
use crate::report::derive::weekday_short;

mod plotters_chart;

use plotters_chart::{BoxPlotChart, Series, SeriesChart, SeriesStyle};

const TRAINING_STATUS: &str = "Training model…";

/// Start the dashboard on an already loaded dataset.
pub fn run(dashboard: Dashboard) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal =
        Terminal::new(backend).map_err(|e| AppError::runtime(format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(dashboard);
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::runtime(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::runtime(format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// What the main panel currently shows.
enum Panel {
    Ready(ViewOutput),
    Pending,
    Failed(String),
}

struct App {
    dashboard: Dashboard,
    panel: Panel,
    /// View waiting to be computed after the next draw.
    pending: Option<View>,
    status: String,
}

impl App {
    fn new(dashboard: Dashboard) -> Self {
        let mut app = Self {
            dashboard,
            panel: Panel::Pending,
            pending: None,
            status: String::new(),
        };
        let view = app.dashboard.selected();
        app.recompute(view);
        app
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::runtime(format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            // The pending status is on screen now; run the slow computation.
            if self.step_pending() {
                needs_redraw = true;
                continue;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::runtime(format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::runtime(format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the app should quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Up | KeyCode::Char('k') => self.request(self.current_view().prev()),
            KeyCode::Down | KeyCode::Char('j') => self.request(self.current_view().next()),
            KeyCode::Char('e') => self.export_current(),
            _ => {}
        }
        false
    }

    fn current_view(&self) -> View {
        self.pending.unwrap_or_else(|| self.dashboard.selected())
    }

    /// Select `view`; a forecast that needs a fit is deferred to the next loop turn.
    fn request(&mut self, view: View) {
        if view == View::Forecast && self.dashboard.forecast_needs_fit() {
            self.pending = Some(view);
            self.panel = Panel::Pending;
            self.status = TRAINING_STATUS.to_string();
        } else {
            self.recompute(view);
        }
    }

    fn step_pending(&mut self) -> bool {
        match self.pending.take() {
            Some(view) => {
                self.recompute(view);
                true
            }
            None => false,
        }
    }

    fn recompute(&mut self, view: View) {
        match self.dashboard.select(view) {
            Ok(output) => {
                info!(view = view.slug(), "view selected");
                self.status = match view {
                    View::Forecast => format!("model fits this session: {}", self.dashboard.forecast_fits()),
                    _ => String::new(),
                };
                self.panel = Panel::Ready(output);
            }
            Err(err) => {
                warn!(view = view.slug(), error = %err, "view failed");
                self.status = format!("{} failed", view.menu_label());
                self.panel = Panel::Failed(err.to_string());
            }
        }
    }

    fn export_current(&mut self) {
        let Panel::Ready(output) = &self.panel else {
            self.status = "Nothing to export.".to_string();
            return;
        };
        let path = PathBuf::from(format!("barber-{}.csv", output.view().slug()));
        match crate::io::export_view_csv(&path, output) {
            Ok(()) => {
                info!(path = %path.display(), "exported view");
                self.status = format!("Exported {}", path.display());
            }
            Err(err) => {
                warn!(error = %err, "export failed");
                self.status = format!("Export failed: {err}");
            }
        }
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let stats = &self.dashboard.dataset().stats;
        let line = Line::from(vec![
            Span::styled("barber", Style::default().fg(Color::Cyan)),
            Span::raw(" | barbershop sales dashboard | "),
            Span::styled(
                format!(
                    "n={} | {} → {} | total sales {:.2}",
                    stats.n_rows, stats.first_date, stats.last_date, stats.total_sales
                ),
                Style::default().fg(Color::Gray),
            ),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(42), Constraint::Min(0)])
            .split(area);

        self.draw_sidebar(frame, chunks[0]);
        self.draw_main(frame, chunks[1]);
    }

    fn draw_sidebar(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let items: Vec<ListItem> = View::ALL.iter().map(|v| ListItem::new(v.menu_label())).collect();

        let list = List::new(items)
            .block(Block::default().title("Views").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        state.select(Some(self.current_view().index()));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_main(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let view = self.current_view();
        let block = Block::default().title(view.title()).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(inner);
        let (body, caption) = (chunks[0], chunks[1]);

        match &self.panel {
            Panel::Pending => {
                let msg = Paragraph::new(TRAINING_STATUS)
                    .style(Style::default().fg(Color::Yellow))
                    .alignment(Alignment::Center);
                frame.render_widget(msg, body);
            }
            Panel::Failed(message) => {
                let msg = Paragraph::new(message.as_str())
                    .style(Style::default().fg(Color::Red))
                    .wrap(Wrap { trim: false });
                frame.render_widget(msg, body);
            }
            Panel::Ready(output) => draw_output(frame, body, output),
        }

        let caption_text = Paragraph::new(view.caption())
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center);
        frame.render_widget(caption_text, caption);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ or j/k select  e export CSV  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn draw_output(frame: &mut ratatui::Frame<'_>, area: Rect, output: &ViewOutput) {
    match output {
        ViewOutput::MonthlySales(rows) => {
            let bars: Vec<Bar> = rows
                .iter()
                .map(|r| {
                    Bar::default()
                        .value(r.sales.max(0.0).round() as u64)
                        .label(Line::from(r.month.to_string()))
                        .text_value(format!("{:.0}", r.sales))
                })
                .collect();
            draw_bars(frame, area, &bars, Color::Cyan);
        }
        ViewOutput::MonthlyCustomers(rows) => draw_monthly_customers(frame, area, rows),
        ViewOutput::WeekdayCustomers(rows) => {
            let bars: Vec<Bar> = rows
                .iter()
                .map(|r| {
                    Bar::default()
                        .value(tenths(r.mean_customers))
                        .label(Line::from(weekday_short(r.weekday)))
                        .text_value(format!("{:.1}", r.mean_customers))
                })
                .collect();
            draw_bars(frame, area, &bars, Color::Cyan);
        }
        ViewOutput::PromotionSales(groups) => draw_promotion_boxes(frame, area, groups),
        ViewOutput::Forecast(run) => draw_forecast(frame, area, run),
    }
}

fn draw_bars(frame: &mut ratatui::Frame<'_>, area: Rect, bars: &[Bar], color: Color) {
    if bars.is_empty() {
        frame.render_widget(Paragraph::new("No data."), area);
        return;
    }
    let chart = BarChart::default()
        .data(BarGroup::default().bars(bars))
        .bar_width(bar_width_for(area.width, bars.len()))
        .bar_gap(1)
        .bar_style(Style::default().fg(color))
        .value_style(Style::default().fg(Color::Black).bg(color));
    frame.render_widget(chart, area);
}

fn draw_monthly_customers(frame: &mut ratatui::Frame<'_>, area: Rect, rows: &[MonthlyCustomers]) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    let (lo, hi) = promo_range(rows);
    let bars: Vec<Bar> = rows
        .iter()
        .map(|r| {
            let color = blues(normalize(r.promo_percent, lo, hi));
            Bar::default()
                .value(tenths(r.mean_customers))
                .label(Line::from(r.month.to_string()))
                .text_value(format!("{:.1}", r.mean_customers))
                .style(Style::default().fg(color))
                .value_style(Style::default().fg(Color::Black).bg(color))
        })
        .collect();
    draw_bars(frame, chunks[0], &bars, Color::Blue);

    // Legend: five swatches across the displayed promotion range.
    let mut spans = vec![Span::styled("% promotion: ", Style::default().fg(Color::Gray))];
    for i in 0..5 {
        let u = i as f64 / 4.0;
        let pct = lo + u * (hi - lo);
        spans.push(Span::styled("██", Style::default().fg(blues(u))));
        spans.push(Span::raw(format!(" {pct:.1}  ")));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), chunks[1]);
}

fn draw_promotion_boxes(frame: &mut ratatui::Frame<'_>, area: Rect, groups: &[PromotionGroup]) {
    if groups.is_empty() {
        frame.render_widget(Paragraph::new("No data."), area);
        return;
    }

    let lo = groups.iter().map(|g| g.summary.min).fold(f64::INFINITY, f64::min);
    let hi = groups.iter().map(|g| g.summary.max).fold(f64::NEG_INFINITY, f64::max);
    let y_bounds = pad_bounds(lo, hi);

    let widget = BoxPlotChart {
        groups,
        y_bounds,
        y_label: "sales",
        fmt_y: fmt_axis_value,
    };
    let x_bounds = widget.x_bounds();
    let x_ticks: Vec<(f64, String)> = groups
        .iter()
        .enumerate()
        .map(|(i, g)| (i as f64, g.label.display_name().to_string()))
        .collect();

    let (chart_rect, insets) = chart_layout(area);
    frame.render_widget(widget, chart_rect);
    if let Some(insets) = insets {
        let axes = AxisTicks {
            x: x_ticks,
            y_bounds,
            x_label: "",
            y_label: "sales",
        };
        draw_axis_ticks(frame, area, chart_rect, insets, x_bounds, &axes);
    }
}

/// Forecast chart on top, trend and weekly components below.
fn draw_forecast(frame: &mut ratatui::Frame<'_>, area: Rect, run: &ForecastRun) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);
    let components = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(rows[1]);

    let fc = forecast_series(run);
    let series = [
        Series {
            points: &fc.lower,
            color: RGBColor(30, 90, 200),
            style: SeriesStyle::Line,
        },
        Series {
            points: &fc.upper,
            color: RGBColor(30, 90, 200),
            style: SeriesStyle::Line,
        },
        Series {
            points: &fc.yhat,
            color: RGBColor(0, 255, 255),
            style: SeriesStyle::Line,
        },
        Series {
            points: &fc.actual,
            color: RGBColor(255, 255, 255),
            style: SeriesStyle::Dots,
        },
    ];
    draw_series_chart(frame, rows[0], &series, fc.x_bounds, fc.y_bounds, "date", "sales", fmt_axis_date);

    let trend = trend_series(run);
    let trend_bounds = y_bounds_of(trend.iter().flat_map(|s| s.iter()));
    let trend_chart = [
        Series {
            points: &trend[1],
            color: RGBColor(30, 90, 200),
            style: SeriesStyle::Line,
        },
        Series {
            points: &trend[2],
            color: RGBColor(30, 90, 200),
            style: SeriesStyle::Line,
        },
        Series {
            points: &trend[0],
            color: RGBColor(0, 255, 255),
            style: SeriesStyle::Line,
        },
    ];
    draw_series_chart(
        frame,
        components[0],
        &trend_chart,
        fc.x_bounds,
        trend_bounds,
        "date",
        "trend",
        fmt_axis_date,
    );

    if run.weekly_profile.is_empty() {
        let msg = Paragraph::new("weekly seasonality off")
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center)
            .block(Block::default().title("weekly").borders(Borders::ALL));
        frame.render_widget(msg, components[1]);
        return;
    }
    let weekly: Vec<(f64, f64)> = run
        .weekly_profile
        .iter()
        .enumerate()
        .map(|(i, (_, effect))| (i as f64, *effect))
        .collect();
    let weekly_bounds = y_bounds_of(weekly.iter());
    let weekly_chart = [Series {
        points: &weekly,
        color: RGBColor(0, 255, 255),
        style: SeriesStyle::Line,
    }];
    draw_series_chart(
        frame,
        components[1],
        &weekly_chart,
        [0.0, 6.0],
        weekly_bounds,
        "weekday",
        "weekly",
        fmt_axis_weekday,
    );
}

#[allow(clippy::too_many_arguments)]
fn draw_series_chart(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    series: &[Series<'_>],
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
    x_label: &str,
    y_label: &str,
    fmt_x: fn(f64) -> String,
) {
    let (chart_rect, insets) = chart_layout(area);
    let widget = SeriesChart {
        series,
        x_bounds,
        y_bounds,
        x_label,
        y_label,
        fmt_x,
        fmt_y: fmt_axis_value,
    };
    frame.render_widget(widget, chart_rect);

    if let Some(insets) = insets {
        let axes = AxisTicks {
            x: even_ticks(x_bounds, 5, fmt_x),
            y_bounds,
            x_label,
            y_label,
        };
        draw_axis_ticks(frame, area, chart_rect, insets, x_bounds, &axes);
    }
}

/// Chart-ready forecast series; x is the day number from the common era.
struct ForecastSeries {
    actual: Vec<(f64, f64)>,
    yhat: Vec<(f64, f64)>,
    lower: Vec<(f64, f64)>,
    upper: Vec<(f64, f64)>,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
}

fn day_x(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

fn forecast_series(run: &ForecastRun) -> ForecastSeries {
    let actual: Vec<(f64, f64)> = run
        .rows
        .iter()
        .filter_map(|p| p.actual.map(|a| (day_x(p.ds), a)))
        .collect();
    let yhat: Vec<(f64, f64)> = run.rows.iter().map(|p| (day_x(p.ds), p.yhat)).collect();
    let lower: Vec<(f64, f64)> = run.rows.iter().map(|p| (day_x(p.ds), p.yhat_lower)).collect();
    let upper: Vec<(f64, f64)> = run.rows.iter().map(|p| (day_x(p.ds), p.yhat_upper)).collect();

    let x0 = yhat.first().map(|p| p.0).unwrap_or(0.0);
    let mut x1 = yhat.last().map(|p| p.0).unwrap_or(1.0);
    if x1 <= x0 {
        x1 = x0 + 1.0;
    }
    let y_bounds = y_bounds_of(actual.iter().chain(&yhat).chain(&lower).chain(&upper));

    ForecastSeries {
        actual,
        yhat,
        lower,
        upper,
        x_bounds: [x0, x1],
        y_bounds,
    }
}

/// `[trend, trend_lower, trend_upper]`.
fn trend_series(run: &ForecastRun) -> [Vec<(f64, f64)>; 3] {
    [
        run.rows.iter().map(|p| (day_x(p.ds), p.trend)).collect(),
        run.rows.iter().map(|p| (day_x(p.ds), p.trend_lower)).collect(),
        run.rows.iter().map(|p| (day_x(p.ds), p.trend_upper)).collect(),
    ]
}

fn y_bounds_of<'a>(points: impl Iterator<Item = &'a (f64, f64)>) -> [f64; 2] {
    let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(_, y) in points {
        if y.is_finite() {
            lo = lo.min(y);
            hi = hi.max(y);
        }
    }
    pad_bounds(lo, hi)
}

fn pad_bounds(lo: f64, hi: f64) -> [f64; 2] {
    if !lo.is_finite() || !hi.is_finite() {
        return [0.0, 1.0];
    }
    if hi <= lo {
        let pad = lo.abs().max(1.0) * 0.05;
        return [lo - pad, hi + pad];
    }
    let pad = ((hi - lo) * 0.05).max(1e-12);
    [lo - pad, hi + pad]
}

fn tenths(v: f64) -> u64 {
    (v.max(0.0) * 10.0).round() as u64
}

fn bar_width_for(width: u16, n: usize) -> u16 {
    if n == 0 {
        return 1;
    }
    let slot = (width as usize + 1) / n;
    slot.saturating_sub(1).clamp(1, 12) as u16
}

fn promo_range(rows: &[MonthlyCustomers]) -> (f64, f64) {
    let lo = rows.iter().map(|r| r.promo_percent).fold(f64::INFINITY, f64::min);
    let hi = rows.iter().map(|r| r.promo_percent).fold(f64::NEG_INFINITY, f64::max);
    if lo.is_finite() && hi.is_finite() { (lo, hi) } else { (0.0, 100.0) }
}

fn normalize(v: f64, lo: f64, hi: f64) -> f64 {
    if hi > lo { ((v - lo) / (hi - lo)).clamp(0.0, 1.0) } else { 0.5 }
}

/// Sequential "Blues" scale: light at 0, dark at 1.
fn blues(u: f64) -> Color {
    const STOPS: [(f64, f64, f64); 3] = [(198.0, 219.0, 239.0), (66.0, 146.0, 198.0), (8.0, 48.0, 107.0)];
    let u = u.clamp(0.0, 1.0);
    let (a, b, t) = if u <= 0.5 {
        (STOPS[0], STOPS[1], u * 2.0)
    } else {
        (STOPS[1], STOPS[2], (u - 0.5) * 2.0)
    };
    let mix = |x: f64, y: f64| (x + (y - x) * t).round() as u8;
    Color::Rgb(mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}

fn fmt_axis_value(v: f64) -> String {
    format!("{v:.0}")
}

fn fmt_axis_date(v: f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(v.round() as i32)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn fmt_axis_weekday(v: f64) -> String {
    let i = v.round();
    if (v - i).abs() > 0.05 || !(0.0..7.0).contains(&i) {
        return String::new();
    }
    weekday_short(crate::report::derive::WEEK[i as usize]).to_string()
}

fn even_ticks(bounds: [f64; 2], n: usize, fmt: fn(f64) -> String) -> Vec<(f64, String)> {
    let n = n.max(2);
    (0..n)
        .map(|i| {
            let u = i as f64 / (n as f64 - 1.0);
            let v = bounds[0] + u * (bounds[1] - bounds[0]);
            (v, fmt(v))
        })
        .collect()
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 8,
        right: 2,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10 || inner.height <= insets.top + insets.bottom + 5 {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

/// Tick labels and axis names drawn around a chart.
struct AxisTicks<'a> {
    /// `(x value, label)` pairs.
    x: Vec<(f64, String)>,
    y_bounds: [f64; 2],
    x_label: &'a str,
    y_label: &'a str,
}

fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    chart: Rect,
    insets: AxisInsets,
    x_bounds: [f64; 2],
    axes: &AxisTicks<'_>,
) {
    let style = Style::default().fg(Color::Gray);

    for (x_val, label) in &axes.x {
        let u = ((x_val - x_bounds[0]) / (x_bounds[1] - x_bounds[0])).clamp(0.0, 1.0);
        let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        let label_len = label.chars().count() as u16;
        let start = x.saturating_sub(label_len / 2).max(inner.x);
        let y = chart.y + chart.height;
        if y >= inner.y + inner.height - 1 {
            continue;
        }
        let width = label_len.min((inner.x + inner.width).saturating_sub(start));
        frame.render_widget(
            Paragraph::new(label.as_str()).style(style),
            Rect {
                x: start,
                y,
                width,
                height: 1,
            },
        );
    }

    let ticks = 5usize;
    let y_bounds = axes.y_bounds;
    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let y_val = y_bounds[0] + u * (y_bounds[1] - y_bounds[0]);
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let label = fmt_axis_value(y_val);
        let label_len = label.len() as u16;
        let x = inner.x + insets.left.saturating_sub(1);
        let start = x.saturating_sub(label_len);
        if start < inner.x {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    let x_label = Paragraph::new(axes.x_label)
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray));
    let x_rect = Rect {
        x: chart.x,
        y: chart.y + chart.height + 1,
        width: chart.width,
        height: 1,
    };
    if x_rect.y < inner.y + inner.height {
        frame.render_widget(x_label, x_rect);
    }

    let y_label = Paragraph::new(Text::from(axes.y_label))
        .style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));
    let y_rect = Rect {
        x: inner.x,
        y: inner.y,
        width: insets.left.saturating_sub(1),
        height: 1,
    };
    frame.render_widget(y_label, y_rect);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Dataset, ForecastConfig, SalesRecord};
    use std::sync::Arc;

    fn dashboard() -> Dashboard {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let records = (0..28)
            .map(|i| SalesRecord {
                date: start + chrono::Duration::days(i),
                sales: 150.0 + (i % 7) as f64 * 12.0,
                customers: 6 + (i % 7) as u32,
                promotion: i % 3 == 0,
            })
            .collect();
        let config = ForecastConfig {
            uncertainty_samples: 10,
            ..ForecastConfig::default()
        };
        Dashboard::new(Arc::new(Dataset::from_records(records).unwrap()), config)
    }

    #[test]
    fn keys_move_through_views() {
        let mut app = App::new(dashboard());
        assert_eq!(app.current_view(), View::MonthlySales);
        assert!(matches!(app.panel, Panel::Ready(ViewOutput::MonthlySales(_))));

        assert!(!app.handle_key(KeyCode::Down));
        assert_eq!(app.current_view(), View::MonthlyCustomers);
        assert!(!app.handle_key(KeyCode::Char('j')));
        assert_eq!(app.current_view(), View::WeekdayCustomers);
        assert!(!app.handle_key(KeyCode::Char('k')));
        assert_eq!(app.current_view(), View::MonthlyCustomers);

        assert!(app.handle_key(KeyCode::Char('q')));
        assert!(app.handle_key(KeyCode::Esc));
    }

    #[test]
    fn forecast_shows_training_status_before_fitting() {
        let mut app = App::new(dashboard());
        app.handle_key(KeyCode::Up);

        assert_eq!(app.current_view(), View::Forecast);
        assert!(matches!(app.panel, Panel::Pending));
        assert_eq!(app.status, TRAINING_STATUS);
        assert_eq!(app.dashboard.forecast_fits(), 0);

        assert!(app.step_pending());
        assert!(matches!(app.panel, Panel::Ready(ViewOutput::Forecast(_))));
        assert_eq!(app.dashboard.forecast_fits(), 1);
        assert!(!app.step_pending());

        // Away and back: served from the cache, no pending step.
        app.handle_key(KeyCode::Down);
        app.handle_key(KeyCode::Up);
        assert!(app.pending.is_none());
        assert!(matches!(app.panel, Panel::Ready(ViewOutput::Forecast(_))));
        assert_eq!(app.dashboard.forecast_fits(), 1);
    }

    #[test]
    fn blues_runs_light_to_dark() {
        assert_eq!(blues(0.0), Color::Rgb(198, 219, 239));
        assert_eq!(blues(0.5), Color::Rgb(66, 146, 198));
        assert_eq!(blues(1.0), Color::Rgb(8, 48, 107));
        assert_eq!(normalize(5.0, 5.0, 5.0), 0.5);
        assert_eq!(normalize(75.0, 50.0, 100.0), 0.5);
    }

    #[test]
    fn axis_formatters_round_trip_dates_and_weekdays() {
        let d = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(fmt_axis_date(day_x(d)), "2024-02-29");
        assert_eq!(fmt_axis_weekday(0.0), weekday_short(chrono::Weekday::Mon));
        assert_eq!(fmt_axis_weekday(6.0), weekday_short(chrono::Weekday::Sun));
        assert_eq!(fmt_axis_weekday(2.5), "");
    }

    #[test]
    fn bar_width_fits_the_panel() {
        assert_eq!(bar_width_for(80, 7), 10);
        assert_eq!(bar_width_for(20, 12), 1);
        assert_eq!(bar_width_for(200, 2), 12);
    }

    #[test]
    fn forecast_series_bounds_cover_interval() {
        let mut dash = dashboard();
        let ViewOutput::Forecast(run) = dash.select(View::Forecast).unwrap() else {
            panic!("wrong output variant");
        };
        let fc = forecast_series(&run);
        assert_eq!(fc.yhat.len(), 28 + 30);
        assert_eq!(fc.actual.len(), 28);
        for &(_, y) in fc.lower.iter().chain(&fc.upper) {
            assert!(y >= fc.y_bounds[0] && y <= fc.y_bounds[1]);
        }
        assert!(fc.x_bounds[1] > fc.x_bounds[0]);
    }
}
