//! Plotters-powered chart widgets for Ratatui.
//!
//! Plotters output is drawn into the Ratatui buffer through `plotters-ratatui-backend`.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

use crate::report::aggregate::PromotionGroup;

/// How a series is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesStyle {
    Line,
    Dots,
}

/// One data series with its colour.
pub struct Series<'a> {
    pub points: &'a [(f64, f64)],
    pub color: RGBColor,
    pub style: SeriesStyle,
}

/// A lightweight, render-only line/scatter chart.
///
/// The widget is intentionally data-driven: all series and bounds are computed
/// outside the render call. Series are drawn in order, so later ones sit on top.
pub struct SeriesChart<'a> {
    pub series: &'a [Series<'a>],
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    /// Axis labels (kept simple for terminal rendering).
    pub x_label: &'a str,
    pub y_label: &'a str,
    /// Formatting of tick labels.
    pub fmt_x: fn(f64) -> String,
    pub fmt_y: fn(f64) -> String,
}

impl<'a> Widget for SeriesChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if too_small(area, buf) {
            return;
        }

        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;
        if !valid_bounds(self.x_bounds, self.y_bounds) {
            return;
        }

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc(self.x_label)
                .y_desc(self.y_label)
                .x_labels(5)
                .y_labels(5)
                .x_label_formatter(&|v| (self.fmt_x)(*v))
                .y_label_formatter(&|v| (self.fmt_y)(*v))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            for s in self.series {
                match s.style {
                    SeriesStyle::Line => {
                        chart.draw_series(LineSeries::new(s.points.iter().copied(), &s.color))?;
                    }
                    SeriesStyle::Dots => {
                        // `Circle` radii are mapped incorrectly by the terminal
                        // backend; a coloured `Pixel` gives a clean dot.
                        chart.draw_series(s.points.iter().map(|&(x, y)| Pixel::new((x, y), s.color)))?;
                    }
                }
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}

/// Box plots for the promotion groups, one per x slot.
pub struct BoxPlotChart<'a> {
    pub groups: &'a [PromotionGroup],
    pub y_bounds: [f64; 2],
    pub y_label: &'a str,
    pub fmt_y: fn(f64) -> String,
}

impl BoxPlotChart<'_> {
    /// X range with every group centred on an integer slot.
    pub fn x_bounds(&self) -> [f64; 2] {
        [-0.5, self.groups.len().max(1) as f64 - 0.5]
    }
}

impl<'a> Widget for BoxPlotChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if too_small(area, buf) {
            return;
        }

        let x_bounds = self.x_bounds();
        if !valid_bounds(x_bounds, self.y_bounds) {
            return;
        }
        let [x0, x1] = x_bounds;
        let [y0, y1] = self.y_bounds;

        let names: Vec<&'static str> = self.groups.iter().map(|g| g.label.display_name()).collect();

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            let fmt_x = |v: &f64| {
                let slot = v.round();
                if (v - slot).abs() < 0.05 && slot >= 0.0 {
                    names.get(slot as usize).map(|s| s.to_string()).unwrap_or_default()
                } else {
                    String::new()
                }
            };

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .y_desc(self.y_label)
                .x_labels(self.groups.len().max(1))
                .y_labels(5)
                .x_label_formatter(&fmt_x)
                .y_label_formatter(&|v| (self.fmt_y)(*v))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            let box_color = RGBColor(66, 146, 198);
            let median_color = RGBColor(255, 255, 0);
            let outlier_color = RGBColor(255, 0, 0);
            let half = 0.25;

            for (i, g) in self.groups.iter().enumerate() {
                let cx = i as f64;
                let s = &g.summary;

                chart.draw_series(std::iter::once(PathElement::new(
                    vec![(cx, s.whisker_low), (cx, s.q1)],
                    &WHITE,
                )))?;
                chart.draw_series(std::iter::once(PathElement::new(
                    vec![(cx, s.q3), (cx, s.whisker_high)],
                    &WHITE,
                )))?;
                for cap in [s.whisker_low, s.whisker_high] {
                    chart.draw_series(std::iter::once(PathElement::new(
                        vec![(cx - half / 2.0, cap), (cx + half / 2.0, cap)],
                        &WHITE,
                    )))?;
                }

                chart.draw_series(std::iter::once(Rectangle::new(
                    [(cx - half, s.q1), (cx + half, s.q3)],
                    ShapeStyle::from(&box_color),
                )))?;
                chart.draw_series(std::iter::once(PathElement::new(
                    vec![(cx - half, s.median), (cx + half, s.median)],
                    &median_color,
                )))?;

                chart.draw_series(s.outliers.iter().map(|&y| Pixel::new((cx, y), outlier_color)))?;
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}

fn too_small(area: Rect, buf: &mut Buffer) -> bool {
    // When the available area is too small, Plotters may fail to build a chart.
    // In that case, we render a small hint rather than panicking.
    if area.width < 20 || area.height < 8 {
        buf.set_string(
            area.x,
            area.y,
            "Chart area too small (resize terminal).",
            Style::default().fg(Color::Yellow),
        );
        return true;
    }
    false
}

fn valid_bounds(x: [f64; 2], y: [f64; 2]) -> bool {
    x.iter().chain(y.iter()).all(|v| v.is_finite()) && x[1] > x[0] && y[1] > y[0]
}
