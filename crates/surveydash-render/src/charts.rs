//! SVG chart renderers
//!
//! Each renderer draws one chart from the chart data computed in
//! `surveydash-core`. Empty input renders nothing: the result is `Ok(None)`,
//! never an error. As a [`Renderer`] each one draws the report's chart
//! section (the chart metric, or the first selected metric).

use std::f64::consts::{FRAC_PI_2, TAU};

use svg::node::element::path::Data;
use svg::node::element::{Circle, Group, Line, Path, Rectangle, Text};
use svg::Document;
use surveydash_core::{BarSeries, RenderError, Renderer, Report, ShareChart, ShareMeasure, TrendSeries};

use crate::{format_value, truncate, write_svg, ChartStyle};

/// Horizontal grid lines drawn across the plot
const GRID_LINES: u32 = 4;

// ============================================================================
// Shared drawing helpers
// ============================================================================

/// Vertical value axis mapping values to pixel rows
#[derive(Clone, Copy, Debug)]
struct ValueScale {
    lo: f64,
    hi: f64,
    top: f64,
    height: f64,
}

impl ValueScale {
    /// Scale covering `lo..=hi`, widened when the range is degenerate
    fn new(lo: f64, hi: f64, top: f64, height: f64) -> Self {
        let (lo, hi) = if (hi - lo).abs() < f64::EPSILON {
            let pad = if lo == 0.0 { 1.0 } else { lo.abs() * 0.1 };
            (lo - pad, hi + pad)
        } else {
            (lo, hi)
        };
        Self { lo, hi, top, height }
    }

    fn y(&self, value: f64) -> f64 {
        self.top + (self.hi - value) / (self.hi - self.lo) * self.height
    }
}

fn document(style: &ChartStyle, title: &str) -> Document {
    let width = style.total_width();
    let height = style.total_height();
    Document::new()
        .set("width", width)
        .set("height", height)
        .set("viewBox", (0, 0, width, height))
        .set("xmlns", "http://www.w3.org/2000/svg")
        .set("direction", "rtl")
        .add(
            Rectangle::new()
                .set("width", "100%")
                .set("height", "100%")
                .set("fill", style.background_color.as_str()),
        )
        .add(
            Text::new(title)
                .set("x", style.total_width() / 2)
                .set("y", style.padding / 2 + 4)
                .set("font-family", style.font_family.as_str())
                .set("font-size", style.font_size + 2)
                .set("font-weight", "bold")
                .set("fill", style.text_color.as_str())
                .set("text-anchor", "middle"),
        )
}

fn label(style: &ChartStyle, content: impl Into<String>, x: f64, y: f64, anchor: &str) -> Text {
    Text::new(content.into())
        .set("x", x)
        .set("y", y)
        .set("font-family", style.font_family.as_str())
        .set("font-size", style.font_size - 1)
        .set("fill", style.text_color.as_str())
        .set("text-anchor", anchor)
}

/// Horizontal grid with value labels on the left edge
fn value_grid(style: &ChartStyle, scale: &ValueScale) -> Group {
    let mut group = Group::new().set("class", "grid");
    let left = f64::from(style.padding);
    let right = left + f64::from(style.width);
    for i in 0..=GRID_LINES {
        let value = scale.lo + (scale.hi - scale.lo) * f64::from(i) / f64::from(GRID_LINES);
        let y = scale.y(value);
        group = group
            .add(
                Line::new()
                    .set("x1", left)
                    .set("y1", y)
                    .set("x2", right)
                    .set("y2", y)
                    .set("stroke", style.grid_color.as_str())
                    .set("stroke-width", 1),
            )
            .add(label(
                style,
                format_value(value, style.decimals),
                left - 4.0,
                y + 4.0,
                "end",
            ));
    }
    group
}

// ============================================================================
// Trend Line
// ============================================================================

/// Line chart of a metric's yearly mean
#[derive(Clone, Debug, Default)]
pub struct TrendChartRenderer {
    pub style: ChartStyle,
}

impl TrendChartRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn style(mut self, style: ChartStyle) -> Self {
        self.style = style;
        self
    }

    /// Draw one series; `None` when it has no points
    pub fn render_series(&self, series: &TrendSeries) -> Result<Option<String>, RenderError> {
        let Some((lo, hi)) = series.value_range() else {
            return Ok(None);
        };
        let style = &self.style;
        let scale = ValueScale::new(lo, hi, f64::from(style.padding), f64::from(style.height));

        let left = f64::from(style.padding);
        let step = if series.points.len() > 1 {
            f64::from(style.width) / (series.points.len() - 1) as f64
        } else {
            0.0
        };
        let x_at = |i: usize| {
            if series.points.len() > 1 {
                left + step * i as f64
            } else {
                left + f64::from(style.width) / 2.0
            }
        };

        let mut line = Data::new();
        let mut markers = Group::new().set("class", "points");
        for (i, point) in series.points.iter().enumerate() {
            let (x, y) = (x_at(i), scale.y(point.value));
            line = if i == 0 {
                line.move_to((x, y))
            } else {
                line.line_to((x, y))
            };
            let value_text = format_value(point.value, style.decimals);
            markers = markers
                .add(
                    Circle::new()
                        .set("cx", x)
                        .set("cy", y)
                        .set("r", 4)
                        .set("fill", style.color(0))
                        .set("data-label", format!("{}: {}", point.year, value_text)),
                )
                .add(label(style, value_text, x, y - 8.0, "middle"))
                .add(label(
                    style,
                    point.year.to_string(),
                    x,
                    scale.top + scale.height + 16.0,
                    "middle",
                ));
        }

        let document = document(style, &series.metric)
            .add(value_grid(style, &scale))
            .add(
                Path::new()
                    .set("d", line)
                    .set("fill", "none")
                    .set("stroke", style.color(0))
                    .set("stroke-width", 2),
            )
            .add(markers);
        write_svg(&document).map(Some)
    }
}

impl Renderer for TrendChartRenderer {
    type Output = Option<String>;

    fn render(&self, report: &Report) -> Result<Option<String>, RenderError> {
        match report.chart_section() {
            Some(section) => self.render_series(&section.trend),
            None => Ok(None),
        }
    }
}

// ============================================================================
// Ranked Bar
// ============================================================================

/// Column chart of locality means in the latest year, tallest first
#[derive(Clone, Debug)]
pub struct BarChartRenderer {
    pub style: ChartStyle,
    /// Maximum label length before truncation
    pub label_chars: usize,
}

impl Default for BarChartRenderer {
    fn default() -> Self {
        Self {
            style: ChartStyle::default(),
            label_chars: 12,
        }
    }
}

impl BarChartRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn style(mut self, style: ChartStyle) -> Self {
        self.style = style;
        self
    }

    /// Draw one series; `None` when it has no bars
    pub fn render_series(&self, series: &BarSeries) -> Result<Option<String>, RenderError> {
        let Some((lo, hi)) = series.value_range() else {
            return Ok(None);
        };
        let style = &self.style;
        // Bars grow from zero, so zero is always on the axis
        let scale = ValueScale::new(
            lo.min(0.0),
            hi.max(0.0),
            f64::from(style.padding),
            f64::from(style.height),
        );
        let zero = scale.y(0.0);

        let slot = f64::from(style.width) / series.bars.len() as f64;
        let bar_width = (slot * 0.7).max(1.0);

        let mut bars = Group::new().set("class", "bars");
        for (i, bar) in series.bars.iter().enumerate() {
            let x = f64::from(style.padding) + slot * i as f64 + (slot - bar_width) / 2.0;
            let y = scale.y(bar.value);
            let (top, height) = if bar.value >= 0.0 {
                (y, zero - y)
            } else {
                (zero, y - zero)
            };
            let value_text = format_value(bar.value, style.decimals);
            bars = bars
                .add(
                    Rectangle::new()
                        .set("x", x)
                        .set("y", top)
                        .set("width", bar_width)
                        .set("height", height.max(0.0))
                        .set("rx", 2)
                        .set("fill", style.color(i))
                        .set("data-label", format!("{}: {}", bar.label, value_text)),
                )
                .add(label(style, value_text, x + bar_width / 2.0, top - 4.0, "middle"))
                .add(label(
                    style,
                    truncate(&bar.label, self.label_chars.max(2)),
                    x + bar_width / 2.0,
                    scale.top + scale.height + 16.0,
                    "middle",
                ));
        }

        let title = match series.year {
            Some(year) => format!("{} ({})", series.metric, year),
            None => series.metric.clone(),
        };
        let document = document(style, &title)
            .add(value_grid(style, &scale))
            .add(bars);
        write_svg(&document).map(Some)
    }
}

impl Renderer for BarChartRenderer {
    type Output = Option<String>;

    fn render(&self, report: &Report) -> Result<Option<String>, RenderError> {
        match report.chart_section() {
            Some(section) => self.render_series(&section.bars),
            None => Ok(None),
        }
    }
}

// ============================================================================
// Share Pie
// ============================================================================

/// Pie of counts or sums per category value
#[derive(Clone, Debug, Default)]
pub struct PieChartRenderer {
    pub style: ChartStyle,
}

impl PieChartRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn style(mut self, style: ChartStyle) -> Self {
        self.style = style;
        self
    }

    /// Draw the pie; `None` when there is nothing positive to show
    pub fn render_chart(&self, chart: &ShareChart) -> Result<Option<String>, RenderError> {
        if chart.slices.is_empty() || !chart.total.is_finite() || chart.total <= 0.0 {
            return Ok(None);
        }
        let style = &self.style;
        let radius = f64::from(style.height.min(style.width / 2)) / 2.0;
        let cx = f64::from(style.padding) + radius;
        let cy = f64::from(style.padding) + f64::from(style.height) / 2.0;

        let mut slices = Group::new().set("class", "slices");
        let mut legend = Group::new().set("class", "legend");
        let mut angle = -FRAC_PI_2;
        for (i, slice) in chart.slices.iter().enumerate() {
            let percent = format_value(slice.fraction * 100.0, style.decimals);
            let tooltip = format!("{}: {}%", slice.label, percent);
            let color = style.color(i);

            if slice.fraction >= 1.0 {
                slices = slices.add(
                    Circle::new()
                        .set("cx", cx)
                        .set("cy", cy)
                        .set("r", radius)
                        .set("fill", color)
                        .set("data-label", tooltip),
                );
            } else {
                let sweep = slice.fraction * TAU;
                let end = angle + sweep;
                let large_arc = if sweep > std::f64::consts::PI { 1.0 } else { 0.0 };
                let data = Data::new()
                    .move_to((cx, cy))
                    .line_to((cx + radius * angle.cos(), cy + radius * angle.sin()))
                    .elliptical_arc_to((
                        radius,
                        radius,
                        0.0,
                        large_arc,
                        1.0,
                        cx + radius * end.cos(),
                        cy + radius * end.sin(),
                    ))
                    .close();
                slices = slices.add(
                    Path::new()
                        .set("d", data)
                        .set("fill", color)
                        .set("stroke", style.background_color.as_str())
                        .set("stroke-width", 1)
                        .set("data-label", tooltip),
                );
                angle = end;
            }

            let ly = f64::from(style.padding) + 18.0 * i as f64;
            let lx = cx + radius + 30.0;
            legend = legend
                .add(
                    Rectangle::new()
                        .set("x", lx)
                        .set("y", ly)
                        .set("width", 12)
                        .set("height", 12)
                        .set("rx", 2)
                        .set("fill", color),
                )
                .add(label(
                    style,
                    format!("{} ({}%)", truncate(&slice.label, 24), percent),
                    lx + 18.0,
                    ly + 10.0,
                    "start",
                ));
        }

        let title = match &chart.measure {
            ShareMeasure::Count => chart.column.clone(),
            ShareMeasure::Sum(metric) => format!("{} / {}", chart.column, metric),
        };
        let document = document(style, &title).add(slices).add(legend);
        write_svg(&document).map(Some)
    }
}

impl Renderer for PieChartRenderer {
    type Output = Option<String>;

    fn render(&self, report: &Report) -> Result<Option<String>, RenderError> {
        match &report.share {
            Some(chart) => self.render_chart(chart),
            None => Ok(None),
        }
    }
}
