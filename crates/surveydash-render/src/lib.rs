//! # surveydash-render
//!
//! Rendering backends for surveydash reports.
//!
//! This crate provides:
//! - SVG charts: trend line, ranked bar and share pie
//! - A standalone HTML dashboard page (single, tabs or sidebar layout)
//! - Plain-text ranking tables for the terminal
//! - XLSX export of the filtered table
//!
//! ## Example
//!
//! ```rust,ignore
//! use surveydash_core::{Renderer, Report};
//! use surveydash_render::{ExcelExporter, HtmlReportRenderer, TrendChartRenderer};
//!
//! let html = HtmlReportRenderer::new().render(&report)?;
//! let trend_svg = TrendChartRenderer::default().render(&report)?; // Option<String>
//! let xlsx = ExcelExporter::new().render(&report)?;
//! std::fs::write(&report.config.export_file_name, xlsx)?;
//! ```

pub mod charts;
pub mod excel;
pub mod html;
pub mod text;

pub use charts::{BarChartRenderer, PieChartRenderer, TrendChartRenderer};
pub use excel::{ExcelExporter, XLSX_MIME};
pub use html::HtmlReportRenderer;
pub use text::TextRenderer;

use serde::{Deserialize, Serialize};
use surveydash_core::{round_to, RenderError};

/// Colors and fonts shared by the SVG charts
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChartStyle {
    /// Plot area width in pixels
    pub width: u32,
    /// Plot area height in pixels
    pub height: u32,
    /// Padding around the plot
    pub padding: u32,
    /// Series colors, cycled
    pub palette: Vec<String>,
    pub background_color: String,
    pub grid_color: String,
    pub text_color: String,
    pub font_family: String,
    pub font_size: u32,
    /// Decimal places for value labels
    pub decimals: u32,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            width: 640,
            height: 320,
            padding: 40,
            palette: vec![
                "#1f77b4".into(),
                "#ff7f0e".into(),
                "#2ca02c".into(),
                "#d62728".into(),
                "#9467bd".into(),
                "#8c564b".into(),
                "#e377c2".into(),
                "#7f7f7f".into(),
                "#bcbd22".into(),
                "#17becf".into(),
            ],
            background_color: "#ffffff".into(),
            grid_color: "#ecf0f1".into(),
            text_color: "#2c3e50".into(),
            font_family: "system-ui, -apple-system, 'Segoe UI', Arial, sans-serif".into(),
            font_size: 12,
            decimals: 1,
        }
    }
}

impl ChartStyle {
    pub fn width(mut self, width: u32) -> Self {
        self.width = width;
        self
    }

    pub fn height(mut self, height: u32) -> Self {
        self.height = height;
        self
    }

    pub fn decimals(mut self, decimals: u32) -> Self {
        self.decimals = decimals;
        self
    }

    /// Palette color for series/slice `index`
    pub fn color(&self, index: usize) -> &str {
        if self.palette.is_empty() {
            return "#1f77b4";
        }
        &self.palette[index % self.palette.len()]
    }

    fn total_width(&self) -> u32 {
        self.width + self.padding * 2
    }

    fn total_height(&self) -> u32 {
        self.height + self.padding * 2
    }
}

/// Serialize an SVG document to a string
pub(crate) fn write_svg(document: &svg::Document) -> Result<String, RenderError> {
    let mut output = Vec::new();
    svg::write(&mut output, document)
        .map_err(|e| RenderError::Format(format!("Failed to write SVG: {}", e)))?;
    String::from_utf8(output).map_err(|e| RenderError::Format(format!("Invalid UTF-8: {}", e)))
}

/// Round to `decimals` places and print with exactly that many
pub fn format_value(value: f64, decimals: u32) -> String {
    let rounded = round_to(value, decimals);
    format!("{:.*}", decimals as usize, rounded)
}

/// Escape text for HTML content and attributes
pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Truncate a string with ellipsis
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        format!(
            "{}…",
            s.chars().take(max.saturating_sub(1)).collect::<String>()
        )
    }
}
