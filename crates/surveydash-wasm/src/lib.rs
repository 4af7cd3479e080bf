//! WebAssembly bindings for the surveydash dashboard
//!
//! The browser page drives a single [`Dashboard`]: it hands over the
//! spreadsheet bytes once, then every control change updates the selection
//! and the page asks for fresh HTML, charts, or an export. Each request
//! reruns the pipeline from the loaded table, which is never modified.

use serde::Deserialize;
use wasm_bindgen::prelude::*;

use surveydash_core::{
    DatasetSummary, Layout, RecordTable, Renderer, Report, ReportConfig, Selection, Year,
};
use surveydash_loader::{load_bytes, validate_schema};
use surveydash_render::{
    BarChartRenderer, ExcelExporter, HtmlReportRenderer, PieChartRenderer, TrendChartRenderer,
    XLSX_MIME,
};

/// Initialize panic hook for better error messages in console
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Selection controls as sent from JavaScript; missing fields keep their
/// current value
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SelectionUpdate {
    metrics: Option<Vec<String>>,
    localities: Option<Vec<String>>,
    years: Option<Vec<Year>>,
    search: Option<String>,
    chart_metric: Option<String>,
}

// ============================================================================
// Dashboard Class
// ============================================================================

/// Interactive survey dashboard for the browser
#[wasm_bindgen]
pub struct Dashboard {
    config: ReportConfig,
    table: Option<RecordTable>,
    selection: Selection,
    /// Overrides the configured layout
    layout: Option<Layout>,
    last_error: Option<String>,
}

#[wasm_bindgen]
impl Dashboard {
    /// Create a dashboard with the default settings
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            config: ReportConfig::default(),
            table: None,
            selection: Selection::new(),
            layout: None,
            last_error: None,
        }
    }

    /// Replace the settings with a TOML document
    ///
    /// Returns `false` and records the error when the document is invalid;
    /// the previous settings stay in effect.
    pub fn load_config(&mut self, toml: &str) -> bool {
        match ReportConfig::from_toml_str(toml) {
            Ok(config) => {
                self.config = config;
                self.last_error = None;
                true
            }
            Err(e) => {
                self.last_error = Some(e.to_string());
                false
            }
        }
    }

    /// Load a spreadsheet and reset the selection
    ///
    /// Returns `false` when the file cannot be read or lacks the year and
    /// locality columns; [`Dashboard::last_error`] then holds the message.
    pub fn load(&mut self, bytes: Vec<u8>) -> bool {
        self.selection = Selection::new();
        match self.load_internal(bytes) {
            Ok(table) => {
                self.table = Some(table);
                self.last_error = None;
                true
            }
            Err(e) => {
                self.table = None;
                self.last_error = Some(e);
                false
            }
        }
    }

    /// Check if a dataset is loaded
    pub fn has_data(&self) -> bool {
        self.table.is_some()
    }

    pub fn set_metrics(&mut self, metrics: Vec<String>) {
        let current = std::mem::take(&mut self.selection);
        self.selection = Selection {
            metrics: Vec::new(),
            ..current
        }
        .metrics(metrics);
    }

    pub fn set_localities(&mut self, localities: Vec<String>) {
        let current = std::mem::take(&mut self.selection);
        self.selection = Selection {
            localities: Vec::new(),
            ..current
        }
        .localities(localities);
    }

    pub fn set_years(&mut self, years: Vec<Year>) {
        let current = std::mem::take(&mut self.selection);
        self.selection = Selection {
            years: Vec::new(),
            ..current
        }
        .years(years);
    }

    /// Free-text filter; an empty string clears it
    pub fn set_search(&mut self, term: &str) {
        self.selection.search = Some(term.to_string()).filter(|t| !t.trim().is_empty());
    }

    /// Metric for the single-chart views; an empty string means the first
    /// selected metric
    pub fn set_chart_metric(&mut self, metric: &str) {
        self.selection.chart_metric = Some(metric.to_string()).filter(|m| !m.is_empty());
    }

    /// Set the page layout ("single", "tabs", "sidebar")
    pub fn set_layout(&mut self, layout: &str) -> bool {
        match layout.parse::<Layout>() {
            Ok(layout) => {
                self.layout = Some(layout);
                true
            }
            Err(e) => {
                self.last_error = Some(e.to_string());
                false
            }
        }
    }

    /// Apply several selection changes from a JavaScript object
    ///
    /// Unknown or malformed input leaves the selection unchanged.
    pub fn set_selection(&mut self, update: JsValue) {
        let update: SelectionUpdate = serde_wasm_bindgen::from_value(update).unwrap_or_default();
        self.apply_update(update);
    }

    /// Columns, metrics, localities and years of the loaded dataset as JSON
    pub fn columns_json(&self) -> String {
        self.table
            .as_ref()
            .map(|table| {
                let summary = DatasetSummary::of(table, &self.config.key_columns());
                serde_json::to_string(&summary).unwrap_or_default()
            })
            .unwrap_or_default()
    }

    /// Current selection as JSON
    pub fn selection_json(&self) -> String {
        serde_json::to_string(&self.selection).unwrap_or_default()
    }

    /// Latest-year ranking of one metric under the current filters, as JSON
    pub fn ranking_json(&mut self, metric: &str) -> String {
        let selection = Selection {
            metrics: Vec::new(),
            chart_metric: None,
            ..self.selection.clone()
        }
        .metric(metric);

        self.build_with(&selection)
            .and_then(|report| {
                report
                    .sections()
                    .first()
                    .and_then(|s| serde_json::to_string(&s.ranking).ok())
            })
            .unwrap_or_default()
    }

    /// Render the full dashboard page
    ///
    /// Selection and schema errors render as a page holding only the
    /// error message.
    pub fn render_html(&mut self) -> String {
        let result = self.build().ok_or_else(|| self.last_error.clone());
        let rendered = match result {
            Ok(report) => {
                let mut renderer = HtmlReportRenderer::new();
                if let Some(layout) = self.layout {
                    renderer = renderer.layout(layout);
                }
                renderer.render(&report).map_err(|e| Some(e.to_string()))
            }
            Err(message) => Err(message),
        };
        match rendered {
            Ok(html) => html,
            Err(message) => {
                let message = message.unwrap_or_default();
                self.last_error = Some(message.clone());
                HtmlReportRenderer::error_page(
                    &self.config.title,
                    &message,
                    self.config.right_to_left,
                )
            }
        }
    }

    /// Trend line of the chart metric; empty when there is nothing to draw
    pub fn render_trend_svg(&mut self) -> String {
        self.render_chart(&TrendChartRenderer::new())
    }

    /// Latest-year bars of the chart metric; empty when there is nothing to draw
    pub fn render_bar_svg(&mut self) -> String {
        self.render_chart(&BarChartRenderer::new())
    }

    /// Share pie; empty when there is nothing to draw
    pub fn render_pie_svg(&mut self) -> String {
        self.render_chart(&PieChartRenderer::new())
    }

    /// Filtered rows as an XLSX workbook; empty on error
    pub fn export_xlsx(&mut self) -> Vec<u8> {
        let Some(report) = self.build() else {
            return Vec::new();
        };
        match ExcelExporter::new().render(&report) {
            Ok(bytes) => bytes,
            Err(e) => {
                self.last_error = Some(e.to_string());
                Vec::new()
            }
        }
    }

    /// Download name for [`Dashboard::export_xlsx`]
    pub fn export_file_name(&self) -> String {
        self.config.export_file_name.clone()
    }

    /// MIME type for [`Dashboard::export_xlsx`]
    pub fn export_mime(&self) -> String {
        XLSX_MIME.to_string()
    }

    /// Get the last error message
    pub fn last_error(&self) -> Option<String> {
        self.last_error.clone()
    }
}

// Non-WASM methods for internal use and testing
impl Dashboard {
    fn load_internal(&self, bytes: Vec<u8>) -> Result<RecordTable, String> {
        let table = load_bytes(bytes).map_err(|e| e.to_string())?;
        validate_schema(&table, &self.config.key_columns()).map_err(|e| e.to_string())?;
        Ok(table)
    }

    fn apply_update(&mut self, update: SelectionUpdate) {
        if let Some(metrics) = update.metrics {
            self.set_metrics(metrics);
        }
        if let Some(localities) = update.localities {
            self.set_localities(localities);
        }
        if let Some(years) = update.years {
            self.set_years(years);
        }
        if let Some(term) = update.search {
            self.set_search(&term);
        }
        if let Some(metric) = update.chart_metric {
            self.set_chart_metric(&metric);
        }
    }

    fn build(&mut self) -> Option<Report> {
        let selection = self.selection.clone();
        self.build_with(&selection)
    }

    /// Run the pipeline, recording any failure in `last_error`
    fn build_with(&mut self, selection: &Selection) -> Option<Report> {
        let Some(table) = &self.table else {
            self.last_error = Some("No dataset loaded".to_string());
            return None;
        };
        match Report::build(table, &self.config, selection) {
            Ok(report) => {
                self.last_error = None;
                Some(report)
            }
            Err(e) => {
                self.last_error = Some(e.to_string());
                None
            }
        }
    }

    fn render_chart<R>(&mut self, renderer: &R) -> String
    where
        R: Renderer<Output = Option<String>>,
    {
        let Some(report) = self.build() else {
            return String::new();
        };
        match renderer.render(&report) {
            Ok(svg) => svg.unwrap_or_default(),
            Err(e) => {
                self.last_error = Some(e.to_string());
                String::new()
            }
        }
    }
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new()
    }
}
