//! Standalone HTML dashboard page
//!
//! Generates one self-contained HTML file with inline CSS and SVG charts.
//! The page is arranged according to the report's layout:
//! - `single`: overview and comparison stacked on one page
//! - `tabs`: "overview" and "comparison" tabs (CSS only, no script)
//! - `sidebar`: active filters in a side panel beside the main column
//!
//! A prompt outcome renders only the prompt; [`HtmlReportRenderer::error_page`]
//! renders only an error message.

use surveydash_core::chart::ComparisonMatrix;
use surveydash_core::{
    Layout, MetricSection, Ranking, RecordTable, RenderError, Renderer, Report,
};

use crate::charts::{BarChartRenderer, PieChartRenderer, TrendChartRenderer};
use crate::{format_value, html_escape, ChartStyle};

/// HTML report renderer configuration
#[derive(Clone, Debug, Default)]
pub struct HtmlReportRenderer {
    /// Style shared by the embedded charts
    pub chart_style: ChartStyle,
    /// Overrides the configured layout
    pub layout: Option<Layout>,
}

impl HtmlReportRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layout(mut self, layout: Layout) -> Self {
        self.layout = Some(layout);
        self
    }

    pub fn chart_style(mut self, style: ChartStyle) -> Self {
        self.chart_style = style;
        self
    }

    /// Page showing nothing but an error message
    pub fn error_page(title: &str, message: &str, right_to_left: bool) -> String {
        page(
            title,
            right_to_left,
            &format!(
                r#"<div class="message error">{}</div>"#,
                html_escape(message)
            ),
        )
    }

    fn style_for(&self, report: &Report) -> ChartStyle {
        self.chart_style.clone().decimals(report.config.decimals)
    }

    // ------------------------------------------------------------------------
    // Overview
    // ------------------------------------------------------------------------

    fn overview(&self, report: &Report) -> Result<String, RenderError> {
        let trend = TrendChartRenderer::new().style(self.style_for(report));
        let mut html = String::new();
        for section in report.sections() {
            html.push_str(&format!(
                "<section class=\"metric\">\n<h2>{}</h2>\n",
                html_escape(&section.metric)
            ));
            html.push_str(&chart_or_note(trend.render_series(&section.trend)?));
            html.push_str(&ranking_table(&section.ranking, report.config.decimals));
            html.push_str("</section>\n");
        }
        Ok(html)
    }

    // ------------------------------------------------------------------------
    // Comparison
    // ------------------------------------------------------------------------

    fn comparison(&self, report: &Report) -> Result<String, RenderError> {
        let bars = BarChartRenderer::new().style(self.style_for(report));
        let mut html = String::new();
        for section in report.sections() {
            html.push_str(&self.comparison_section(&bars, section, report.config.decimals)?);
        }

        if let Some(share) = &report.share {
            let pie = PieChartRenderer::new().style(self.style_for(report));
            if let Some(svg) = pie.render_chart(share)? {
                html.push_str(&format!(
                    "<section class=\"share\">\n<h2>{}</h2>\n<div class=\"chart\">{}</div>\n</section>\n",
                    html_escape(&share.column),
                    svg
                ));
            }
        }

        html.push_str(&preview_table(&report.filtered, report.config.preview_rows));
        Ok(html)
    }

    fn comparison_section(
        &self,
        bars: &BarChartRenderer,
        section: &MetricSection,
        decimals: u32,
    ) -> Result<String, RenderError> {
        let mut html = format!(
            "<section class=\"metric\">\n<h2>{}</h2>\n",
            html_escape(&section.metric)
        );
        html.push_str(&chart_or_note(bars.render_series(&section.bars)?));
        html.push_str(&matrix_table(&section.comparison, decimals));
        html.push_str("</section>\n");
        Ok(html)
    }

    // ------------------------------------------------------------------------
    // Layouts
    // ------------------------------------------------------------------------

    fn arrange(&self, report: &Report, overview: &str, comparison: &str) -> String {
        let notice = report
            .notice()
            .map(|n| format!("<div class=\"message success\">{}</div>\n", html_escape(n)))
            .unwrap_or_default();

        match self.layout.unwrap_or(report.config.layout) {
            Layout::Single => format!(
                "<main>\n{overview}{comparison}{notice}</main>",
                overview = overview,
                comparison = comparison,
                notice = notice
            ),
            Layout::Tabs => format!(
                r#"<main class="tabs">
<input type="radio" name="tab" id="tab-overview" checked>
<label for="tab-overview">סקירה</label>
<input type="radio" name="tab" id="tab-comparison">
<label for="tab-comparison">השוואה</label>
<div class="panel" id="panel-overview">
{overview}</div>
<div class="panel" id="panel-comparison">
{comparison}</div>
{notice}</main>"#,
                overview = overview,
                comparison = comparison,
                notice = notice
            ),
            Layout::Sidebar => format!(
                "<div class=\"with-sidebar\">\n<aside>\n{filters}</aside>\n<main>\n{overview}{comparison}{notice}</main>\n</div>",
                filters = filter_summary(report),
                overview = overview,
                comparison = comparison,
                notice = notice
            ),
        }
    }
}

impl Renderer for HtmlReportRenderer {
    type Output = String;

    fn render(&self, report: &Report) -> Result<String, RenderError> {
        let config = &report.config;
        if let Some(prompt) = report.prompt() {
            let body = format!(r#"<div class="message info">{}</div>"#, html_escape(prompt));
            return Ok(page(&config.title, config.right_to_left, &body));
        }

        let overview = self.overview(report)?;
        let comparison = self.comparison(report)?;
        let body = self.arrange(report, &overview, &comparison);
        Ok(page(&config.title, config.right_to_left, &body))
    }
}

// ============================================================================
// Fragments
// ============================================================================

fn chart_or_note(svg: Option<String>) -> String {
    match svg {
        Some(svg) => format!("<div class=\"chart\">{}</div>\n", svg),
        None => "<p class=\"empty\">אין נתונים להצגה</p>\n".to_string(),
    }
}

fn ranking_table(ranking: &Ranking, decimals: u32) -> String {
    if ranking.is_empty() {
        return String::new();
    }
    let caption = match ranking.year {
        Some(year) => format!("{} ({})", html_escape(&ranking.metric), year),
        None => html_escape(&ranking.metric),
    };
    let mut html = format!("<table class=\"ranking\">\n<caption>{}</caption>\n", caption);
    for row in &ranking.rows {
        let bar = row
            .bar_percent
            .map(|p| format!("<div class=\"bar\" style=\"width: {}%\"></div>", p))
            .unwrap_or_default();
        html.push_str(&format!(
            "<tr class=\"{class}\"><td class=\"marker\">{marker}</td><td>{label}</td><td class=\"value\">{value}</td><td class=\"bar-cell\">{bar}</td></tr>\n",
            class = row.decoration.css_class(),
            marker = row.decoration.marker(),
            label = html_escape(&row.label),
            value = format_value(row.value, decimals),
            bar = bar
        ));
    }
    html.push_str("</table>\n");
    html
}

fn matrix_table(matrix: &ComparisonMatrix, decimals: u32) -> String {
    if matrix.is_empty() {
        return String::new();
    }
    let mut html = String::from("<table class=\"matrix\">\n<tr><th></th>");
    for year in &matrix.years {
        html.push_str(&format!("<th>{}</th>", year));
    }
    html.push_str("</tr>\n");
    for row in &matrix.rows {
        html.push_str(&format!("<tr><th>{}</th>", html_escape(&row.locality)));
        for value in &row.values {
            match value {
                Some(v) => html.push_str(&format!("<td>{}</td>", format_value(*v, decimals))),
                None => html.push_str("<td class=\"missing\"></td>"),
            }
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</table>\n");
    html
}

fn preview_table(table: &RecordTable, limit: usize) -> String {
    let mut html = format!(
        "<section class=\"preview\">\n<h2>נתונים מסוננים ({} שורות)</h2>\n<div class=\"scroll\"><table class=\"data\">\n<tr>",
        table.len()
    );
    for name in table.columns() {
        html.push_str(&format!("<th>{}</th>", html_escape(name)));
    }
    html.push_str("</tr>\n");
    for row in table.rows().iter().take(limit) {
        html.push_str("<tr>");
        for cell in row {
            let text = cell.display().unwrap_or_default();
            html.push_str(&format!("<td>{}</td>", html_escape(&text)));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</table></div>\n</section>\n");
    html
}

fn filter_summary(report: &Report) -> String {
    let selection = &report.selection;
    let list = |items: Vec<String>| -> String {
        if items.is_empty() {
            "<li class=\"all\">הכל</li>".to_string()
        } else {
            items
                .iter()
                .map(|i| format!("<li>{}</li>", html_escape(i)))
                .collect()
        }
    };

    let mut html = String::new();
    html.push_str(&format!(
        "<h3>מדדים</h3>\n<ul>{}</ul>\n",
        list(selection.metrics.clone())
    ));
    html.push_str(&format!(
        "<h3>רשויות</h3>\n<ul>{}</ul>\n",
        list(selection.localities.clone())
    ));
    html.push_str(&format!(
        "<h3>שנים</h3>\n<ul>{}</ul>\n",
        list(selection.years.iter().map(ToString::to_string).collect())
    ));
    if let Some(term) = selection.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        html.push_str(&format!(
            "<h3>חיפוש</h3>\n<p class=\"search\">{}</p>\n",
            html_escape(term)
        ));
    }
    html.push_str(&format!(
        "<p class=\"count\">{} שורות</p>\n",
        report.filtered.len()
    ));
    html
}

// ============================================================================
// Page
// ============================================================================

fn page(title: &str, right_to_left: bool, body: &str) -> String {
    let dir = if right_to_left { "rtl" } else { "ltr" };
    let lang = if right_to_left { "he" } else { "en" };
    format!(
        r#"<!DOCTYPE html>
<html lang="{lang}" dir="{dir}">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>
{css}
    </style>
</head>
<body>
<h1>{title}</h1>
{body}
</body>
</html>
"#,
        lang = lang,
        dir = dir,
        title = html_escape(title),
        css = CSS,
        body = body
    )
}

const CSS: &str = r#"        body { font-family: system-ui, -apple-system, 'Segoe UI', Arial, sans-serif; margin: 24px; color: #2c3e50; }
        h1 { font-size: 1.6em; }
        h2 { font-size: 1.2em; border-bottom: 1px solid #ecf0f1; padding-bottom: 4px; }
        .message { padding: 12px 16px; border-radius: 6px; margin: 16px 0; }
        .message.info { background: #e8f4fd; border: 1px solid #b6dcf7; }
        .message.success { background: #eafaf1; border: 1px solid #abebc6; }
        .message.error { background: #fdedec; border: 1px solid #f5b7b1; color: #922b21; }
        .chart svg { max-width: 100%; height: auto; }
        table { border-collapse: collapse; margin: 12px 0; }
        td, th { padding: 4px 10px; border-bottom: 1px solid #ecf0f1; }
        .ranking .value { font-variant-numeric: tabular-nums; }
        .ranking .bar-cell { width: 240px; }
        .ranking .bar { height: 12px; background: #1f77b4; border-radius: 3px; }
        .ranking tr.declining .bar, .ranking tr.lower .bar { background: #d62728; }
        .matrix td.missing { background: #f8f9fa; }
        .scroll { overflow-x: auto; }
        .empty { color: #7f8c8d; }
        .tabs > input { display: none; }
        .tabs > label { display: inline-block; padding: 8px 16px; cursor: pointer; border: 1px solid #ecf0f1; border-bottom: none; }
        .tabs > input:checked + label { background: #ecf0f1; font-weight: bold; }
        .tabs .panel { display: none; border-top: 1px solid #ecf0f1; }
        #tab-overview:checked ~ #panel-overview, #tab-comparison:checked ~ #panel-comparison { display: block; }
        .with-sidebar { display: flex; gap: 24px; }
        .with-sidebar aside { flex: 0 0 220px; background: #f8f9fa; padding: 12px; border-radius: 6px; }
        .with-sidebar main { flex: 1; min-width: 0; }"#;

#[cfg(test)]
mod tests {
    use super::*;
    use surveydash_core::{CellValue, ReportConfig, Selection};

    fn config(layout: Layout) -> ReportConfig {
        ReportConfig {
            year_column: "year".into(),
            locality_column: "town".into(),
            title: "Survey <2021>".into(),
            layout,
            ..ReportConfig::default()
        }
    }

    fn table() -> RecordTable {
        let mut t = RecordTable::new(vec!["town".into(), "year".into(), "score".into()]);
        for (town, year, score) in [("A", 2020.0, 10.0), ("B", 2020.0, 30.0), ("A", 2021.0, 20.0)] {
            t.push_row(vec![town.into(), year.into(), CellValue::Number(score)])
                .unwrap();
        }
        t
    }

    fn render(layout: Layout, selection: &Selection) -> String {
        let report = Report::build(&table(), &config(layout), selection).unwrap();
        HtmlReportRenderer::new().render(&report).unwrap()
    }

    #[test]
    fn prompt_page_has_nothing_else() {
        let html = render(Layout::Tabs, &Selection::new());
        assert!(html.contains("בחר מדד אחד לפחות להצגה."));
        assert!(!html.contains("<svg"));
        assert!(!html.contains("<table"));
    }

    #[test]
    fn page_is_right_to_left_and_escaped() {
        let html = render(Layout::Single, &Selection::new().metric("score"));
        assert!(html.contains(r#"dir="rtl""#));
        assert!(html.contains("Survey &lt;2021&gt;"));
        assert!(html.contains("הנתונים מוצגים לפי בחירתך"));
    }

    #[test]
    fn tabs_layout_has_both_panels() {
        let html = render(Layout::Tabs, &Selection::new().metric("score"));
        assert!(html.contains("panel-overview"));
        assert!(html.contains("panel-comparison"));
        assert!(!html.contains("<aside>"));
    }

    #[test]
    fn sidebar_lists_active_filters() {
        let html = render(
            Layout::Sidebar,
            &Selection::new().metric("score").locality("A").search("  "),
        );
        assert!(html.contains("<aside>"));
        assert!(html.contains("<li>A</li>"));
        assert!(!html.contains("חיפוש"));
    }

    #[test]
    fn ranking_rows_carry_markers_and_bars() {
        let html = render(Layout::Single, &Selection::new().metric("score"));
        assert!(html.contains("🥇"));
        assert!(html.contains("width: 100%"));
        assert!(html.contains("<td class=\"value\">20.0</td>"));
    }

    #[test]
    fn empty_filter_result_renders_notes_not_charts() {
        let html = render(
            Layout::Single,
            &Selection::new().metric("score").search("nothing matches this"),
        );
        assert!(!html.contains("<svg"));
        assert!(html.contains("אין נתונים להצגה"));
        assert!(html.contains("(0 שורות)"));
    }

    #[test]
    fn preview_is_capped() {
        let cfg = ReportConfig {
            preview_rows: 1,
            ..config(Layout::Single)
        };
        let report = Report::build(&table(), &cfg, &Selection::new().metric("score")).unwrap();
        let html = HtmlReportRenderer::new().render(&report).unwrap();
        let preview = &html[html.find("class=\"data\"").unwrap()..];
        assert_eq!(preview.matches("<td>").count(), 3);
    }

    #[test]
    fn error_page_shows_only_the_message() {
        let html = HtmlReportRenderer::error_page("t", "The file must include the columns 'שנה'", true);
        assert!(html.contains("message error"));
        assert!(html.contains("&#39;") || html.contains("'שנה'"));
        assert!(!html.contains("<table"));
    }
}
