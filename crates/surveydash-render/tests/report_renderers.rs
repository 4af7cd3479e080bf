//! Integration tests for the report-level renderers

use surveydash_core::{CellValue, Layout, RecordTable, Renderer, Report, ReportConfig, Selection};
use surveydash_render::{
    BarChartRenderer, HtmlReportRenderer, PieChartRenderer, TextRenderer, TrendChartRenderer,
};

fn config() -> ReportConfig {
    ReportConfig {
        year_column: "year".into(),
        locality_column: "town".into(),
        ..ReportConfig::default()
    }
}

fn survey() -> RecordTable {
    let mut t = RecordTable::new(vec![
        "town".into(),
        "year".into(),
        "district".into(),
        "score".into(),
        "trust".into(),
    ]);
    let rows = [
        ("A", 2019.0, "north", 3.0, 1.0),
        ("A", 2020.0, "north", 4.0, 2.0),
        ("B", 2020.0, "south", 6.0, 2.5),
        ("C", 2020.0, "south", 5.0, 3.0),
        ("D", 2020.0, "centre", 2.0, 1.5),
    ];
    for (town, year, district, score, trust) in rows {
        t.push_row(vec![
            town.into(),
            year.into(),
            district.into(),
            CellValue::Number(score),
            CellValue::Number(trust),
        ])
        .unwrap();
    }
    t
}

#[test]
fn every_chart_renders_for_a_populated_report() {
    let report = Report::build(
        &survey(),
        &config(),
        &Selection::new().metrics(["score", "trust"]).chart_metric("trust"),
    )
    .unwrap();

    let trend = TrendChartRenderer::new().render(&report).unwrap().unwrap();
    assert!(trend.contains("trust"));
    assert_eq!(trend.matches("<circle").count(), 2);

    let bars = BarChartRenderer::new().render(&report).unwrap().unwrap();
    assert!(bars.contains("trust (2020)"));

    let pie = PieChartRenderer::new().render(&report).unwrap().unwrap();
    assert!(pie.contains("district"));
}

#[test]
fn empty_filtered_table_renders_nothing_and_raises_nothing() {
    let report = Report::build(
        &survey(),
        &config(),
        &Selection::new().metric("score").locality("Nowhere"),
    )
    .unwrap();
    assert!(report.filtered.is_empty());

    assert!(TrendChartRenderer::new().render(&report).unwrap().is_none());
    assert!(BarChartRenderer::new().render(&report).unwrap().is_none());
    assert!(PieChartRenderer::new().render(&report).unwrap().is_none());
    assert!(HtmlReportRenderer::new().render(&report).is_ok());
    assert!(TextRenderer::new().render(&report).unwrap().contains("(no data)"));
}

#[test]
fn prompt_report_renders_no_charts() {
    let report = Report::build(&survey(), &config(), &Selection::new()).unwrap();
    assert!(TrendChartRenderer::new().render(&report).unwrap().is_none());
    assert!(PieChartRenderer::new().render(&report).unwrap().is_none());
    let text = TextRenderer::new().render(&report).unwrap();
    assert_eq!(text.trim(), "בחר מדד אחד לפחות להצגה.");
}

#[test]
fn layout_override_beats_config() {
    let report = Report::build(&survey(), &config(), &Selection::new().metric("score")).unwrap();
    let html = HtmlReportRenderer::new()
        .layout(Layout::Sidebar)
        .render(&report)
        .unwrap();
    assert!(html.contains("<aside>"));
}

#[test]
fn text_report_lists_sections_in_order() {
    let report = Report::build(
        &survey(),
        &config(),
        &Selection::new().metrics(["trust", "score"]),
    )
    .unwrap();
    let text = TextRenderer::new().render(&report).unwrap();
    let trust = text.find("trust (2020)").unwrap();
    let score = text.find("score (2020)").unwrap();
    assert!(trust < score);
    assert!(text.contains("הנתונים מוצגים לפי בחירתך"));
}
