//! End-to-end properties of the reporting pipeline
//!
//! These tests drive filter, aggregation, ranking and report assembly
//! together over a small municipal survey table.

use pretty_assertions::assert_eq;
use surveydash_core::aggregate::group_mean;
use surveydash_core::rank::{rank, DecorationScheme};
use surveydash_core::{
    CellValue, Decoration, FilterCriteria, RankedRow, RecordTable, Report, ReportConfig,
    ReportError, ReportOutcome, SchemaError, Selection,
};

const YEAR: &str = "שנה";
const LOCALITY: &str = "שם  הרשות";

// =============================================================================
// Fixtures
// =============================================================================

fn survey() -> RecordTable {
    let mut t = RecordTable::new(vec![
        LOCALITY.to_string(),
        YEAR.to_string(),
        "מחוז".to_string(),
        "שביעות רצון".to_string(),
        "אמון".to_string(),
    ]);
    let rows: [(&str, f64, &str, Option<f64>, f64); 10] = [
        ("חיפה", 2020.0, "צפון", Some(70.0), 3.0),
        ("חיפה", 2021.0, "צפון", Some(74.0), 3.5),
        ("אילת", 2021.0, "דרום", Some(81.0), 4.0),
        ("עכו", 2021.0, "צפון", Some(60.0), 2.0),
        ("רהט", 2021.0, "דרום", None, 2.5),
        ("רהט", 2021.0, "דרום", Some(55.0), 2.5),
        ("נתניה", 2021.0, "מרכז", Some(66.0), 3.0),
        ("נתניה", 2020.0, "מרכז", Some(62.0), 3.0),
        ("צפת", 2021.0, "צפון", Some(58.0), 2.0),
        ("אשדוד", 2021.0, "דרום", Some(73.0), 3.0),
    ];
    for (town, year, district, satisfaction, trust) in rows {
        t.push_row(vec![
            town.into(),
            year.into(),
            district.into(),
            satisfaction.map_or(CellValue::Empty, CellValue::Number),
            trust.into(),
        ])
        .unwrap();
    }
    t
}

fn config() -> ReportConfig {
    ReportConfig::default()
}

// =============================================================================
// Filtering
// =============================================================================

#[test]
fn filtered_count_is_bounded_for_every_combination() {
    let table = survey();
    let keys = config().key_columns();
    let localities = [vec![], vec!["חיפה"], vec!["חיפה", "אילת"]];
    let years = [vec![], vec![2020], vec![2020, 2021]];
    let searches = [None, Some("צפון"), Some("  ")];

    for l in &localities {
        for y in &years {
            for s in &searches {
                let mut criteria = FilterCriteria::new()
                    .localities(l.iter().copied())
                    .years(y.iter().copied());
                if let Some(term) = s {
                    criteria = criteria.search(*term);
                }
                let out = criteria.apply(&table, &keys);
                assert!(out.len() <= table.len());
                if criteria.is_unrestricted() {
                    assert_eq!(out.len(), table.len());
                }
            }
        }
    }
}

// =============================================================================
// Aggregation and ranking
// =============================================================================

#[test]
fn one_aggregate_row_per_locality_with_values() {
    let table = survey();
    let rows = group_mean(&table, &[LOCALITY], "שביעות רצון").unwrap();
    assert_eq!(rows.len(), 7);
    let rahat = rows.iter().find(|r| r.label() == "רהט").unwrap();
    assert_eq!(rahat.value, 55.0);
    assert_eq!(rahat.count, 1);
}

#[test]
fn re_ranking_a_ranked_set_is_stable() {
    let table = survey();
    let rows = group_mean(&table, &[LOCALITY], "אמון").unwrap();
    let once = rank(&rows, DecorationScheme::Medals);
    let again: Vec<_> = once.iter().map(RankedRow::to_aggregate).collect();
    assert_eq!(rank(&again, DecorationScheme::Medals), once);
}

#[test]
fn seven_localities_get_medals_plain_and_declining() {
    let report = Report::build(&survey(), &config(), &Selection::new().metric("שביעות רצון"))
        .unwrap();
    let ranking = &report.sections()[0].ranking;
    assert_eq!(ranking.year, Some(2021));

    let summary: Vec<(&str, Decoration)> = ranking
        .rows
        .iter()
        .map(|r| (r.label.as_str(), r.decoration))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("אילת", Decoration::Gold),
            ("חיפה", Decoration::Silver),
            ("אשדוד", Decoration::Bronze),
            ("נתניה", Decoration::Plain(4)),
            ("עכו", Decoration::Declining),
            ("צפת", Decoration::Declining),
            ("רהט", Decoration::Declining),
        ]
    );
    assert_eq!(ranking.rows[0].bar_percent, Some(100));
    // 55 / 81 = 67.9%
    assert_eq!(ranking.rows[6].bar_percent, Some(68));
}

#[test]
fn halves_scheme_marks_upper_and_lower() {
    let cfg = ReportConfig {
        decorations: DecorationScheme::Halves,
        ..config()
    };
    let report = Report::build(&survey(), &cfg, &Selection::new().metric("אמון")).unwrap();
    let marks: Vec<Decoration> = report.sections()[0]
        .ranking
        .rows
        .iter()
        .map(|r| r.decoration)
        .collect();
    assert_eq!(marks.len(), 7);
    assert!(marks[..4].iter().all(|d| *d == Decoration::Upper));
    assert!(marks[4..].iter().all(|d| *d == Decoration::Lower));
}

// =============================================================================
// Report outcomes
// =============================================================================

#[test]
fn the_prompt_replaces_every_section() {
    let report = Report::build(&survey(), &config(), &Selection::new()).unwrap();
    assert!(matches!(report.outcome, ReportOutcome::Prompt(_)));
    assert_eq!(report.prompt(), Some("בחר מדד אחד לפחות להצגה."));
}

#[test]
fn single_space_locality_header_is_a_schema_error() {
    let mut t = RecordTable::new(vec!["שם הרשות".into(), YEAR.into(), "x".into()]);
    t.push_row(vec!["חיפה".into(), 2021.0.into(), 1.0.into()])
        .unwrap();
    let err = Report::build(&t, &config(), &Selection::new().metric("x")).unwrap_err();
    assert_eq!(
        err,
        ReportError::Schema(SchemaError::MissingColumns(vec![LOCALITY.into()]))
    );
}

#[test]
fn four_metrics_exceed_the_default_limit() {
    let mut t = RecordTable::new(vec![
        LOCALITY.into(),
        YEAR.into(),
        "a".into(),
        "b".into(),
        "c".into(),
        "d".into(),
    ]);
    t.push_row(vec![
        "חיפה".into(),
        2021.0.into(),
        1.0.into(),
        2.0.into(),
        3.0.into(),
        4.0.into(),
    ])
    .unwrap();
    let err = Report::build(&t, &config(), &Selection::new().metrics(["a", "b", "c", "d"]))
        .unwrap_err();
    assert_eq!(err, ReportError::TooManyMetrics { selected: 4, max: 3 });
}

#[test]
fn comparison_matrix_covers_filtered_years() {
    let selection = Selection::new()
        .metric("שביעות רצון")
        .localities(["חיפה", "נתניה"]);
    let report = Report::build(&survey(), &config(), &selection).unwrap();
    let matrix = &report.sections()[0].comparison;
    assert_eq!(matrix.years, vec![2020, 2021]);
    let haifa = matrix.rows.iter().find(|r| r.locality == "חיפה").unwrap();
    assert_eq!(haifa.values, vec![Some(70.0), Some(74.0)]);
}
