//! # surveydash-core
//!
//! Core domain model and reporting pipeline for the surveydash dashboard.
//!
//! This crate provides:
//! - Domain types: `CellValue`, `RecordTable`, `ColumnKind`, `GroupKey`
//! - Pipeline stages: filtering, group-by means, ranking, chart data
//! - Report assembly driven by a `Selection` and a `ReportConfig`
//! - Core trait: `Renderer`
//! - Error types
//!
//! ## Example
//!
//! ```rust
//! use surveydash_core::{CellValue, RecordTable, ReportConfig, Selection, Report};
//!
//! let config = ReportConfig::default();
//! let mut table = RecordTable::new(vec![
//!     config.locality_column.clone(),
//!     config.year_column.clone(),
//!     "satisfaction".to_string(),
//! ]);
//! table.push_row(vec![
//!     CellValue::Text("A".into()),
//!     CellValue::Number(2021.0),
//!     CellValue::Number(20.0),
//! ]).unwrap();
//!
//! let selection = Selection::new().metric("satisfaction");
//! let report = Report::build(&table, &config, &selection).unwrap();
//! assert_eq!(report.sections().len(), 1);
//! ```

pub mod aggregate;
pub mod chart;
pub mod config;
pub mod filter;
pub mod rank;
pub mod report;
pub mod summary;

pub use aggregate::{group_mean, round_to, AggregateError, AggregateRow};
pub use chart::{
    BarSeries, ComparisonMatrix, ShareChart, ShareMeasure, ShareSlice, TrendPoint, TrendSeries,
};
pub use config::{ConfigError, Layout, ReportConfig};
pub use filter::FilterCriteria;
pub use rank::{Decoration, DecorationScheme, RankedRow, Ranking};
pub use report::{MetricSection, Report, ReportError, ReportOutcome, Selection};
pub use summary::{ColumnInfo, DatasetSummary};

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use thiserror::Error;

// ============================================================================
// Type Aliases
// ============================================================================

/// Survey year
pub type Year = i32;

// ============================================================================
// Cells
// ============================================================================

/// A single spreadsheet cell
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
    Date(NaiveDateTime),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Numeric value, if the cell holds a finite number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) if n.is_finite() => Some(*n),
            _ => None,
        }
    }

    /// Year value: an integral number, or text holding an integer
    pub fn as_year(&self) -> Option<Year> {
        match self {
            CellValue::Number(n) if n.is_finite() && n.fract() == 0.0 => {
                Year::try_from(*n as i64).ok()
            }
            CellValue::Text(s) => s.trim().parse::<Year>().ok(),
            _ => None,
        }
    }

    /// String projection used by search and display.
    ///
    /// `Empty` has no projection and therefore never matches a search.
    pub fn display(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Number(n) => Some(format_number(*n)),
            CellValue::Text(s) => Some(s.clone()),
            CellValue::Bool(b) => Some(b.to_string()),
            CellValue::Date(dt) => Some(format_date(dt)),
        }
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

/// Format a number for display: integral values print without a decimal point
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

fn format_date(dt: &NaiveDateTime) -> String {
    if dt.time().num_seconds_from_midnight() == 0 {
        dt.format("%Y-%m-%d").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

// ============================================================================
// Group Keys
// ============================================================================

/// Value of a categorical grouping column.
///
/// Keys order numbers before text; numbers use the IEEE total order.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupKey {
    Number(f64),
    Text(String),
}

impl GroupKey {
    /// Key for a cell; empty cells do not belong to any group
    pub fn from_cell(cell: &CellValue) -> Option<Self> {
        match cell {
            CellValue::Empty => None,
            // -0.0 and 0.0 are one group
            CellValue::Number(n) if *n == 0.0 => Some(GroupKey::Number(0.0)),
            CellValue::Number(n) => Some(GroupKey::Number(*n)),
            other => other.display().map(GroupKey::Text),
        }
    }

    pub fn as_year(&self) -> Option<Year> {
        match self {
            GroupKey::Number(n) => CellValue::Number(*n).as_year(),
            GroupKey::Text(s) => s.trim().parse::<Year>().ok(),
        }
    }
}

impl PartialEq for GroupKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for GroupKey {}

impl PartialOrd for GroupKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GroupKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (GroupKey::Number(a), GroupKey::Number(b)) => a.total_cmp(b),
            (GroupKey::Number(_), GroupKey::Text(_)) => Ordering::Less,
            (GroupKey::Text(_), GroupKey::Number(_)) => Ordering::Greater,
            (GroupKey::Text(a), GroupKey::Text(b)) => a.cmp(b),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Number(n) => write!(f, "{}", format_number(*n)),
            GroupKey::Text(s) => write!(f, "{}", s),
        }
    }
}

// ============================================================================
// Columns
// ============================================================================

/// Inferred type of a column
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// At least one number, and every non-empty cell is a number
    Numeric,
    Date,
    Boolean,
    /// Text or mixed content
    Categorical,
    /// No non-empty cell at all
    Empty,
}

impl ColumnKind {
    /// Infer the kind from a column's cells
    pub fn infer<'a>(cells: impl IntoIterator<Item = &'a CellValue>) -> Self {
        let mut seen: Option<ColumnKind> = None;
        for cell in cells {
            let kind = match cell {
                CellValue::Empty => continue,
                CellValue::Number(_) => ColumnKind::Numeric,
                CellValue::Date(_) => ColumnKind::Date,
                CellValue::Bool(_) => ColumnKind::Boolean,
                CellValue::Text(_) => return ColumnKind::Categorical,
            };
            match seen {
                None => seen = Some(kind),
                Some(prev) if prev == kind => {}
                Some(_) => return ColumnKind::Categorical,
            }
        }
        seen.unwrap_or(ColumnKind::Empty)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ColumnKind::Numeric => "numeric",
            ColumnKind::Date => "date",
            ColumnKind::Boolean => "boolean",
            ColumnKind::Categorical => "categorical",
            ColumnKind::Empty => "empty",
        }
    }
}

/// The two columns every dataset must carry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyColumns {
    pub year: String,
    pub locality: String,
}

impl KeyColumns {
    pub fn new(year: impl Into<String>, locality: impl Into<String>) -> Self {
        Self {
            year: year.into(),
            locality: locality.into(),
        }
    }

    /// Check that both key columns exist, by exact name
    pub fn validate(&self, table: &RecordTable) -> Result<(), SchemaError> {
        let missing: Vec<String> = [&self.year, &self.locality]
            .into_iter()
            .filter(|name| !table.has_column(name))
            .cloned()
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::MissingColumns(missing))
        }
    }
}

// ============================================================================
// Record Table
// ============================================================================

/// Ordered, column-named table of cells.
///
/// Rows are aligned with `columns`. Once built, a table is only ever read;
/// every pipeline stage produces a new table or a derived value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordTable {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
    index: HashMap<String, usize>,
}

impl RecordTable {
    pub fn new(columns: Vec<String>) -> Self {
        let mut index = HashMap::with_capacity(columns.len());
        for (i, name) in columns.iter().enumerate() {
            index.entry(name.clone()).or_insert(i);
        }
        Self {
            columns,
            rows: Vec::new(),
            index,
        }
    }

    /// Append a row; short rows are padded with `Empty`
    pub fn push_row(&mut self, mut row: Vec<CellValue>) -> Result<(), TableError> {
        if row.len() > self.columns.len() {
            return Err(TableError::RowTooWide {
                row: self.rows.len(),
                width: row.len(),
                columns: self.columns.len(),
            });
        }
        row.resize(self.columns.len(), CellValue::Empty);
        self.rows.push(row);
        Ok(())
    }

    /// New table with the same columns and the rows for which `keep` is true
    pub fn select_rows<F>(&self, mut keep: F) -> RecordTable
    where
        F: FnMut(&[CellValue]) -> bool,
    {
        RecordTable {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .filter(|r| keep(r.as_slice()))
                .cloned()
                .collect(),
            index: self.index.clone(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Cell at `row` in the named column
    pub fn cell(&self, row: usize, column: &str) -> Option<&CellValue> {
        let col = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// All cells of the named column, in row order
    pub fn column_values<'a>(&'a self, column: &str) -> impl Iterator<Item = &'a CellValue> + 'a {
        let col = self.column_index(column);
        self.rows
            .iter()
            .filter_map(move |r| col.and_then(|c| r.get(c)))
    }

    pub fn column_kind(&self, column: &str) -> Option<ColumnKind> {
        self.column_index(column)
            .map(|_| ColumnKind::infer(self.column_values(column)))
    }

    /// Every column with its inferred kind, in sheet order
    pub fn column_kinds(&self) -> Vec<(String, ColumnKind)> {
        self.columns
            .iter()
            .map(|name| {
                let kind = self.column_kind(name).unwrap_or(ColumnKind::Empty);
                (name.clone(), kind)
            })
            .collect()
    }

    /// Numeric columns other than the year column
    pub fn metric_columns(&self, year_column: &str) -> Vec<String> {
        self.column_kinds()
            .into_iter()
            .filter(|(name, kind)| *kind == ColumnKind::Numeric && name != year_column)
            .map(|(name, _)| name)
            .collect()
    }

    pub fn categorical_columns(&self) -> Vec<String> {
        self.column_kinds()
            .into_iter()
            .filter(|(_, kind)| *kind == ColumnKind::Categorical)
            .map(|(name, _)| name)
            .collect()
    }

    /// Distinct non-empty values of a column, ascending
    pub fn distinct_values(&self, column: &str) -> Vec<GroupKey> {
        self.column_values(column)
            .filter_map(GroupKey::from_cell)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct years present, ascending
    pub fn years(&self, year_column: &str) -> Vec<Year> {
        self.column_values(year_column)
            .filter_map(CellValue::as_year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Maximum year present in the table
    pub fn latest_year(&self, year_column: &str) -> Option<Year> {
        self.column_values(year_column)
            .filter_map(CellValue::as_year)
            .max()
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Output rendering
pub trait Renderer {
    type Output;

    /// Render a report to the output format
    fn render(&self, report: &Report) -> Result<Self::Output, RenderError>;
}

// ============================================================================
// Errors
// ============================================================================

/// Dataset shape does not match what the dashboard needs
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("The file must include the columns {}", quote_list(.0))]
    MissingColumns(Vec<String>),
}

fn quote_list(names: &[String]) -> String {
    names
        .iter()
        .map(|n| format!("'{}'", n))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Table construction error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("Row {row} has {width} cells but the table has {columns} columns")]
    RowTooWide {
        row: usize,
        width: usize,
        columns: usize,
    },
}

/// Rendering error
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn table() -> RecordTable {
        let mut t = RecordTable::new(vec!["name".into(), "year".into(), "score".into()]);
        t.push_row(vec!["A".into(), 2020.0.into(), 10.0.into()]).unwrap();
        t.push_row(vec!["B".into(), 2021.0.into(), CellValue::Empty]).unwrap();
        t.push_row(vec!["C".into(), CellValue::Text("2019".into())]).unwrap();
        t
    }

    #[test]
    fn number_display_drops_integral_fraction() {
        assert_eq!(format_number(2020.0), "2020");
        assert_eq!(format_number(3.25), "3.25");
        assert_eq!(CellValue::Number(-4.0).display().unwrap(), "-4");
    }

    #[test]
    fn date_display() {
        let midnight = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(CellValue::Date(midnight).display().unwrap(), "2024-03-01");

        let afternoon = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap();
        assert_eq!(
            CellValue::Date(afternoon).display().unwrap(),
            "2024-03-01 14:30:00"
        );
    }

    #[test]
    fn empty_cell_has_no_display() {
        assert!(CellValue::Empty.display().is_none());
    }

    #[test]
    fn year_parsing() {
        assert_eq!(CellValue::Number(2021.0).as_year(), Some(2021));
        assert_eq!(CellValue::Text(" 2019 ".into()).as_year(), Some(2019));
        assert_eq!(CellValue::Number(2021.5).as_year(), None);
        assert_eq!(CellValue::Text("last year".into()).as_year(), None);
        assert_eq!(CellValue::Empty.as_year(), None);
    }

    #[test]
    fn group_keys_order_numbers_before_text() {
        let mut keys = vec![
            GroupKey::Text("b".into()),
            GroupKey::Number(3.0),
            GroupKey::Text("a".into()),
            GroupKey::Number(-1.0),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                GroupKey::Number(-1.0),
                GroupKey::Number(3.0),
                GroupKey::Text("a".into()),
                GroupKey::Text("b".into()),
            ]
        );
    }

    #[test]
    fn signed_zero_is_one_group_key() {
        let negative = GroupKey::from_cell(&CellValue::Number(-0.0)).unwrap();
        let positive = GroupKey::from_cell(&CellValue::Number(0.0)).unwrap();
        assert_eq!(negative, positive);
        assert_eq!(negative.to_string(), "0");
    }

    #[test]
    fn short_rows_are_padded() {
        let t = table();
        assert_eq!(t.cell(2, "score"), Some(&CellValue::Empty));
    }

    #[test]
    fn wide_rows_are_rejected() {
        let mut t = RecordTable::new(vec!["a".into()]);
        let err = t.push_row(vec![1.0.into(), 2.0.into()]).unwrap_err();
        assert_eq!(
            err,
            TableError::RowTooWide {
                row: 0,
                width: 2,
                columns: 1
            }
        );
    }

    #[test]
    fn column_kind_inference() {
        let t = table();
        assert_eq!(t.column_kind("name"), Some(ColumnKind::Categorical));
        // Mixed number/text years are categorical
        assert_eq!(t.column_kind("year"), Some(ColumnKind::Categorical));
        assert_eq!(t.column_kind("score"), Some(ColumnKind::Numeric));
        assert_eq!(t.column_kind("missing"), None);

        let empty = [CellValue::Empty, CellValue::Empty];
        assert_eq!(ColumnKind::infer(&empty), ColumnKind::Empty);

        let flags = [CellValue::Bool(true), CellValue::Empty];
        assert_eq!(ColumnKind::infer(&flags), ColumnKind::Boolean);
    }

    #[test]
    fn metric_columns_exclude_year() {
        let mut t = RecordTable::new(vec!["year".into(), "m1".into(), "label".into()]);
        t.push_row(vec![2020.0.into(), 1.0.into(), "x".into()]).unwrap();
        assert_eq!(t.metric_columns("year"), vec!["m1".to_string()]);
        assert_eq!(t.categorical_columns(), vec!["label".to_string()]);
    }

    #[test]
    fn years_and_latest_year() {
        let t = table();
        assert_eq!(t.years("year"), vec![2019, 2020, 2021]);
        assert_eq!(t.latest_year("year"), Some(2021));
        assert_eq!(RecordTable::new(vec!["year".into()]).latest_year("year"), None);
    }

    #[test]
    fn select_rows_leaves_source_untouched() {
        let t = table();
        let picked = t.select_rows(|row| row[0] == CellValue::Text("A".into()));
        assert_eq!(picked.len(), 1);
        assert_eq!(t.len(), 3);
        assert_eq!(picked.columns(), t.columns());
    }

    #[test]
    fn key_columns_report_all_missing() {
        let t = RecordTable::new(vec!["other".into()]);
        let keys = KeyColumns::new("שנה", "שם  הרשות");
        let err = keys.validate(&t).unwrap_err();
        assert_eq!(
            err,
            SchemaError::MissingColumns(vec!["שנה".into(), "שם  הרשות".into()])
        );
        let msg = err.to_string();
        assert!(msg.contains("'שנה'"));
        assert!(msg.contains("'שם  הרשות'"));
    }

    #[test]
    fn key_columns_are_exact_keys() {
        // Single-space variant must not satisfy the two-space column name
        let t = RecordTable::new(vec!["שנה".into(), "שם הרשות".into()]);
        let keys = KeyColumns::new("שנה", "שם  הרשות");
        assert!(keys.validate(&t).is_err());
    }
}
