//! # surveydash-loader
//!
//! Reads the first worksheet of a spreadsheet into a [`RecordTable`].
//!
//! The first sheet row is the header. Blank header cells are named
//! `Unnamed: <index>` and repeated names get `.1`, `.2`, ... suffixes; every
//! other name is kept exactly as written, whitespace included.
//!
//! ## Example
//!
//! ```rust,no_run
//! use surveydash_loader::{load_cached, validate_schema};
//! use surveydash_core::ReportConfig;
//!
//! let config = ReportConfig::default();
//! let table = load_cached(&config.source_path)?;
//! validate_schema(&table, &config.key_columns())?;
//! # Ok::<(), surveydash_loader::LoadError>(())
//! ```

pub mod cache;

pub use cache::{load_cached, DatasetCache};

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashSet;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use surveydash_core::{CellValue, KeyColumns, RecordTable, SchemaError, TableError};
use thiserror::Error;

// ============================================================================
// Errors
// ============================================================================

/// Loading error
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot parse workbook: {0}")]
    Workbook(String),

    #[error("The workbook has no worksheet")]
    NoWorksheet,

    #[error("The first worksheet has no header row")]
    EmptySheet,

    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

// ============================================================================
// Loading
// ============================================================================

/// Load the first worksheet of the spreadsheet at `path`
pub fn load_path(path: &Path) -> Result<RecordTable, LoadError> {
    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "loading spreadsheet");
    load_bytes(bytes)
}

/// Load the first worksheet of an in-memory spreadsheet (xlsx, xls, xlsb, ods)
pub fn load_bytes(bytes: Vec<u8>) -> Result<RecordTable, LoadError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| LoadError::Workbook(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(LoadError::NoWorksheet)?
        .map_err(|e| LoadError::Workbook(e.to_string()))?;
    table_from_range(&range)
}

/// Check that the year and locality columns are present
pub fn validate_schema(table: &RecordTable, keys: &KeyColumns) -> Result<(), LoadError> {
    keys.validate(table).map_err(|e| {
        tracing::warn!(error = %e, "schema check failed");
        LoadError::Schema(e)
    })
}

fn table_from_range(range: &Range<Data>) -> Result<RecordTable, LoadError> {
    let mut rows = range.rows();
    let header = rows.next().ok_or(LoadError::EmptySheet)?;
    if header.iter().all(|c| matches!(c, Data::Empty)) {
        return Err(LoadError::EmptySheet);
    }

    // The range begins at the first used cell, not necessarily column A
    let first_column = range.start().map_or(0, |(_, col)| col as usize);
    let mut table = RecordTable::new(header_names(header, first_column));
    let mut skipped = 0usize;
    for row in rows {
        let cells: Vec<CellValue> = row.iter().map(cell_value).collect();
        if cells.iter().all(CellValue::is_empty) {
            skipped += 1;
            continue;
        }
        table.push_row(cells)?;
    }

    tracing::debug!(
        columns = table.columns().len(),
        rows = table.len(),
        blank_rows = skipped,
        "worksheet parsed"
    );
    Ok(table)
}

/// Column names from the header row
///
/// `first_column` is the sheet index of the first header cell, so blank
/// headers are numbered by their position in the sheet.
pub fn header_names(header: &[Data], first_column: usize) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::with_capacity(header.len());
    header
        .iter()
        .enumerate()
        .map(|(index, cell)| {
            let base = match cell_value(cell).display() {
                Some(name) if !name.is_empty() => name,
                _ => format!("Unnamed: {}", first_column + index),
            };
            let mut name = base.clone();
            let mut suffix = 0;
            while seen.contains(&name) {
                suffix += 1;
                name = format!("{}.{}", base, suffix);
            }
            seen.insert(name.clone());
            name
        })
        .collect()
}

/// Map a calamine cell to a dashboard cell; error cells become empty
pub fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map_or(CellValue::Number(dt.as_f64()), CellValue::Date),
        Data::DateTimeIso(s) => parse_iso_datetime(s)
            .map_or_else(|| CellValue::Text(s.clone()), CellValue::Date),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

fn parse_iso_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
