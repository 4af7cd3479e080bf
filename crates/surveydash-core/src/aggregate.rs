//! Group-by means over a record table
//!
//! Output rows are sorted by group key ascending, one row per distinct key
//! that has at least one numeric value. Rows with an empty key cell or a
//! missing/non-numeric metric cell are left out of the mean.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::{CellValue, GroupKey, RecordTable};

/// One group's mean
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    /// Group key values, one per grouping column
    pub key: Vec<GroupKey>,
    /// Arithmetic mean of the available values
    pub value: f64,
    /// Number of values that contributed to the mean
    pub count: usize,
}

impl AggregateRow {
    /// Human-readable label, key parts joined with " / "
    pub fn label(&self) -> String {
        self.key
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" / ")
    }
}

/// Aggregation error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregateError {
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("At least one grouping column is required")]
    NoGroupingColumns,
}

/// Mean of `metric` per distinct combination of `keys`
pub fn group_mean(
    table: &RecordTable,
    keys: &[&str],
    metric: &str,
) -> Result<Vec<AggregateRow>, AggregateError> {
    if keys.is_empty() {
        return Err(AggregateError::NoGroupingColumns);
    }
    let key_cols = keys
        .iter()
        .map(|k| {
            table
                .column_index(k)
                .ok_or_else(|| AggregateError::UnknownColumn((*k).to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    group_mean_by(table, metric, |row| {
        key_cols
            .iter()
            .map(|&c| row.get(c).and_then(GroupKey::from_cell))
            .collect()
    })
}

/// Mean of `metric` per year, years ascending.
///
/// Rows whose year cell is not a year are skipped.
pub fn mean_by_year(
    table: &RecordTable,
    year_column: &str,
    metric: &str,
) -> Result<Vec<(crate::Year, f64)>, AggregateError> {
    let year_col = table
        .column_index(year_column)
        .ok_or_else(|| AggregateError::UnknownColumn(year_column.to_string()))?;

    let rows = group_mean_by(table, metric, |row| {
        let year = row.get(year_col).and_then(CellValue::as_year)?;
        Some(vec![GroupKey::Number(f64::from(year))])
    })?;

    Ok(rows
        .into_iter()
        .filter_map(|r| r.key.first().and_then(GroupKey::as_year).map(|y| (y, r.value)))
        .collect())
}

/// Shared accumulation: `key_of` returns `None` to drop a row
pub(crate) fn group_mean_by<F>(
    table: &RecordTable,
    metric: &str,
    mut key_of: F,
) -> Result<Vec<AggregateRow>, AggregateError>
where
    F: FnMut(&[CellValue]) -> Option<Vec<GroupKey>>,
{
    let metric_col = table
        .column_index(metric)
        .ok_or_else(|| AggregateError::UnknownColumn(metric.to_string()))?;

    let mut groups: BTreeMap<Vec<GroupKey>, (f64, usize)> = BTreeMap::new();
    for row in table.rows() {
        let Some(value) = row.get(metric_col).and_then(CellValue::as_number) else {
            continue;
        };
        let Some(key) = key_of(row) else {
            continue;
        };
        let entry = groups.entry(key).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }

    Ok(groups
        .into_iter()
        .map(|(key, (sum, count))| AggregateRow {
            key,
            value: sum / count as f64,
            count,
        })
        .collect())
}

/// Round to a number of decimal places (half away from zero)
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
