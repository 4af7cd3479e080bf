//! Chart data
//!
//! Pure functions from a (filtered) record table to the series the SVG
//! renderers draw. Empty input always produces an empty series or `None`,
//! never an error.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::aggregate::{group_mean, mean_by_year, AggregateError};
use crate::rank::Ranking;
use crate::{CellValue, GroupKey, KeyColumns, RecordTable, Year};

// ============================================================================
// Trend Line
// ============================================================================

/// One point of a trend line
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub year: Year,
    pub value: f64,
}

/// Mean of one metric per year, years ascending
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendSeries {
    pub metric: String,
    pub points: Vec<TrendPoint>,
}

impl TrendSeries {
    pub fn build(
        table: &RecordTable,
        keys: &KeyColumns,
        metric: &str,
    ) -> Result<Self, AggregateError> {
        let points = mean_by_year(table, &keys.year, metric)?
            .into_iter()
            .map(|(year, value)| TrendPoint { year, value })
            .collect();
        Ok(Self {
            metric: metric.to_string(),
            points,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// (min, max) of the values, if any
    pub fn value_range(&self) -> Option<(f64, f64)> {
        value_range(self.points.iter().map(|p| p.value))
    }
}

// ============================================================================
// Ranked Bar
// ============================================================================

/// One bar of a ranked bar chart
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub label: String,
    pub value: f64,
}

/// Locality means for the latest year, sorted descending
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BarSeries {
    pub metric: String,
    pub year: Option<Year>,
    pub bars: Vec<Bar>,
}

impl BarSeries {
    /// Bars in ranking order
    pub fn from_ranking(ranking: &Ranking) -> Self {
        Self {
            metric: ranking.metric.clone(),
            year: ranking.year,
            bars: ranking
                .rows
                .iter()
                .map(|r| Bar {
                    label: r.label.clone(),
                    value: r.value,
                })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn value_range(&self) -> Option<(f64, f64)> {
        value_range(self.bars.iter().map(|b| b.value))
    }
}

// ============================================================================
// Share Pie
// ============================================================================

/// What a share pie measures per category value
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "metric")]
pub enum ShareMeasure {
    /// Number of rows
    #[default]
    Count,
    /// Sum of a numeric column
    Sum(String),
}

/// One slice of a share pie
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShareSlice {
    pub label: String,
    pub value: f64,
    /// Share of the whole, 0.0..=1.0
    pub fraction: f64,
}

/// Proportional breakdown of a categorical column
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShareChart {
    pub column: String,
    pub measure: ShareMeasure,
    pub total: f64,
    /// Slices by descending value; only positive values are kept
    pub slices: Vec<ShareSlice>,
}

impl ShareChart {
    /// Build the pie for `column`.
    ///
    /// Returns `Ok(None)` when nothing positive is left to draw.
    pub fn build(
        table: &RecordTable,
        column: &str,
        measure: &ShareMeasure,
    ) -> Result<Option<Self>, AggregateError> {
        let col = table
            .column_index(column)
            .ok_or_else(|| AggregateError::UnknownColumn(column.to_string()))?;
        let metric_col = match measure {
            ShareMeasure::Count => None,
            ShareMeasure::Sum(metric) => Some(
                table
                    .column_index(metric)
                    .ok_or_else(|| AggregateError::UnknownColumn(metric.clone()))?,
            ),
        };

        let mut totals: BTreeMap<GroupKey, f64> = BTreeMap::new();
        for row in table.rows() {
            let Some(key) = row.get(col).and_then(GroupKey::from_cell) else {
                continue;
            };
            let amount = match metric_col {
                None => 1.0,
                Some(m) => match row.get(m).and_then(CellValue::as_number) {
                    Some(v) => v,
                    None => continue,
                },
            };
            *totals.entry(key).or_insert(0.0) += amount;
        }

        let mut slices: Vec<(String, f64)> = totals
            .into_iter()
            .filter(|(_, v)| *v > 0.0)
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        let total: f64 = slices.iter().map(|(_, v)| v).sum();
        if slices.is_empty() || !total.is_finite() || total <= 0.0 {
            return Ok(None);
        }
        slices.sort_by(|a, b| b.1.total_cmp(&a.1));

        Ok(Some(Self {
            column: column.to_string(),
            measure: measure.clone(),
            total,
            slices: slices
                .into_iter()
                .map(|(label, value)| ShareSlice {
                    label,
                    value,
                    fraction: value / total,
                })
                .collect(),
        }))
    }
}

/// Column for the share pie.
///
/// The preferred column wins when it exists; otherwise the first categorical
/// column that is not the locality column, then the locality column itself.
pub fn pick_share_column(
    table: &RecordTable,
    keys: &KeyColumns,
    preferred: Option<&str>,
) -> Option<String> {
    if let Some(name) = preferred {
        if table.has_column(name) {
            return Some(name.to_string());
        }
    }
    let categorical = table.categorical_columns();
    categorical
        .iter()
        .find(|c| **c != keys.locality && **c != keys.year)
        .or_else(|| categorical.iter().find(|c| **c == keys.locality))
        .cloned()
}

// ============================================================================
// Comparison Matrix
// ============================================================================

/// One locality's means across the matrix years
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub locality: String,
    /// Aligned with `ComparisonMatrix::years`; `None` where there is no value
    pub values: Vec<Option<f64>>,
}

/// Locality x year table of means for one metric
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonMatrix {
    pub metric: String,
    pub years: Vec<Year>,
    pub rows: Vec<ComparisonRow>,
}

impl ComparisonMatrix {
    pub fn build(
        table: &RecordTable,
        keys: &KeyColumns,
        metric: &str,
    ) -> Result<Self, AggregateError> {
        let means = group_mean(
            table,
            &[keys.locality.as_str(), keys.year.as_str()],
            metric,
        )?;

        let mut cells: BTreeMap<GroupKey, BTreeMap<Year, f64>> = BTreeMap::new();
        for row in means {
            let [locality, year] = row.key.as_slice() else {
                continue;
            };
            let Some(year) = year.as_year() else {
                continue;
            };
            cells
                .entry(locality.clone())
                .or_default()
                .insert(year, row.value);
        }

        let mut years: Vec<Year> = cells.values().flat_map(|m| m.keys().copied()).collect();
        years.sort_unstable();
        years.dedup();

        let rows = cells
            .into_iter()
            .map(|(locality, by_year)| ComparisonRow {
                locality: locality.to_string(),
                values: years.iter().map(|y| by_year.get(y).copied()).collect(),
            })
            .collect();

        Ok(Self {
            metric: metric.to_string(),
            years,
            rows,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn value_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}
