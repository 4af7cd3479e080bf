//! Dataset overview used to populate selection controls

use serde::{Deserialize, Serialize};

use crate::{ColumnKind, KeyColumns, RecordTable, Year};

/// A column name with its inferred kind
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub kind: ColumnKind,
}

/// What a loaded dataset offers for selection
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub rows: usize,
    pub columns: Vec<ColumnInfo>,
    /// Selectable metrics, in column order
    pub metrics: Vec<String>,
    /// Distinct localities, ascending
    pub localities: Vec<String>,
    pub years: Vec<Year>,
}

impl DatasetSummary {
    pub fn of(table: &RecordTable, keys: &KeyColumns) -> Self {
        Self {
            rows: table.len(),
            columns: table
                .column_kinds()
                .into_iter()
                .map(|(name, kind)| ColumnInfo { name, kind })
                .collect(),
            metrics: table.metric_columns(&keys.year),
            localities: table
                .distinct_values(&keys.locality)
                .iter()
                .map(ToString::to_string)
                .collect(),
            years: table.years(&keys.year),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CellValue;
    use pretty_assertions::assert_eq;

    #[test]
    fn summary_lists_selectable_values() {
        let mut table = RecordTable::new(vec!["town".into(), "year".into(), "score".into()]);
        for (town, year, score) in [("B", 2021.0, 1.0), ("A", 2020.0, 2.0), ("B", 2020.0, 3.0)] {
            table
                .push_row(vec![town.into(), CellValue::Number(year), CellValue::Number(score)])
                .unwrap();
        }

        let summary = DatasetSummary::of(&table, &KeyColumns::new("year", "town"));
        assert_eq!(summary.rows, 3);
        assert_eq!(summary.metrics, vec!["score".to_string()]);
        assert_eq!(summary.localities, vec!["A".to_string(), "B".to_string()]);
        assert_eq!(summary.years, vec![2020, 2021]);
        assert_eq!(
            summary.columns[0],
            ColumnInfo {
                name: "town".into(),
                kind: ColumnKind::Categorical
            }
        );
    }
}
