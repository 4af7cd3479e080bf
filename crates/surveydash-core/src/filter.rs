//! Row filtering by locality, year and free text
//!
//! All active predicates are combined with a logical AND. An empty locality
//! set, an empty year set, or a blank search term imposes no restriction.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::{CellValue, KeyColumns, RecordTable, Year};

/// User-selected filter predicates
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    /// Locality names (exact match against the locality column)
    pub localities: BTreeSet<String>,
    /// Years to keep
    pub years: BTreeSet<Year>,
    /// Case-insensitive substring searched across every column
    pub search: Option<String>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to a locality (may be called repeatedly)
    pub fn locality(mut self, name: impl Into<String>) -> Self {
        self.localities.insert(name.into());
        self
    }

    pub fn localities<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.localities.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn year(mut self, year: Year) -> Self {
        self.years.insert(year);
        self
    }

    pub fn years(mut self, years: impl IntoIterator<Item = Year>) -> Self {
        self.years.extend(years);
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    /// Search term with surrounding whitespace removed, if any is left
    fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
    }

    /// True when no predicate is active
    pub fn is_unrestricted(&self) -> bool {
        self.localities.is_empty() && self.years.is_empty() && self.search_term().is_none()
    }

    /// Produce the filtered view; `table` is left untouched
    pub fn apply(&self, table: &RecordTable, keys: &KeyColumns) -> RecordTable {
        if self.is_unrestricted() {
            return table.clone();
        }

        let locality_col = table.column_index(&keys.locality);
        let year_col = table.column_index(&keys.year);
        let term = self.search_term();

        table.select_rows(|row| {
            if !self.localities.is_empty() {
                let name = locality_col
                    .and_then(|c| row.get(c))
                    .and_then(CellValue::display);
                match name {
                    Some(n) if self.localities.contains(&n) => {}
                    _ => return false,
                }
            }
            if !self.years.is_empty() {
                let year = year_col.and_then(|c| row.get(c)).and_then(CellValue::as_year);
                match year {
                    Some(y) if self.years.contains(&y) => {}
                    _ => return false,
                }
            }
            match &term {
                Some(t) => row_contains(row, t),
                None => true,
            }
        })
    }
}

/// True if any cell's string projection contains `term` (already lowercased)
pub fn row_contains(row: &[CellValue], term: &str) -> bool {
    row.iter()
        .filter_map(CellValue::display)
        .any(|s| s.to_lowercase().contains(term))
}
