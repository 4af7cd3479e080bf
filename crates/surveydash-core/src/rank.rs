//! Ranking and rank decorations
//!
//! Aggregate rows are sorted descending by value with a stable sort, so equal
//! values keep their aggregation order. Each ranked row carries a 1-based
//! position, a decoration and the width of its proportional bar.
//!
//! ## Decoration schemes
//!
//! | Scheme | Rule |
//! |--------|------|
//! | `medals` | 1st gold, 2nd silver, 3rd bronze; last three "declining" when the set has more than three rows; medals win where both apply |
//! | `halves` | rows in the upper half (index < len / 2) get the upper marker, the rest the lower marker |

use serde::{Deserialize, Serialize};

use crate::aggregate::{group_mean, AggregateError};
use crate::{AggregateRow, GroupKey, KeyColumns, RecordTable, Year};

/// How rows are decorated
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecorationScheme {
    #[default]
    Medals,
    Halves,
}

/// Marker shown next to a ranked row
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decoration {
    Gold,
    Silver,
    Bronze,
    Declining,
    Plain(usize),
    Upper,
    Lower,
}

impl Decoration {
    /// Marker text for display
    pub fn marker(&self) -> String {
        match self {
            Decoration::Gold => "🥇".to_string(),
            Decoration::Silver => "🥈".to_string(),
            Decoration::Bronze => "🥉".to_string(),
            Decoration::Declining => "🔻".to_string(),
            Decoration::Plain(position) => position.to_string(),
            Decoration::Upper => "🔵".to_string(),
            Decoration::Lower => "🔴".to_string(),
        }
    }

    /// CSS class used by the HTML renderer
    pub fn css_class(&self) -> &'static str {
        match self {
            Decoration::Gold => "gold",
            Decoration::Silver => "silver",
            Decoration::Bronze => "bronze",
            Decoration::Declining => "declining",
            Decoration::Plain(_) => "plain",
            Decoration::Upper => "upper",
            Decoration::Lower => "lower",
        }
    }
}

/// An aggregate row with its rank annotations
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankedRow {
    /// 1-based rank position
    pub position: usize,
    pub label: String,
    pub key: Vec<GroupKey>,
    pub value: f64,
    pub count: usize,
    pub decoration: Decoration,
    /// Bar width as a percentage of the set maximum; `None` means no bar
    pub bar_percent: Option<u8>,
}

impl RankedRow {
    /// Back to the aggregate row this was ranked from
    pub fn to_aggregate(&self) -> AggregateRow {
        AggregateRow {
            key: self.key.clone(),
            value: self.value,
            count: self.count,
        }
    }
}

/// Ranked rows for one metric
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    pub metric: String,
    /// Year the ranking was taken from
    pub year: Option<Year>,
    pub rows: Vec<RankedRow>,
}

impl Ranking {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Stable descending sort by value
pub fn sort_descending(rows: &[AggregateRow]) -> Vec<AggregateRow> {
    let mut sorted = rows.to_vec();
    sorted.sort_by(|a, b| b.value.total_cmp(&a.value));
    sorted
}

/// Rank aggregate rows: sort descending, then decorate and size bars
pub fn rank(rows: &[AggregateRow], scheme: DecorationScheme) -> Vec<RankedRow> {
    let sorted = sort_descending(rows);
    let len = sorted.len();
    let max = sorted
        .iter()
        .map(|r| r.value)
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.max(v))));

    sorted
        .into_iter()
        .enumerate()
        .map(|(index, row)| RankedRow {
            position: index + 1,
            label: row.label(),
            decoration: decorate(index, len, scheme),
            bar_percent: max.and_then(|m| bar_percent(row.value, m)),
            key: row.key,
            value: row.value,
            count: row.count,
        })
        .collect()
}

/// Decoration for the row at `index` (0-based) in a set of `len` rows
pub fn decorate(index: usize, len: usize, scheme: DecorationScheme) -> Decoration {
    match scheme {
        DecorationScheme::Medals => match index {
            0 => Decoration::Gold,
            1 => Decoration::Silver,
            2 => Decoration::Bronze,
            // Only reached for index >= 3, so a medal always wins the overlap
            i if len > 3 && i + 3 >= len => Decoration::Declining,
            i => Decoration::Plain(i + 1),
        },
        DecorationScheme::Halves => {
            if (index as f64) < len as f64 / 2.0 {
                Decoration::Upper
            } else {
                Decoration::Lower
            }
        }
    }
}

/// Bar width: round(value / max * 100) clamped to 0..=100.
///
/// Returns `None` when the maximum is not a positive finite number.
pub fn bar_percent(value: f64, max: f64) -> Option<u8> {
    if !max.is_finite() || max <= 0.0 || !value.is_finite() {
        return None;
    }
    let pct = (value / max * 100.0).round().clamp(0.0, 100.0);
    Some(pct as u8)
}

/// Rank localities by their mean in the latest year of `table`.
///
/// Localities without a value for `metric` in that year are left out.
pub fn latest_year_ranking(
    table: &RecordTable,
    keys: &KeyColumns,
    metric: &str,
    scheme: DecorationScheme,
) -> Result<Ranking, AggregateError> {
    let Some(latest) = table.latest_year(&keys.year) else {
        return Ok(Ranking {
            metric: metric.to_string(),
            year: None,
            rows: Vec::new(),
        });
    };

    let year_col = table
        .column_index(&keys.year)
        .ok_or_else(|| AggregateError::UnknownColumn(keys.year.clone()))?;
    let latest_rows = table.select_rows(|row| {
        row.get(year_col).and_then(crate::CellValue::as_year) == Some(latest)
    });

    let means = group_mean(&latest_rows, &[keys.locality.as_str()], metric)?;
    Ok(Ranking {
        metric: metric.to_string(),
        year: Some(latest),
        rows: rank(&means, scheme),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CellValue;
    use pretty_assertions::assert_eq;

    fn agg(label: &str, value: f64) -> AggregateRow {
        AggregateRow {
            key: vec![GroupKey::Text(label.to_string())],
            value,
            count: 1,
        }
    }

    fn decorations(n: usize) -> Vec<Decoration> {
        (0..n).map(|i| decorate(i, n, DecorationScheme::Medals)).collect()
    }

    #[test]
    fn medals_for_small_sets() {
        use Decoration::*;
        assert_eq!(decorations(1), vec![Gold]);
        assert_eq!(decorations(3), vec![Gold, Silver, Bronze]);
        assert_eq!(decorations(4), vec![Gold, Silver, Bronze, Declining]);
        assert_eq!(decorations(5), vec![Gold, Silver, Bronze, Declining, Declining]);
    }

    #[test]
    fn medals_and_declining_for_larger_sets() {
        use Decoration::*;
        assert_eq!(
            decorations(8),
            vec![
                Gold,
                Silver,
                Bronze,
                Plain(4),
                Plain(5),
                Declining,
                Declining,
                Declining
            ]
        );
    }

    #[test]
    fn halves_scheme() {
        use Decoration::*;
        let five: Vec<Decoration> = (0..5).map(|i| decorate(i, 5, DecorationScheme::Halves)).collect();
        assert_eq!(five, vec![Upper, Upper, Upper, Lower, Lower]);
        let four: Vec<Decoration> = (0..4).map(|i| decorate(i, 4, DecorationScheme::Halves)).collect();
        assert_eq!(four, vec![Upper, Upper, Lower, Lower]);
    }

    #[test]
    fn ranking_sorts_descending_and_keeps_tie_order() {
        let rows = vec![agg("a", 5.0), agg("b", 9.0), agg("c", 5.0), agg("d", 1.0)];
        let ranked = rank(&rows, DecorationScheme::Medals);
        let labels: Vec<&str> = ranked.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["b", "a", "c", "d"]);
        let positions: Vec<usize> = ranked.iter().map(|r| r.position).collect();
        assert_eq!(positions, vec![1, 2, 3, 4]);
    }

    #[test]
    fn equal_values_all_get_full_bars() {
        let rows = vec![agg("a", 5.0), agg("b", 5.0), agg("c", 5.0)];
        let ranked = rank(&rows, DecorationScheme::Medals);
        assert!(ranked.iter().all(|r| r.bar_percent == Some(100)));
    }

    #[test]
    fn bar_percentages_are_rounded_and_clamped() {
        assert_eq!(bar_percent(1.0, 3.0), Some(33));
        assert_eq!(bar_percent(2.0, 3.0), Some(67));
        assert_eq!(bar_percent(-4.0, 8.0), Some(0));
        assert_eq!(bar_percent(8.0, 8.0), Some(100));
    }

    #[test]
    fn zero_maximum_renders_no_bars() {
        let rows = vec![agg("a", 0.0), agg("b", 0.0)];
        let ranked = rank(&rows, DecorationScheme::Medals);
        assert!(ranked.iter().all(|r| r.bar_percent.is_none()));
        assert_eq!(bar_percent(3.0, 0.0), None);
        assert_eq!(bar_percent(3.0, f64::NAN), None);
    }

    #[test]
    fn empty_set_ranks_to_nothing() {
        assert!(rank(&[], DecorationScheme::Medals).is_empty());
    }

    #[test]
    fn ranking_is_idempotent() {
        let rows = vec![
            agg("a", 3.0),
            agg("b", 7.0),
            agg("c", 7.0),
            agg("d", 2.0),
            agg("e", 9.0),
            agg("f", 1.0),
            agg("g", 4.0),
        ];
        let once = rank(&rows, DecorationScheme::Medals);
        let back: Vec<AggregateRow> = once.iter().map(RankedRow::to_aggregate).collect();
        let twice = rank(&back, DecorationScheme::Medals);
        assert_eq!(once, twice);
    }

    #[test]
    fn latest_year_excludes_localities_without_that_year() {
        let keys = KeyColumns::new("year", "town");
        let mut t = RecordTable::new(vec!["town".into(), "year".into(), "metric".into()]);
        t.push_row(vec!["A".into(), 2020.0.into(), 10.0.into()]).unwrap();
        t.push_row(vec!["B".into(), 2020.0.into(), 30.0.into()]).unwrap();
        t.push_row(vec!["A".into(), 2021.0.into(), 20.0.into()]).unwrap();

        let ranking = latest_year_ranking(&t, &keys, "metric", DecorationScheme::Medals).unwrap();
        assert_eq!(ranking.year, Some(2021));
        assert_eq!(ranking.rows.len(), 1);
        let first = &ranking.rows[0];
        assert_eq!(first.label, "A");
        assert_eq!(first.value, 20.0);
        assert_eq!(first.position, 1);
        assert_eq!(first.decoration, Decoration::Gold);
    }

    #[test]
    fn latest_year_of_empty_table() {
        let keys = KeyColumns::new("year", "town");
        let t = RecordTable::new(vec!["town".into(), "year".into(), "metric".into()]);
        let ranking = latest_year_ranking(&t, &keys, "metric", DecorationScheme::Medals).unwrap();
        assert!(ranking.is_empty());
        assert_eq!(ranking.year, None);
    }

    #[test]
    fn markers() {
        assert_eq!(Decoration::Gold.marker(), "🥇");
        assert_eq!(Decoration::Plain(7).marker(), "7");
        assert_eq!(Decoration::Lower.marker(), "🔴");
        assert_eq!(CellValue::Number(1.0).display().unwrap(), "1");
    }
}
