//! Plain-text ranking tables for terminal output

use surveydash_core::{RenderError, Renderer, Report, Ranking};

use crate::{format_value, truncate};

/// Terminal renderer: one ranking table per selected metric
#[derive(Clone, Debug)]
pub struct TextRenderer {
    /// Width of the proportional bar at 100%
    pub bar_width: usize,
    /// Label column width in characters
    pub label_width: usize,
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self {
            bar_width: 20,
            label_width: 24,
        }
    }
}

impl TextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bar_width(mut self, width: usize) -> Self {
        self.bar_width = width;
        self
    }

    /// Render a single ranking table
    pub fn render_ranking(&self, ranking: &Ranking, decimals: u32) -> String {
        let mut out = match ranking.year {
            Some(year) => format!("{} ({})\n", ranking.metric, year),
            None => format!("{}\n", ranking.metric),
        };
        if ranking.is_empty() {
            out.push_str("  (no data)\n");
            return out;
        }

        for row in &ranking.rows {
            let label = truncate(&row.label, self.label_width);
            let pad = self.label_width.saturating_sub(label.chars().count());
            let bar = row
                .bar_percent
                .map(|p| "█".repeat(usize::from(p) * self.bar_width / 100))
                .unwrap_or_default();
            out.push_str(&format!(
                "{:>4}  {}{}  {:>8}  {}\n",
                row.decoration.marker(),
                label,
                " ".repeat(pad),
                format_value(row.value, decimals),
                bar
            ));
        }
        out
    }
}

impl Renderer for TextRenderer {
    type Output = String;

    fn render(&self, report: &Report) -> Result<String, RenderError> {
        if let Some(prompt) = report.prompt() {
            return Ok(format!("{}\n", prompt));
        }

        let mut out = format!("{}\n", report.config.title);
        out.push_str(&format!("{} rows\n", report.filtered.len()));
        for section in report.sections() {
            out.push('\n');
            out.push_str(&self.render_ranking(&section.ranking, report.config.decimals));
        }
        if let Some(notice) = report.notice() {
            out.push('\n');
            out.push_str(notice);
            out.push('\n');
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use surveydash_core::rank::{rank, DecorationScheme};
    use surveydash_core::{AggregateRow, GroupKey};

    fn ranking(values: &[(&str, f64)]) -> Ranking {
        let rows: Vec<AggregateRow> = values
            .iter()
            .map(|&(label, value)| AggregateRow {
                key: vec![GroupKey::Text(label.into())],
                value,
                count: 1,
            })
            .collect();
        Ranking {
            metric: "אמון".into(),
            year: Some(2021),
            rows: rank(&rows, DecorationScheme::Medals),
        }
    }

    #[test]
    fn rows_carry_markers_and_bars() {
        let text = TextRenderer::new().render_ranking(&ranking(&[("a", 10.0), ("b", 5.0)]), 1);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "אמון (2021)");
        assert!(lines[1].contains("🥇"));
        assert!(lines[1].contains("10.0"));
        assert_eq!(lines[1].matches('█').count(), 20);
        assert_eq!(lines[2].matches('█').count(), 10);
    }

    #[test]
    fn empty_ranking_says_so() {
        let text = TextRenderer::new().render_ranking(&ranking(&[]), 1);
        assert!(text.contains("(no data)"));
    }

    #[test]
    fn zero_maximum_has_no_bars() {
        let text = TextRenderer::new().render_ranking(&ranking(&[("a", 0.0)]), 1);
        assert!(!text.contains('█'));
    }
}
