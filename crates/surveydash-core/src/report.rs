//! Report assembly
//!
//! [`Report::build`] runs the whole pipeline for one user interaction:
//! schema check, selection check, filter, then per selected metric the trend
//! series, latest-year ranking, ranked bars and locality x year matrix, and
//! finally the share pie. Nothing is cached between builds.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::aggregate::AggregateError;
use crate::chart::{
    pick_share_column, BarSeries, ComparisonMatrix, ShareChart, ShareMeasure, TrendSeries,
};
use crate::config::ReportConfig;
use crate::filter::FilterCriteria;
use crate::rank::{latest_year_ranking, Ranking};
use crate::{RecordTable, SchemaError, Year};

// ============================================================================
// Selection
// ============================================================================

/// What the user picked on the page
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selection {
    /// Metrics in the order they were picked
    pub metrics: Vec<String>,
    pub localities: Vec<String>,
    pub years: Vec<Year>,
    pub search: Option<String>,
    /// Metric for the single-chart views; the first selected metric when unset
    pub chart_metric: Option<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a metric; picking the same metric twice has no effect
    pub fn metric(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.metrics.contains(&name) {
            self.metrics.push(name);
        }
        self
    }

    pub fn metrics<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names.into_iter().fold(self, |s, n| s.metric(n))
    }

    pub fn locality(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.localities.contains(&name) {
            self.localities.push(name);
        }
        self
    }

    pub fn localities<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names.into_iter().fold(self, |s, n| s.locality(n))
    }

    pub fn year(mut self, year: Year) -> Self {
        if !self.years.contains(&year) {
            self.years.push(year);
        }
        self
    }

    pub fn years(self, years: impl IntoIterator<Item = Year>) -> Self {
        years.into_iter().fold(self, |s, y| s.year(y))
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn chart_metric(mut self, name: impl Into<String>) -> Self {
        self.chart_metric = Some(name.into());
        self
    }

    /// Filter predicates for this selection
    pub fn criteria(&self) -> FilterCriteria {
        let mut criteria = FilterCriteria::new()
            .localities(self.localities.iter().cloned())
            .years(self.years.iter().copied());
        if let Some(term) = &self.search {
            criteria = criteria.search(term.clone());
        }
        criteria
    }
}

// ============================================================================
// Report
// ============================================================================

/// Everything drawn for one selected metric
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricSection {
    pub metric: String,
    pub trend: TrendSeries,
    pub ranking: Ranking,
    pub bars: BarSeries,
    pub comparison: ComparisonMatrix,
}

/// Result of a pipeline pass
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum ReportOutcome {
    /// Nothing selected yet; only this message is shown
    Prompt(String),
    Sections(Vec<MetricSection>),
}

/// One fully computed dashboard pass
#[derive(Clone, Debug, PartialEq)]
pub struct Report {
    pub config: ReportConfig,
    pub selection: Selection,
    /// Filtered view of the source table
    pub filtered: RecordTable,
    pub outcome: ReportOutcome,
    pub share: Option<ShareChart>,
}

impl Report {
    /// Run the pipeline over `table`
    pub fn build(
        table: &RecordTable,
        config: &ReportConfig,
        selection: &Selection,
    ) -> Result<Self, ReportError> {
        let keys = config.key_columns();
        keys.validate(table)?;
        validate_selection(table, config, selection)?;

        let filtered = selection.criteria().apply(table, &keys);
        tracing::debug!(
            source_rows = table.len(),
            filtered_rows = filtered.len(),
            metrics = selection.metrics.len(),
            "filtered dataset"
        );

        if selection.metrics.is_empty() {
            return Ok(Self {
                config: config.clone(),
                selection: selection.clone(),
                filtered,
                outcome: ReportOutcome::Prompt(config.prompt_message().to_string()),
                share: None,
            });
        }

        let sections = selection
            .metrics
            .iter()
            .map(|metric| {
                let ranking = latest_year_ranking(&filtered, &keys, metric, config.decorations)?;
                Ok(MetricSection {
                    metric: metric.clone(),
                    trend: TrendSeries::build(&filtered, &keys, metric)?,
                    bars: BarSeries::from_ranking(&ranking),
                    comparison: ComparisonMatrix::build(&filtered, &keys, metric)?,
                    ranking,
                })
            })
            .collect::<Result<Vec<_>, AggregateError>>()?;

        let share = build_share(table, &filtered, config)?;
        if share.is_none() {
            tracing::debug!("share chart omitted");
        }

        Ok(Self {
            config: config.clone(),
            selection: selection.clone(),
            filtered,
            outcome: ReportOutcome::Sections(sections),
            share,
        })
    }

    /// Metric sections; empty for a prompt
    pub fn sections(&self) -> &[MetricSection] {
        match &self.outcome {
            ReportOutcome::Sections(sections) => sections,
            ReportOutcome::Prompt(_) => &[],
        }
    }

    /// Prompt text when nothing is selected
    pub fn prompt(&self) -> Option<&str> {
        match &self.outcome {
            ReportOutcome::Prompt(message) => Some(message),
            ReportOutcome::Sections(_) => None,
        }
    }

    /// Confirmation line shown under a successful report
    pub fn notice(&self) -> Option<&str> {
        match self.outcome {
            ReportOutcome::Sections(_) => Some(self.config.success_message()),
            ReportOutcome::Prompt(_) => None,
        }
    }

    /// Section used by the single-chart views
    pub fn chart_section(&self) -> Option<&MetricSection> {
        let sections = self.sections();
        match &self.selection.chart_metric {
            Some(name) => sections.iter().find(|s| &s.metric == name),
            None => sections.first(),
        }
    }
}

fn validate_selection(
    table: &RecordTable,
    config: &ReportConfig,
    selection: &Selection,
) -> Result<(), ReportError> {
    if selection.metrics.len() > config.max_metrics {
        return Err(ReportError::TooManyMetrics {
            selected: selection.metrics.len(),
            max: config.max_metrics,
        });
    }
    if selection.localities.len() > config.max_localities {
        return Err(ReportError::TooManyLocalities {
            selected: selection.localities.len(),
            max: config.max_localities,
        });
    }

    // Metric kinds come from the source table; a filtered view may be empty
    let metrics = table.metric_columns(&config.year_column);
    let chosen = selection.metrics.iter().chain(&selection.chart_metric);
    for name in chosen {
        if !metrics.contains(name) {
            return Err(ReportError::UnknownMetric(name.clone()));
        }
    }
    if let Some(chart) = &selection.chart_metric {
        if !selection.metrics.is_empty() && !selection.metrics.contains(chart) {
            return Err(ReportError::ChartMetricNotSelected(chart.clone()));
        }
    }
    Ok(())
}

fn build_share(
    source: &RecordTable,
    filtered: &RecordTable,
    config: &ReportConfig,
) -> Result<Option<ShareChart>, AggregateError> {
    let keys = config.key_columns();
    // Column kinds come from the source so an empty view still names a column
    let Some(column) = pick_share_column(source, &keys, config.share_column.as_deref()) else {
        return Ok(None);
    };
    let measure = match &config.share_metric {
        Some(metric) if source.metric_columns(&keys.year).contains(metric) => {
            ShareMeasure::Sum(metric.clone())
        }
        Some(metric) => {
            tracing::warn!(metric = %metric, "share metric is not numeric, counting rows");
            ShareMeasure::Count
        }
        None => ShareMeasure::Count,
    };
    ShareChart::build(filtered, &column, &measure)
}

/// Report assembly error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("Too many metrics selected: {selected} (at most {max})")]
    TooManyMetrics { selected: usize, max: usize },

    #[error("Too many localities selected: {selected} (at most {max})")]
    TooManyLocalities { selected: usize, max: usize },

    #[error("Not a numeric metric: '{0}'")]
    UnknownMetric(String),

    #[error("Chart metric '{0}' is not among the selected metrics")]
    ChartMetricNotSelected(String),

    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}
