//! Command implementations
//!
//! Every command loads the configured settings, reads the spreadsheet once,
//! and runs the pipeline from the unmodified table.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use surveydash_core::{
    DatasetSummary, Layout, RecordTable, Renderer, Report, ReportConfig, Selection,
};
use surveydash_loader::{load_cached, validate_schema};
use surveydash_render::{
    BarChartRenderer, ExcelExporter, HtmlReportRenderer, PieChartRenderer, TextRenderer,
    TrendChartRenderer,
};

use crate::{ChartKind, Commands, FilterArgs, OutputFormat};

/// Dispatch a parsed command
pub fn run(command: Commands, config_path: Option<&Path>) -> Result<()> {
    let config = ReportConfig::load_or_default(config_path)?;

    match command {
        Commands::Columns { file, format } => columns(&config, file, format),
        Commands::Rank {
            file,
            metric,
            filters,
            format,
        } => rank(&config, file, metric, &filters, format),
        Commands::Report {
            file,
            output,
            metrics,
            chart_metric,
            layout,
            filters,
        } => {
            let mut selection = filters.selection().metrics(metrics);
            if let Some(name) = chart_metric {
                selection = selection.chart_metric(name);
            }
            report(&config, file, &output, &selection, layout)
        }
        Commands::Chart {
            file,
            kind,
            metric,
            output,
            filters,
        } => chart(&config, file, kind, metric, &output, &filters),
        Commands::Export {
            file,
            output,
            filters,
        } => export(&config, file, output, &filters),
        Commands::Config { output } => print_config(&config, output),
    }
}

fn load(config: &ReportConfig, file: Option<PathBuf>) -> Result<Arc<RecordTable>> {
    let path = file.unwrap_or_else(|| config.source_path.clone());
    let table =
        load_cached(&path).with_context(|| format!("Failed to load {}", path.display()))?;
    validate_schema(&table, &config.key_columns())?;
    tracing::info!(rows = table.len(), columns = table.columns().len(), "dataset ready");
    Ok(table)
}

fn write_output(path: &Path, content: impl AsRef<[u8]>) -> Result<()> {
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

// ============================================================================
// Commands
// ============================================================================

fn columns(config: &ReportConfig, file: Option<PathBuf>, format: OutputFormat) -> Result<()> {
    let table = load(config, file)?;
    let summary = DatasetSummary::of(&table, &config.key_columns());

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Text => {
            println!("{} rows", summary.rows);
            for column in &summary.columns {
                println!("  {:<12} {}", column.kind.as_str(), column.name);
            }
            println!("metrics: {}", summary.metrics.join(", "));
            println!("localities: {}", summary.localities.join(", "));
            let years: Vec<String> = summary.years.iter().map(ToString::to_string).collect();
            println!("years: {}", years.join(", "));
        }
    }
    Ok(())
}

fn rank(
    config: &ReportConfig,
    file: Option<PathBuf>,
    metric: String,
    filters: &FilterArgs,
    format: OutputFormat,
) -> Result<()> {
    let table = load(config, file)?;
    let selection = filters.selection().metric(metric);
    let report = Report::build(&table, config, &selection)?;

    let Some(section) = report.sections().first() else {
        bail!("No ranking was produced");
    };
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&section.ranking)?),
        OutputFormat::Text => {
            print!(
                "{}",
                TextRenderer::new().render_ranking(&section.ranking, config.decimals)
            );
        }
    }
    Ok(())
}

fn report(
    config: &ReportConfig,
    file: Option<PathBuf>,
    output: &Path,
    selection: &Selection,
    layout: Option<Layout>,
) -> Result<()> {
    let built = load(config, file)
        .and_then(|table| Report::build(&table, config, selection).map_err(Into::into));

    let report = match built {
        Ok(report) => report,
        Err(e) => {
            // Load, schema and selection failures all leave a page behind
            let message = format!("{e:#}");
            let page = HtmlReportRenderer::error_page(&config.title, &message, config.right_to_left);
            write_output(output, page)?;
            return Err(e);
        }
    };

    let mut renderer = HtmlReportRenderer::new();
    if let Some(layout) = layout {
        renderer = renderer.layout(layout);
    }
    let html = renderer.render(&report)?;
    write_output(output, html)?;

    if let Some(prompt) = report.prompt() {
        println!("{prompt}");
    } else {
        println!(
            "Report: {} ({} rows, {} metrics)",
            output.display(),
            report.filtered.len(),
            report.sections().len()
        );
    }
    Ok(())
}

fn chart(
    config: &ReportConfig,
    file: Option<PathBuf>,
    kind: ChartKind,
    metric: Option<String>,
    output: &Path,
    filters: &FilterArgs,
) -> Result<()> {
    let table = load(config, file)?;
    let metric = match metric {
        Some(m) => m,
        None => table
            .metric_columns(&config.year_column)
            .into_iter()
            .next()
            .context("The dataset has no numeric metric columns")?,
    };
    let selection = filters.selection().metric(metric.clone()).chart_metric(metric);
    let report = Report::build(&table, config, &selection)?;

    let svg = match kind {
        ChartKind::Trend => TrendChartRenderer::new().render(&report)?,
        ChartKind::Bar => BarChartRenderer::new().render(&report)?,
        ChartKind::Pie => PieChartRenderer::new().render(&report)?,
    };
    match svg {
        Some(svg) => {
            write_output(output, svg)?;
            println!("Chart: {}", output.display());
        }
        None => {
            tracing::warn!(kind = ?kind, "nothing to chart");
            println!("No data to chart for this selection");
        }
    }
    Ok(())
}

fn export(
    config: &ReportConfig,
    file: Option<PathBuf>,
    output: Option<PathBuf>,
    filters: &FilterArgs,
) -> Result<()> {
    let table = load(config, file)?;
    let report = Report::build(&table, config, &filters.selection())?;

    let bytes = ExcelExporter::new().render(&report)?;
    let output = output.unwrap_or_else(|| PathBuf::from(&config.export_file_name));
    write_output(&output, bytes)?;
    println!(
        "Exported {} rows: {}",
        report.filtered.len(),
        output.display()
    );
    Ok(())
}

fn print_config(config: &ReportConfig, output: Option<PathBuf>) -> Result<()> {
    let toml = config.to_toml_string()?;
    match output {
        Some(path) => {
            write_output(&path, toml)?;
            println!("Created: {}", path.display());
        }
        None => print!("{toml}"),
    }
    Ok(())
}
