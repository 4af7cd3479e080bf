//! surveydash CLI - Municipal social-survey dashboard
//!
//! Command-line interface for inspecting survey spreadsheets, ranking
//! localities, and rendering or exporting filtered reports.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use surveydash_core::{Layout, Selection, Year};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "surveydash")]
#[command(author, version, about = "Municipal social-survey dashboard", long_about = None)]
struct Cli {
    /// Verbose output (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Dashboard settings file (TOML)
    #[arg(short, long, value_name = "TOML", global = true, env = "SURVEYDASH_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List columns with their kinds, and the selectable values
    Columns {
        /// Input spreadsheet (defaults to the configured source)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Rank localities by a metric for the latest year
    Rank {
        /// Input spreadsheet (defaults to the configured source)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,

        /// Metric column to rank by
        #[arg(short, long)]
        metric: String,

        #[command(flatten)]
        filters: FilterArgs,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Render the dashboard page as HTML
    Report {
        /// Input spreadsheet (defaults to the configured source)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Metric to show (repeatable, in display order)
        #[arg(short, long = "metric", value_name = "METRIC")]
        metrics: Vec<String>,

        /// Metric for the single-chart views
        #[arg(long, value_name = "METRIC")]
        chart_metric: Option<String>,

        /// Page layout (single, tabs, sidebar)
        #[arg(long, value_parser = parse_layout)]
        layout: Option<Layout>,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Render one chart as SVG
    Chart {
        /// Input spreadsheet (defaults to the configured source)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,

        /// Chart to draw
        #[arg(short, long, value_enum)]
        kind: ChartKind,

        /// Metric to chart (defaults to the first metric column)
        #[arg(short, long)]
        metric: Option<String>,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Export the filtered rows to an Excel workbook
    Export {
        /// Input spreadsheet (defaults to the configured source)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,

        /// Output file (defaults to the configured export name)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Print the effective settings as TOML
    Config {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Row filters shared by the reporting commands
#[derive(Args, Debug, Default, Clone)]
struct FilterArgs {
    /// Keep only this locality (repeatable)
    #[arg(short, long = "locality", value_name = "NAME")]
    localities: Vec<String>,

    /// Keep only this year (repeatable)
    #[arg(short, long = "year", value_name = "YEAR")]
    years: Vec<Year>,

    /// Keep rows where any cell contains this text
    #[arg(short, long)]
    search: Option<String>,
}

impl FilterArgs {
    fn selection(&self) -> Selection {
        let selection = Selection::new()
            .localities(self.localities.iter().cloned())
            .years(self.years.iter().copied());
        match &self.search {
            Some(term) => selection.search(term.clone()),
            None => selection,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ChartKind {
    Trend,
    Bar,
    Pie,
}

fn parse_layout(s: &str) -> Result<Layout, String> {
    s.parse().map_err(|e: surveydash_core::ConfigError| e.to_string())
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let Some(command) = cli.command else {
        println!("surveydash - Municipal social-survey dashboard");
        println!("Run with --help for usage information");
        return ExitCode::SUCCESS;
    };

    match commands::run(command, cli.config.as_deref()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
