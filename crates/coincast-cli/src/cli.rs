//! CLI argument definitions for coincast.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `forecast` | Run the full validate → fetch → forecast pipeline |
//! | `history` | Fetch the validated daily price series |
//! | `sources` | List data source health |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `json` | Output format (json, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--source` | `auto` | Source selection strategy |
//! | `--timeout-ms` | `10000` | Network timeout in ms |
//! | `--offline` | `false` | Deterministic fixture transport |
//! | `--no-cache` | `false` | Bypass the response cache |
//!
//! # Examples
//!
//! ```bash
//! # Next-day and one-month projection over the default five-year range
//! coincast forecast --pretty
//!
//! # Custom range and lookback window
//! coincast forecast --start 2022-01-01 --end 2024-01-01 --lookback 14
//!
//! # Tabulated history pinned to coinbase
//! coincast history --start 2024-01-01 --end 2024-03-01 --source coinbase --format table
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Bitcoin price history and linear-regression projections.
///
/// Fetches daily BTC-USD data from public market-data providers
/// (Yahoo Finance, Coinbase) and fits a lookback-window linear model
/// over the closes. Educational output, not financial advice.
#[derive(Debug, Parser)]
#[command(
    name = "coincast",
    author,
    version,
    about = "Bitcoin price history and linear-regression projections",
    long_about = "Coincast fetches historical BTC-USD prices and projects the next day and the \
next month with a simple linear regression. Features include:\n\
\n\
  • Interchangeable data sources (Yahoo Finance, Coinbase) with fallback\n\
  • One-hour response cache keyed by the requested range\n\
  • Structured JSON envelope output with request metadata\n\
\n\
The projections are an educational exercise in curve fitting, not a trading signal.\n\
Use 'coincast <command> --help' for command-specific help."
)]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Source selection strategy for routing requests.
    #[arg(long, global = true, value_enum, default_value_t = SourceSelector::Auto)]
    pub source: SourceSelector,

    /// Network timeout budget in milliseconds.
    #[arg(long, global = true, default_value_t = 10_000)]
    pub timeout_ms: u64,

    /// Serve deterministic offline fixtures instead of live data.
    #[arg(long, global = true, default_value_t = false)]
    pub offline: bool,

    /// Bypass the one-hour response cache.
    #[arg(long, global = true, default_value_t = false)]
    pub no_cache: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format for terminal display.
    Table,
    /// Single JSON object output.
    Json,
}

/// Source selection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceSelector {
    /// Priority order with fallback (yahoo, then coinbase).
    Auto,
    /// Use Yahoo Finance directly.
    Yahoo,
    /// Use Coinbase directly.
    Coinbase,
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the forecast pipeline: validate, fetch, fit, project.
    ///
    /// Produces the current-price snapshot, the next-day prediction
    /// with its 95% interval, and the derived one-month projection.
    ///
    /// # Examples
    ///
    ///   coincast forecast
    ///   coincast forecast --start 2022-01-01 --end 2024-01-01 --lookback 14
    Forecast(ForecastArgs),

    /// Fetch the validated daily OHLCV series.
    ///
    /// # Examples
    ///
    ///   coincast history --start 2024-01-01 --end 2024-03-01
    History(HistoryArgs),

    /// List data source health.
    Sources,
}

/// Arguments for the `forecast` command.
#[derive(Debug, Args)]
pub struct ForecastArgs {
    /// Range start date (YYYY-MM-DD). Default: five years ago.
    #[arg(long)]
    pub start: Option<String>,

    /// Range end date (YYYY-MM-DD), exclusive. Default: today.
    #[arg(long)]
    pub end: Option<String>,

    /// Number of past daily closes used as regression features (1-30).
    #[arg(long, default_value_t = 7)]
    pub lookback: usize,
}

/// Arguments for the `history` command.
#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Range start date (YYYY-MM-DD). Default: five years ago.
    #[arg(long)]
    pub start: Option<String>,

    /// Range end date (YYYY-MM-DD), exclusive. Default: today.
    #[arg(long)]
    pub end: Option<String>,
}
