//! CLI argument definitions for sectorwatch.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `analyze` | Rank sectors by relative strength against the benchmark |
//! | `instruments` | List the configured instruments and benchmark |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `table` | Output format (table, json, csv) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--source` | `yahoo` | Price source |
//! | `--timeout-ms` | `10000` | Request timeout in ms |
//! | `--config` | none | TOML analysis config |
//! | `--verbose` | `false` | Debug logging on stderr |
//! | `--no-cache` | `false` | Neither read nor write the close cache |
//! | `--cache-dir` | `~/.sectorwatch/cache` | Directory for cached closes |
//!
//! # Examples
//!
//! ```bash
//! # NSE sectors against the NIFTY 50 over the last 90 days
//! sectorwatch analyze
//!
//! # Six months, exported for a spreadsheet
//! sectorwatch analyze --lookback 180 --export
//!
//! # Custom universe
//! sectorwatch analyze --instrument SPX=^GSPC --instrument TECH=XLK --benchmark SPX
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use sectorwatch_core::{DateAlignment, Instrument, ProviderId, DEFAULT_SUMMARY_FILE};

/// Sector relative-strength analysis against a benchmark index.
#[derive(Debug, Parser)]
#[command(
    name = "sectorwatch",
    author,
    version,
    about = "Sector relative-strength analysis against a benchmark index",
    long_about = "sectorwatch divides each sector index by a benchmark, measures how the ratio \
moved over a lookback window, and lists the sectors that outperformed.\n\
\n\
Use 'sectorwatch <command> --help' for command-specific help."
)]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Price source for daily closes.
    #[arg(long, global = true, value_enum, default_value_t = SourceSelector::Yahoo)]
    pub source: SourceSelector,

    /// Request timeout budget in milliseconds.
    #[arg(long, global = true, default_value_t = 10_000)]
    pub timeout_ms: u64,

    /// TOML file with benchmark, lookback_days, alignment and [[instruments]].
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log debug events to stderr (overrides RUST_LOG).
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Always fetch from the source; leave the close cache untouched.
    #[arg(long, global = true, default_value_t = false)]
    pub no_cache: bool,

    /// Close cache directory (default: $SECTORWATCH_HOME/cache or ~/.sectorwatch/cache).
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table with percentages.
    Table,
    /// Single JSON object with metadata.
    Json,
    /// `instrument,rs_change` rows.
    Csv,
}

/// Price source selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceSelector {
    /// Yahoo Finance daily chart data.
    Yahoo,
    /// Deterministic offline random walk.
    Synthetic,
}

impl SourceSelector {
    pub const fn provider_id(self) -> ProviderId {
        match self {
            Self::Yahoo => ProviderId::Yahoo,
            Self::Synthetic => ProviderId::Synthetic,
        }
    }
}

/// Row selection when instruments trade on different dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AlignmentArg {
    /// Keep dates every instrument traded on.
    Intersection,
    /// Keep every date; gaps become NaN.
    Union,
}

impl From<AlignmentArg> for DateAlignment {
    fn from(value: AlignmentArg) -> Self {
        match value {
            AlignmentArg::Intersection => Self::Intersection,
            AlignmentArg::Union => Self::Union,
        }
    }
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Rank instruments by relative strength against the benchmark.
    ///
    /// # Examples
    ///
    ///   sectorwatch analyze
    ///   sectorwatch analyze --lookback 30 --format json --pretty
    ///   sectorwatch analyze --export summary.csv --trend-export trend.csv
    Analyze(AnalyzeArgs),

    /// List the configured instruments, benchmark and lookback presets.
    Instruments,
}

/// Arguments for the `analyze` command.
#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// Lookback window in calendar days (presets: 30, 60, 90, 180, 365).
    #[arg(long)]
    pub lookback: Option<u32>,

    /// Benchmark label; must be one of the instruments.
    #[arg(long)]
    pub benchmark: Option<String>,

    /// Instrument as LABEL=SYMBOL; repeat to replace the configured set.
    #[arg(long = "instrument", value_name = "LABEL=SYMBOL")]
    pub instruments: Vec<Instrument>,

    /// Date alignment across instruments.
    #[arg(long, value_enum)]
    pub alignment: Option<AlignmentArg>,

    /// Write the change summary CSV (default file: relative_strength_summary.csv).
    #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = DEFAULT_SUMMARY_FILE)]
    pub export: Option<PathBuf>,

    /// Write the ratio trend CSV (date,<labels>).
    #[arg(long, value_name = "PATH")]
    pub trend_export: Option<PathBuf>,

    /// Exclusive end of the window as YYYY-MM-DD (default: today, UTC).
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub end_date: Option<String>,
}
