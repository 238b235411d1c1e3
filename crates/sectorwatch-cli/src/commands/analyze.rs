use std::time::{Duration, Instant};

use serde::Serialize;

use sectorwatch_core::{
    default_cache_dir, export_change_csv, export_trend_csv, run_analysis, AnalysisConfig,
    AnalysisOutcome, CacheMode, CacheStore, CachedSource, PriceSource, RelativeStrengthReport,
    SkippedInstrument, SyntheticSource, TradingDate, YahooAdapter,
};

use crate::cli::{AnalyzeArgs, Cli, SourceSelector};
use crate::error::CliError;
use crate::metadata::Metadata;

use super::CommandResult;

/// Closes are cached for an hour; later runs the same day reuse them.
const CACHE_TTL: Duration = Duration::from_secs(3_600);

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub meta: Metadata,
    pub report: RelativeStrengthReport,
    pub outperformers: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedInstrument>,
}

impl AnalysisResponse {
    pub fn new(meta: Metadata, outcome: AnalysisOutcome) -> Self {
        let outperformers = outcome
            .report
            .outperformers()
            .labels()
            .map(str::to_owned)
            .collect();
        Self {
            meta,
            report: outcome.report,
            outperformers,
            skipped: outcome.skipped,
        }
    }
}

pub async fn run(
    args: &AnalyzeArgs,
    cli: &Cli,
    config: AnalysisConfig,
) -> Result<CommandResult, CliError> {
    let config = apply_overrides(config, args);
    config.validate()?;

    let end = match &args.end_date {
        Some(raw) => TradingDate::parse(raw)?,
        None => TradingDate::today_utc(),
    };

    let (source, cache) = build_source(cli);
    let started = Instant::now();
    let outcome = run_analysis(source.as_ref(), &config, end).await?;
    let latency_ms = started.elapsed().as_millis() as u64;
    let (hits, misses) = cache.stats().await;

    let mut meta = Metadata::new(outcome.provider)?
        .with_window(outcome.range)
        .with_latency_ms(latency_ms)
        .with_cache_hit(hits > 0 && misses == 0);
    for skipped in &outcome.skipped {
        meta.push_warning(format!(
            "skipped {} ({}): [{}] {}",
            skipped.label, skipped.symbol, skipped.code, skipped.message
        ));
    }

    if let Some(path) = &args.export {
        export_change_csv(&outcome.report.changes, path)?;
        meta.push_export(path.display().to_string());
    }
    if let Some(path) = &args.trend_export {
        export_trend_csv(&outcome.report.ratios, path)?;
        meta.push_export(path.display().to_string());
    }

    Ok(CommandResult::Analysis(Box::new(AnalysisResponse::new(
        meta, outcome,
    ))))
}

/// Command-line values win over the config file.
///
/// When `--instrument` replaces the set without `--benchmark`, the configured
/// benchmark is kept if it is still present, otherwise the first instrument is used.
fn apply_overrides(mut config: AnalysisConfig, args: &AnalyzeArgs) -> AnalysisConfig {
    if let Some(lookback) = args.lookback {
        config = config.with_lookback_days(lookback);
    }
    if let Some(alignment) = args.alignment {
        config = config.with_alignment(alignment.into());
    }
    if !args.instruments.is_empty() {
        let keeps_benchmark = args
            .instruments
            .iter()
            .any(|instrument| instrument.label == config.benchmark);
        if !keeps_benchmark && args.benchmark.is_none() {
            config.benchmark = args.instruments[0].label.clone();
        }
        config = config.with_instruments(args.instruments.clone());
    }
    if let Some(benchmark) = &args.benchmark {
        config = config.with_benchmark(benchmark.clone());
    }
    config
}

/// Source wrapped in the on-disk close cache, plus a handle for hit statistics.
fn build_source(cli: &Cli) -> (Box<dyn PriceSource>, CacheStore) {
    let mode = if cli.no_cache {
        CacheMode::Bypass
    } else {
        CacheMode::Use
    };
    let dir = cli.cache_dir.clone().unwrap_or_else(default_cache_dir);
    let store = CacheStore::persistent(dir, CACHE_TTL);

    let source: Box<dyn PriceSource> = match cli.source {
        SourceSelector::Yahoo => Box::new(CachedSource::new(
            YahooAdapter::default().with_timeout_ms(cli.timeout_ms),
            store.clone(),
            mode,
        )),
        SourceSelector::Synthetic => Box::new(CachedSource::new(
            SyntheticSource::default(),
            store.clone(),
            mode,
        )),
    };
    (source, store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use sectorwatch_core::DateAlignment;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["sectorwatch", "--source", "synthetic", "analyze"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).expect("valid arguments")
    }

    fn analyze_args(cli: &Cli) -> &AnalyzeArgs {
        match &cli.command {
            crate::cli::Command::Analyze(args) => args,
            crate::cli::Command::Instruments => panic!("expected analyze"),
        }
    }

    #[test]
    fn instrument_override_falls_back_to_first_label() {
        let cli = parse(&["--instrument", "SPX=^GSPC", "--instrument", "TECH=XLK"]);
        let config = apply_overrides(AnalysisConfig::default(), analyze_args(&cli));
        assert_eq!(config.benchmark, "SPX");
        assert_eq!(config.instruments.len(), 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn explicit_flags_override_config() {
        let cli = parse(&["--lookback", "30", "--benchmark", "IT", "--alignment", "union"]);
        let config = apply_overrides(AnalysisConfig::default(), analyze_args(&cli));
        assert_eq!(config.lookback_days, 30);
        assert_eq!(config.benchmark, "IT");
        assert_eq!(config.alignment, DateAlignment::Union);
    }

    #[tokio::test]
    async fn synthetic_run_exports_summary() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("summary.csv");
        let path_arg = path.display().to_string();
        let cache_arg = dir.path().join("cache").display().to_string();
        let cli = parse(&[
            "--end-date",
            "2024-04-01",
            "--export",
            &path_arg,
            "--cache-dir",
            &cache_arg,
        ]);

        let result = run(analyze_args(&cli), &cli, AnalysisConfig::default())
            .await
            .expect("synthetic analysis succeeds");

        let CommandResult::Analysis(response) = result else {
            panic!("expected analysis result");
        };
        assert_eq!(response.report.changes.len(), 7);
        assert_eq!(response.meta.exports, vec![path_arg]);
        let written = std::fs::read_to_string(&path).expect("export written");
        assert!(written.starts_with("instrument,rs_change\n"));
        assert_eq!(written.lines().count(), 8);
    }

    async fn analysis_response(cli: &Cli) -> Box<AnalysisResponse> {
        let result = run(analyze_args(cli), cli, AnalysisConfig::default())
            .await
            .expect("synthetic analysis succeeds");
        match result {
            CommandResult::Analysis(response) => response,
            CommandResult::Instruments(_) => panic!("expected analysis result"),
        }
    }

    #[tokio::test]
    async fn second_run_is_served_from_disk_cache() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache_arg = dir.path().display().to_string();
        let cli = parse(&["--end-date", "2024-04-01", "--cache-dir", &cache_arg]);

        let first = analysis_response(&cli).await;
        assert!(!first.meta.cache_hit);
        let files = std::fs::read_dir(dir.path()).expect("cache dir").count();
        assert_eq!(files, 8);

        let second = analysis_response(&cli).await;
        assert!(second.meta.cache_hit);
        assert_eq!(second.report, first.report);
    }

    #[tokio::test]
    async fn no_cache_leaves_cache_dir_untouched() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache_dir = dir.path().join("cache");
        let cache_arg = cache_dir.display().to_string();
        let cli = parse(&[
            "--no-cache",
            "--end-date",
            "2024-04-01",
            "--cache-dir",
            &cache_arg,
        ]);

        let first = analysis_response(&cli).await;
        let second = analysis_response(&cli).await;

        assert!(!first.meta.cache_hit);
        assert!(!second.meta.cache_hit);
        assert!(!cache_dir.exists());
    }

    #[tokio::test]
    async fn invalid_end_date_is_a_validation_error() {
        let cli = parse(&["--end-date", "04/01/2024"]);
        let error = run(analyze_args(&cli), &cli, AnalysisConfig::default())
            .await
            .expect_err("must fail");
        assert_eq!(error.exit_code(), 2);
    }
}
