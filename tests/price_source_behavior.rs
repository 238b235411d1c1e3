//! Behavior-driven tests for price sources feeding the analysis pipeline
//!
//! These tests verify how fetched closes become a price table, how partial
//! failures surface, and what a full run exports.

use std::sync::Arc;
use std::time::Duration;

use sectorwatch_core::{
    export_change_csv, export_trend_csv, run_analysis, AnalysisConfig, AnalysisError, CacheMode,
    CacheStore, CachedSource, CoreError, DateAlignment, DateRange, FixtureSource,
    HistoryRequest, HttpResponse, Instrument, PriceSource, ProviderId, RetryConfig,
    ScriptedHttpClient, SourceError, SourceErrorKind, Symbol, SyntheticSource, TradingDate,
    YahooAdapter, DEFAULT_SUMMARY_FILE,
};

fn date(value: &str) -> TradingDate {
    TradingDate::parse(value).expect("valid date")
}

fn symbol(value: &str) -> Symbol {
    Symbol::parse(value).expect("valid symbol")
}

fn instrument(label: &str, ticker: &str) -> Instrument {
    Instrument::new(label, symbol(ticker)).expect("valid instrument")
}

/// IT, BANK and METAL against NIFTY_50 over a 30-day window ending 2024-02-01.
fn sector_config() -> AnalysisConfig {
    AnalysisConfig::default()
        .with_lookback_days(30)
        .with_instruments(vec![
            instrument("IT", "^CNXIT"),
            instrument("BANK", "^NSEBANK"),
            instrument("METAL", "^CNXMETAL"),
            instrument("NIFTY_50", "^NSEI"),
        ])
        .with_benchmark("NIFTY_50")
}

fn end() -> TradingDate {
    date("2024-02-01")
}

fn sessions(closes: &[f64]) -> Vec<(TradingDate, f64)> {
    let start = date("2024-01-08");
    closes
        .iter()
        .enumerate()
        .map(|(offset, close)| (start.saturating_add_days(offset as u32), *close))
        .collect()
}

// =============================================================================
// Pipeline: Fixture Data
// =============================================================================

#[tokio::test]
async fn when_all_instruments_load_system_ranks_them_against_benchmark() {
    // Given: Fixture closes where IT beats the benchmark and BANK and METAL lag
    let source = FixtureSource::new()
        .with_closes(symbol("^NSEI"), &sessions(&[21_000.0, 21_210.0, 21_420.0]))
        .with_closes(symbol("^CNXIT"), &sessions(&[35_000.0, 36_000.0, 37_100.0]))
        .with_closes(symbol("^NSEBANK"), &sessions(&[47_000.0, 46_500.0, 46_000.0]))
        .with_closes(symbol("^CNXMETAL"), &sessions(&[8_000.0, 8_050.0, 8_100.0]));

    // When: The pipeline runs
    let outcome = run_analysis(&source, &sector_config(), end())
        .await
        .expect("analysis succeeds");

    // Then: IT leads and is the only outperformer; nothing was skipped
    let ranked: Vec<&str> = outcome
        .report
        .changes
        .iter()
        .map(|entry| entry.label.as_str())
        .collect();
    assert_eq!(ranked, vec!["IT", "METAL", "BANK"]);
    assert_eq!(outcome.report.outperformers().labels().collect::<Vec<_>>(), vec!["IT"]);
    assert!(outcome.skipped.is_empty());
    assert_eq!(outcome.provider, ProviderId::Fixture);
    assert_eq!(outcome.range, DateRange::new(date("2024-01-02"), end()).expect("range"));
}

#[tokio::test]
async fn when_one_sector_fails_system_reports_it_and_ranks_the_rest() {
    // Given: BANK cannot be fetched
    let source = FixtureSource::new()
        .with_closes(symbol("^NSEI"), &sessions(&[100.0, 101.0]))
        .with_closes(symbol("^CNXIT"), &sessions(&[50.0, 52.0]))
        .with_error(symbol("^NSEBANK"), SourceError::rate_limited("slow down"))
        .with_closes(symbol("^CNXMETAL"), &sessions(&[20.0, 19.0]));

    // When: The pipeline runs
    let outcome = run_analysis(&source, &sector_config(), end())
        .await
        .expect("partial data is still analysable");

    // Then: BANK appears as a skipped instrument, not in the ranking
    assert_eq!(outcome.skipped.len(), 1);
    assert_eq!(outcome.skipped[0].label, "BANK");
    assert_eq!(outcome.skipped[0].code, "source.rate_limited");
    assert!(outcome.report.changes.get("BANK").is_none());
    assert_eq!(outcome.report.changes.len(), 2);
}

#[tokio::test]
async fn when_benchmark_fails_system_aborts_with_missing_benchmark() {
    // Given: The benchmark has no data at all
    let source = FixtureSource::new()
        .with_closes(symbol("^CNXIT"), &sessions(&[50.0, 52.0]))
        .with_closes(symbol("^NSEBANK"), &sessions(&[40.0, 41.0]))
        .with_closes(symbol("^CNXMETAL"), &sessions(&[20.0, 19.0]));

    // When/Then: The whole run fails
    let error = run_analysis(&source, &sector_config(), end())
        .await
        .expect_err("benchmark is required");
    assert!(matches!(
        error,
        CoreError::Analysis(AnalysisError::MissingBenchmark { .. })
    ));
}

#[tokio::test]
async fn when_only_benchmark_loads_system_reports_empty_table() {
    let source = FixtureSource::new().with_closes(symbol("^NSEI"), &sessions(&[100.0, 101.0]));

    let error = run_analysis(&source, &sector_config(), end())
        .await
        .expect_err("nothing to compare");
    assert!(matches!(
        error,
        CoreError::Analysis(AnalysisError::EmptyTable { .. })
    ));
}

#[tokio::test]
async fn when_sessions_differ_union_alignment_keeps_every_date() {
    // Given: IT is missing the middle session
    let source = FixtureSource::new()
        .with_closes(symbol("^NSEI"), &sessions(&[100.0, 101.0, 102.0]))
        .with_closes(
            symbol("^CNXIT"),
            &[(date("2024-01-08"), 50.0), (date("2024-01-10"), 55.0)],
        )
        .with_closes(symbol("^NSEBANK"), &sessions(&[40.0, 41.0, 42.0]))
        .with_closes(symbol("^CNXMETAL"), &sessions(&[20.0, 20.0, 20.0]));

    // When: Intersection and union alignment are both used
    let intersection = run_analysis(&source, &sector_config(), end())
        .await
        .expect("intersection run");
    let union = run_analysis(
        &source,
        &sector_config().with_alignment(DateAlignment::Union),
        end(),
    )
    .await
    .expect("union run");

    // Then: Intersection drops the gap; union keeps it as NaN but the endpoints agree
    assert_eq!(intersection.report.ratios.row_count(), 2);
    assert_eq!(union.report.ratios.row_count(), 3);
    let it = union.report.ratios.column("IT").expect("IT ratios");
    assert!(it[1].is_nan());
    assert_eq!(
        intersection.report.changes.get("IT"),
        union.report.changes.get("IT")
    );
}

// =============================================================================
// Synthetic Source and Cache
// =============================================================================

#[tokio::test]
async fn when_synthetic_source_is_used_default_sectors_are_all_ranked() {
    let outcome = run_analysis(&SyntheticSource::default(), &AnalysisConfig::default(), end())
        .await
        .expect("synthetic analysis succeeds");

    assert_eq!(outcome.report.changes.len(), 7);
    assert!(outcome.report.ratios.row_count() > 50);
    assert!(outcome.report.changes.iter().all(|entry| entry.change.is_finite()));
}

#[tokio::test]
async fn when_cache_is_enabled_repeated_runs_reuse_fetched_series() {
    // Given: A cached synthetic source
    let source = CachedSource::new(
        SyntheticSource::default(),
        CacheStore::new(Duration::from_secs(60)),
        CacheMode::Use,
    );

    // When: The same analysis runs twice
    let first = run_analysis(&source, &sector_config(), end()).await.expect("first run");
    let second = run_analysis(&source, &sector_config(), end()).await.expect("second run");

    // Then: The second run is served from cache and matches the first
    assert_eq!(first.report, second.report);
    assert_eq!(source.store().len().await, 4);
    assert_eq!(source.store().stats().await, (4, 4));
}

// =============================================================================
// Yahoo Adapter Through the Pipeline
// =============================================================================

fn chart_body(closes: &[Option<f64>]) -> String {
    // 2024-01-08 09:15 IST and the following sessions, one day apart.
    let timestamps: Vec<i64> = (0..closes.len() as i64)
        .map(|offset| 1_704_685_500 + offset * 86_400)
        .collect();
    serde_json::json!({
        "chart": {
            "result": [{
                "meta": { "gmtoffset": 19_800 },
                "timestamp": timestamps,
                "indicators": { "quote": [{ "close": closes }] }
            }],
            "error": null
        }
    })
    .to_string()
}

#[tokio::test]
async fn when_yahoo_returns_chart_data_system_builds_report() {
    // Given: Scripted chart responses for a two-instrument universe
    let client = Arc::new(
        ScriptedHttpClient::always(HttpResponse::new(500, "unexpected"))
            .then(Ok(HttpResponse::ok_json(chart_body(&[Some(100.0), Some(110.0)]))))
            .then(Ok(HttpResponse::ok_json(chart_body(&[
                Some(50.0),
                None,
                Some(60.0),
            ])))),
    );
    let adapter = YahooAdapter::with_http_client(client.clone())
        .with_retry(RetryConfig::no_retry())
        .without_crumb();
    let config = AnalysisConfig::default()
        .with_instruments(vec![instrument("NIFTY_50", "^NSEI"), instrument("X", "XLK")])
        .with_benchmark("NIFTY_50");

    // When: The pipeline runs against the adapter
    let outcome = run_analysis(&adapter, &config, end())
        .await
        .expect("analysis succeeds");

    // Then: Null closes are dropped and the shared sessions drive the change
    assert_eq!(outcome.provider, ProviderId::Yahoo);
    assert_eq!(outcome.report.ratios.dates(), [date("2024-01-08")]);
    assert_eq!(outcome.report.changes.get("X"), Some(0.0));
    assert_eq!(client.recorded_requests().len(), 2);
}

#[tokio::test]
async fn when_yahoo_has_no_data_for_symbol_system_surfaces_no_data() {
    let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
    let adapter = YahooAdapter::with_http_client(Arc::new(ScriptedHttpClient::always(
        HttpResponse::new(404, body),
    )))
    .without_crumb();
    let range = DateRange::new(date("2024-01-01"), end()).expect("range");

    let error = adapter
        .daily_closes(HistoryRequest::new(symbol("NOPE"), range))
        .await
        .expect_err("unknown symbol");
    assert_eq!(error.kind(), SourceErrorKind::NoData);
    assert!(!error.retryable());
}

// =============================================================================
// Exports
// =============================================================================

#[tokio::test]
async fn when_exports_are_requested_system_writes_summary_and_trend_files() {
    // Given: A completed synthetic run
    let outcome = run_analysis(&SyntheticSource::default(), &sector_config(), end())
        .await
        .expect("analysis succeeds");
    let dir = tempfile::tempdir().expect("tempdir");
    let summary = dir.path().join(DEFAULT_SUMMARY_FILE);
    let trend = dir.path().join("trend.csv");

    // When: Both exports are written
    export_change_csv(&outcome.report.changes, &summary).expect("summary export");
    export_trend_csv(&outcome.report.ratios, &trend).expect("trend export");

    // Then: The summary lists every ranked instrument in order
    let summary_text = std::fs::read_to_string(&summary).expect("summary readable");
    let mut lines = summary_text.lines();
    assert_eq!(lines.next(), Some("instrument,rs_change"));
    let labels: Vec<&str> = lines
        .map(|line| line.split(',').next().expect("label column"))
        .collect();
    let ranked: Vec<&str> = outcome
        .report
        .changes
        .iter()
        .map(|entry| entry.label.as_str())
        .collect();
    assert_eq!(labels, ranked);

    // And: The trend has a header plus one line per session
    let trend_text = std::fs::read_to_string(&trend).expect("trend readable");
    assert_eq!(trend_text.lines().next(), Some("date,IT,BANK,METAL"));
    assert_eq!(
        trend_text.lines().count(),
        outcome.report.ratios.row_count() + 1
    );
}
