//! One end-to-end analysis run: fetch, align, compute.

use serde::Serialize;

use crate::builder::{PriceTableBuilder, SkippedInstrument};
use crate::data_source::PriceSource;
use crate::{
    compute_relative_strength, AnalysisConfig, CoreError, DateRange, ProviderId,
    RelativeStrengthReport, TradingDate,
};

/// Report plus the context it was produced in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisOutcome {
    pub provider: ProviderId,
    pub range: DateRange,
    pub report: RelativeStrengthReport,
    pub skipped: Vec<SkippedInstrument>,
}

/// Fetch the configured instruments over the lookback window ending at `end`
/// and compute their relative strength against the configured benchmark.
///
/// Instruments that fail to load are listed in [`AnalysisOutcome::skipped`];
/// the run only fails when the benchmark is lost or nothing is left to compare.
pub async fn run_analysis<S>(
    source: &S,
    config: &AnalysisConfig,
    end: TradingDate,
) -> Result<AnalysisOutcome, CoreError>
where
    S: PriceSource + ?Sized,
{
    let instruments = config.instrument_set()?;
    let range = config.window(end)?;
    tracing::info!(
        provider = %source.id(),
        instruments = instruments.len(),
        benchmark = instruments.benchmark(),
        start = %range.start,
        end = %range.end,
        "starting relative strength analysis"
    );

    let fetched = PriceTableBuilder::new(config.alignment)
        .fetch(source, &instruments, range)
        .await?;
    let report = compute_relative_strength(&fetched.table, &config.params())?;

    tracing::info!(
        rows = report.ratios.row_count(),
        ranked = report.changes.len(),
        outperformers = report.outperformers().len(),
        skipped = fetched.skipped.len(),
        "relative strength analysis finished"
    );

    Ok(AnalysisOutcome {
        provider: source.id(),
        range,
        report,
        skipped: fetched.skipped,
    })
}
