//! Assembles a [`PriceTable`] from per-instrument close series.

use serde::Serialize;

use crate::data_source::{HistoryRequest, PriceSource, SourceErrorKind};
use crate::{
    CloseSeries, DateAlignment, DateRange, InstrumentSet, PriceTable, Symbol, ValidationError,
};

/// An instrument left out of the table, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedInstrument {
    pub label: String,
    pub symbol: Symbol,
    pub code: &'static str,
    pub message: String,
}

/// Result of fetching every instrument in a set.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    pub table: PriceTable,
    pub skipped: Vec<SkippedInstrument>,
}

impl FetchOutcome {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }

    pub fn was_skipped(&self, label: &str) -> bool {
        self.skipped.iter().any(|skipped| skipped.label == label)
    }
}

/// Fetches closes for an [`InstrumentSet`] and aligns them by date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PriceTableBuilder {
    alignment: DateAlignment,
}

impl PriceTableBuilder {
    pub fn new(alignment: DateAlignment) -> Self {
        Self { alignment }
    }

    pub fn alignment(&self) -> DateAlignment {
        self.alignment
    }

    /// Fetch every instrument in set order.
    ///
    /// Instruments whose fetch fails or yields no closes inside `range` are
    /// reported in [`FetchOutcome::skipped`] and left out of the table.
    pub async fn fetch<S>(
        &self,
        source: &S,
        instruments: &InstrumentSet,
        range: DateRange,
    ) -> Result<FetchOutcome, ValidationError>
    where
        S: PriceSource + ?Sized,
    {
        let mut series = Vec::with_capacity(instruments.len());
        let mut skipped = Vec::new();

        for instrument in instruments.iter() {
            let request = HistoryRequest::new(instrument.symbol.clone(), range);
            match source.daily_closes(request).await {
                Ok(closes) => {
                    let closes = clip_to_range(closes, range);
                    if closes.is_empty() {
                        tracing::warn!(
                            label = %instrument.label,
                            symbol = %instrument.symbol,
                            "no closes inside the requested window"
                        );
                        skipped.push(SkippedInstrument {
                            label: instrument.label.clone(),
                            symbol: instrument.symbol.clone(),
                            code: SourceErrorKind::NoData.code(),
                            message: format!(
                                "no closes between {} and {}",
                                range.start, range.end
                            ),
                        });
                        continue;
                    }
                    tracing::debug!(
                        label = %instrument.label,
                        rows = closes.len(),
                        "fetched closes"
                    );
                    series.push((instrument.label.clone(), closes));
                }
                Err(error) => {
                    tracing::warn!(
                        label = %instrument.label,
                        symbol = %instrument.symbol,
                        code = error.code(),
                        "skipping instrument: {}",
                        error.message()
                    );
                    skipped.push(SkippedInstrument {
                        label: instrument.label.clone(),
                        symbol: instrument.symbol.clone(),
                        code: error.code(),
                        message: error.message().to_owned(),
                    });
                }
            }
        }

        let table = PriceTable::from_series(series, self.alignment)?;
        Ok(FetchOutcome { table, skipped })
    }
}

fn clip_to_range(series: CloseSeries, range: DateRange) -> CloseSeries {
    if series.points().iter().all(|point| range.contains(point.date)) {
        return series;
    }
    let points = series
        .points()
        .iter()
        .filter(|point| range.contains(point.date))
        .copied()
        .collect();
    CloseSeries::new(series.symbol, points)
}
