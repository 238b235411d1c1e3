use std::collections::HashMap;

use crate::data_source::{CloseSeriesFuture, HistoryRequest, PriceSource, SourceError};
use crate::{ClosePoint, CloseSeries, ProviderId, Symbol};

/// In-memory source answering from preloaded series or scripted errors.
#[derive(Debug, Clone, Default)]
pub struct FixtureSource {
    responses: HashMap<Symbol, Result<CloseSeries, SourceError>>,
}

impl FixtureSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, series: CloseSeries) -> Self {
        self.responses.insert(series.symbol.clone(), Ok(series));
        self
    }

    /// Convenience for `(date, close)` literals.
    pub fn with_closes(self, symbol: Symbol, closes: &[(crate::TradingDate, f64)]) -> Self {
        let points = closes
            .iter()
            .map(|(date, close)| ClosePoint {
                date: *date,
                close: *close,
            })
            .collect();
        self.with_series(CloseSeries::new(symbol, points))
    }

    pub fn with_error(mut self, symbol: Symbol, error: SourceError) -> Self {
        self.responses.insert(symbol, Err(error));
        self
    }
}

impl PriceSource for FixtureSource {
    fn id(&self) -> ProviderId {
        ProviderId::Fixture
    }

    fn daily_closes<'a>(&'a self, req: HistoryRequest) -> CloseSeriesFuture<'a> {
        let response = self.responses.get(&req.symbol).cloned().unwrap_or_else(|| {
            Err(SourceError::no_data(format!(
                "no fixture data for {}",
                req.symbol
            )))
        });
        Box::pin(async move { response })
    }
}
