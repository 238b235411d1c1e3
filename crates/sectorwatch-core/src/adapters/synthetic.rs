use crate::data_source::{CloseSeriesFuture, HistoryRequest, PriceSource};
use crate::{ClosePoint, CloseSeries, ProviderId, Symbol};

/// Deterministic offline source: a seeded random walk per symbol on weekdays.
///
/// The same symbol and window always yield the same closes, so demos and
/// tests run without network access.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticSource {
    /// Standard daily move as a fraction (0.01 = 1%).
    pub volatility: f64,
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self { volatility: 0.012 }
    }
}

impl SyntheticSource {
    pub fn series(&self, req: &HistoryRequest) -> CloseSeries {
        let seed = symbol_seed(&req.symbol);
        let mut rng = fastrand::Rng::with_seed(seed);
        // Per-symbol drift in [-0.1%, +0.1%] a day so rankings differ between sectors.
        let drift = (rng.f64() - 0.5) * 0.002;
        let mut close = 1_000.0 + (seed % 20_000) as f64;

        let mut points = Vec::new();
        let mut date = req.range.start;
        while date < req.range.end {
            if !date.is_weekend() {
                let shock = (rng.f64() - 0.5) * 2.0 * self.volatility;
                close *= 1.0 + drift + shock;
                points.push(ClosePoint { date, close });
            }
            date = date.saturating_add_days(1);
        }

        CloseSeries::new(req.symbol.clone(), points)
    }
}

impl PriceSource for SyntheticSource {
    fn id(&self) -> ProviderId {
        ProviderId::Synthetic
    }

    fn daily_closes<'a>(&'a self, req: HistoryRequest) -> CloseSeriesFuture<'a> {
        let series = self.series(&req);
        Box::pin(async move { Ok(series) })
    }
}

fn symbol_seed(symbol: &Symbol) -> u64 {
    symbol
        .as_str()
        .bytes()
        .fold(0xcbf2_9ce4_8422_2325_u64, |hash, byte| {
            (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
        })
}
