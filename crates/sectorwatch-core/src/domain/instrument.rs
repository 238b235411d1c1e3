use std::collections::HashSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Symbol, ValidationError};

/// One labelled instrument, e.g. `IT` backed by `^CNXIT`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instrument {
    pub label: String,
    pub symbol: Symbol,
}

impl Instrument {
    pub fn new(label: impl Into<String>, symbol: Symbol) -> Result<Self, ValidationError> {
        let label = label.into().trim().to_owned();
        if label.is_empty() {
            return Err(ValidationError::EmptyLabel);
        }
        Ok(Self { label, symbol })
    }
}

impl FromStr for Instrument {
    type Err = ValidationError;

    /// Parses `LABEL=SYMBOL`. The symbol itself may contain `=` (`EURUSD=X`),
    /// so only the first `=` separates the two halves.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (label, symbol) =
            value
                .split_once('=')
                .ok_or_else(|| ValidationError::InvalidInstrumentSpec {
                    value: value.to_owned(),
                })?;
        if symbol.trim().is_empty() {
            return Err(ValidationError::InvalidInstrumentSpec {
                value: value.to_owned(),
            });
        }
        Self::new(label, Symbol::parse(symbol)?)
    }
}

/// Ordered set of uniquely labelled instruments with one benchmark.
///
/// Declaration order is preserved; it becomes the column order of the price
/// table and the tie-break order of the relative-strength ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstrumentSet {
    instruments: Vec<Instrument>,
    benchmark: String,
}

impl InstrumentSet {
    pub fn new(
        instruments: Vec<Instrument>,
        benchmark: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        if instruments.is_empty() {
            return Err(ValidationError::EmptyInstrumentSet);
        }

        let mut seen = HashSet::with_capacity(instruments.len());
        for instrument in &instruments {
            if !seen.insert(instrument.label.as_str()) {
                return Err(ValidationError::DuplicateLabel {
                    label: instrument.label.clone(),
                });
            }
        }

        let benchmark = benchmark.into().trim().to_owned();
        if !seen.contains(benchmark.as_str()) {
            return Err(ValidationError::UnknownBenchmark { label: benchmark });
        }

        Ok(Self {
            instruments,
            benchmark,
        })
    }

    /// NSE sector indices measured against the NIFTY 50.
    pub fn nifty_sectors() -> Self {
        let pairs = [
            ("IT", "^CNXIT"),
            ("BANK", "^NSEBANK"),
            ("FMCG", "^CNXFMCG"),
            ("AUTO", "^CNXAUTO"),
            ("PHARMA", "^CNXPHARMA"),
            ("METAL", "^CNXMETAL"),
            ("REALTY", "^CNXREALTY"),
            ("NIFTY_50", "^NSEI"),
        ];
        let instruments = pairs
            .into_iter()
            .map(|(label, symbol)| Instrument {
                label: label.to_owned(),
                symbol: Symbol::from_static(symbol),
            })
            .collect();

        Self {
            instruments,
            benchmark: String::from("NIFTY_50"),
        }
    }

    pub fn benchmark(&self) -> &str {
        &self.benchmark
    }

    pub fn benchmark_instrument(&self) -> Option<&Instrument> {
        self.get(&self.benchmark)
    }

    pub fn get(&self, label: &str) -> Option<&Instrument> {
        self.instruments
            .iter()
            .find(|instrument| instrument.label == label)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Instrument> {
        self.instruments.iter()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.instruments
            .iter()
            .map(|instrument| instrument.label.as_str())
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    /// Replace the benchmark label, validating it against the set.
    pub fn with_benchmark(self, benchmark: impl Into<String>) -> Result<Self, ValidationError> {
        Self::new(self.instruments, benchmark)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instrument(label: &str, symbol: &str) -> Instrument {
        Instrument::new(label, Symbol::parse(symbol).expect("valid symbol")).expect("valid label")
    }

    #[test]
    fn nifty_defaults_are_valid() {
        let set = InstrumentSet::nifty_sectors();
        let rebuilt = InstrumentSet::new(set.iter().cloned().collect(), set.benchmark())
            .expect("defaults must validate");
        assert_eq!(rebuilt.len(), 8);
        assert_eq!(rebuilt.benchmark(), "NIFTY_50");
        assert_eq!(
            rebuilt
                .benchmark_instrument()
                .map(|instrument| instrument.symbol.as_str()),
            Some("^NSEI")
        );
    }

    #[test]
    fn rejects_duplicate_labels() {
        let err = InstrumentSet::new(
            vec![instrument("IT", "^CNXIT"), instrument("IT", "^CNXIT")],
            "IT",
        )
        .expect_err("must fail");
        assert!(matches!(err, ValidationError::DuplicateLabel { .. }));
    }

    #[test]
    fn rejects_unknown_benchmark() {
        let err = InstrumentSet::new(vec![instrument("IT", "^CNXIT")], "NIFTY_50")
            .expect_err("must fail");
        assert!(matches!(err, ValidationError::UnknownBenchmark { .. }));
    }

    #[test]
    fn parses_label_symbol_spec() {
        let parsed: Instrument = "GOLD=GC=F".parse().expect("valid spec");
        assert_eq!(parsed.label, "GOLD");
        assert_eq!(parsed.symbol.as_str(), "GC=F");

        assert!(matches!(
            "GOLD".parse::<Instrument>(),
            Err(ValidationError::InvalidInstrumentSpec { .. })
        ));
    }
}
