//! Analysis configuration loaded from TOML.
//!
//! ```toml
//! benchmark = "NIFTY_50"
//! lookback_days = 90
//! alignment = "intersection"
//!
//! [[instruments]]
//! label = "IT"
//! symbol = "^CNXIT"
//!
//! [[instruments]]
//! label = "NIFTY_50"
//! symbol = "^NSEI"
//! ```
//!
//! Every key is optional; missing keys fall back to the NSE sector defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    AnalysisParams, DateAlignment, DateRange, Instrument, InstrumentSet, TradingDate,
    ValidationError,
};

/// Longest accepted lookback, in calendar days.
pub const MAX_LOOKBACK_DAYS: u32 = 3650;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Lookback windows offered by the interactive selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LookbackPreset {
    Days30,
    Days60,
    #[default]
    Days90,
    Days180,
    Days365,
}

impl LookbackPreset {
    pub const ALL: [Self; 5] = [
        Self::Days30,
        Self::Days60,
        Self::Days90,
        Self::Days180,
        Self::Days365,
    ];

    pub const fn days(self) -> u32 {
        match self {
            Self::Days30 => 30,
            Self::Days60 => 60,
            Self::Days90 => 90,
            Self::Days180 => 180,
            Self::Days365 => 365,
        }
    }

    pub fn from_days(days: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|preset| preset.days() == days)
    }
}

/// Instruments, benchmark, lookback and alignment for one analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    #[serde(default = "default_benchmark")]
    pub benchmark: String,

    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,

    #[serde(default)]
    pub alignment: DateAlignment,

    #[serde(default = "default_instruments")]
    pub instruments: Vec<Instrument>,
}

fn default_benchmark() -> String {
    InstrumentSet::nifty_sectors().benchmark().to_owned()
}

fn default_lookback_days() -> u32 {
    LookbackPreset::default().days()
}

fn default_instruments() -> Vec<Instrument> {
    InstrumentSet::nifty_sectors().iter().cloned().collect()
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            benchmark: default_benchmark(),
            lookback_days: default_lookback_days(),
            alignment: DateAlignment::default(),
            instruments: default_instruments(),
        }
    }
}

impl AnalysisConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded analysis config");
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_lookback(self.lookback_days)?;
        self.instrument_set().map(|_| ())
    }

    /// Validated instrument set; labels are re-trimmed and checked for duplicates.
    pub fn instrument_set(&self) -> Result<InstrumentSet, ValidationError> {
        let instruments = self
            .instruments
            .iter()
            .map(|instrument| Instrument::new(instrument.label.clone(), instrument.symbol.clone()))
            .collect::<Result<Vec<_>, _>>()?;
        InstrumentSet::new(instruments, self.benchmark.as_str())
    }

    pub fn params(&self) -> AnalysisParams {
        AnalysisParams::new(self.benchmark.trim())
    }

    /// Window ending at `end` (exclusive) and reaching back `lookback_days`.
    pub fn window(&self, end: TradingDate) -> Result<DateRange, ValidationError> {
        validate_lookback(self.lookback_days)?;
        DateRange::lookback(end, self.lookback_days)
    }

    pub fn with_benchmark(mut self, benchmark: impl Into<String>) -> Self {
        self.benchmark = benchmark.into();
        self
    }

    pub fn with_lookback_days(mut self, lookback_days: u32) -> Self {
        self.lookback_days = lookback_days;
        self
    }

    pub fn with_alignment(mut self, alignment: DateAlignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn with_instruments(mut self, instruments: Vec<Instrument>) -> Self {
        self.instruments = instruments;
        self
    }
}

fn validate_lookback(days: u32) -> Result<(), ValidationError> {
    if days == 0 || days > MAX_LOOKBACK_DAYS {
        return Err(ValidationError::InvalidLookback {
            value: days,
            max: MAX_LOOKBACK_DAYS,
        });
    }
    Ok(())
}
