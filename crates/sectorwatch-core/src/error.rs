use thiserror::Error;

/// Validation and contract errors exposed by `sectorwatch-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol must start with an ASCII letter or '^': '{ch}'")]
    SymbolInvalidStart { ch: char },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("instrument label cannot be empty")]
    EmptyLabel,
    #[error("instrument label '{label}' is defined more than once")]
    DuplicateLabel { label: String },
    #[error("instrument set must not be empty")]
    EmptyInstrumentSet,
    #[error("benchmark label '{label}' is not part of the instrument set")]
    UnknownBenchmark { label: String },
    #[error("instrument spec must look like LABEL=SYMBOL: '{value}'")]
    InvalidInstrumentSpec { value: String },

    #[error("invalid source '{value}', expected one of yahoo, synthetic, fixture")]
    InvalidSource { value: String },

    #[error("trading date must be YYYY-MM-DD: '{value}'")]
    InvalidDate { value: String },
    #[error("date range start {start} must be before end {end}")]
    InvalidDateRange { start: String, end: String },
    #[error("lookback must be between 1 and {max} days, got {value}")]
    InvalidLookback { value: u32, max: u32 },

    #[error("price table dates must be strictly increasing (row {index}: {date})")]
    UnorderedDates { index: usize, date: String },
    #[error("column '{label}' has {actual} values but the table has {expected} dates")]
    ColumnLengthMismatch {
        label: String,
        expected: usize,
        actual: usize,
    },
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Analysis(#[from] crate::AnalysisError),

    #[error(transparent)]
    Source(#[from] crate::SourceError),

    #[error(transparent)]
    Export(#[from] crate::ExportError),

    #[error(transparent)]
    Config(#[from] crate::ConfigError),
}
