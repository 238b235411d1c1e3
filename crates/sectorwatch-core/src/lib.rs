//! # Sectorwatch Core
//!
//! Relative-strength analytics for sector indices measured against a benchmark.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Domain models** for symbols, instruments, trading dates and price tables
//! - **Price sources** behind the [`PriceSource`] trait (Yahoo, synthetic, fixtures)
//! - **Resilience** for upstream calls: retry, circuit breaker, throttle, cache
//! - **Relative strength** ratios, window changes and outperformer ranking
//! - **Exports** of the ranking and the ratio trend as CSV
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Price source adapters (Yahoo, synthetic, fixture) |
//! | [`builder`] | Fetches instruments into an aligned price table |
//! | [`cache`] | TTL cache decorator for price sources |
//! | [`circuit_breaker`] | Circuit breaker for resilient calls |
//! | [`config`] | TOML analysis configuration |
//! | [`data_source`] | Price source trait and request/error types |
//! | [`domain`] | Domain models (Symbol, Instrument, PriceTable) |
//! | [`error`] | Core error types |
//! | [`export`] | CSV exports |
//! | [`http_client`] | HTTP client abstraction |
//! | [`pipeline`] | End-to-end analysis run |
//! | [`relative_strength`] | Ratio, change and outperformer calculation |
//! | [`retry`] | Retry policies |
//! | [`source`] | Provider identifiers |
//! | [`throttling`] | Rate limiting support |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sectorwatch_core::{run_analysis, AnalysisConfig, TradingDate, YahooAdapter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let adapter = YahooAdapter::default();
//!     let outcome = run_analysis(&adapter, &AnalysisConfig::default(), TradingDate::today_utc()).await?;
//!
//!     for entry in outcome.report.outperformers().iter() {
//!         println!("{}: {:.2}%", entry.label, entry.change * 100.0);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  CLI / User     │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Pipeline        │────▶│ Relative Strength│
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Table Builder   │────▶│ Cache Decorator  │
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Price Source    │────▶│ HTTP Client      │
//! │ (Adapter Trait) │     │ (reqwest)        │
//! └─────────────────┘     └──────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Calculator failures are structured and carry stable codes:
//!
//! ```rust
//! use sectorwatch_core::{compute_relative_strength, AnalysisError, AnalysisParams, PriceTable};
//!
//! let error = compute_relative_strength(&PriceTable::empty(), &AnalysisParams::new("NIFTY_50"))
//!     .unwrap_err();
//! assert!(matches!(error, AnalysisError::MissingBenchmark { .. }));
//! assert_eq!(error.code(), "analysis.missing_benchmark");
//! ```

pub mod adapters;
pub mod builder;
pub mod cache;
pub mod circuit_breaker;
pub mod config;
pub mod data_source;
pub mod domain;
pub mod error;
pub mod export;
pub mod http_client;
pub mod pipeline;
pub mod relative_strength;
pub mod retry;
pub mod source;
pub mod throttling;

// Re-export commonly used types at crate root for convenience

// Adapter implementations
pub use adapters::{FixtureSource, SyntheticSource, YahooAdapter, YahooAuthManager};

// Table assembly
pub use builder::{FetchOutcome, PriceTableBuilder, SkippedInstrument};

// Caching
pub use cache::{default_cache_dir, CacheMode, CacheStore, CachedSource};

// Circuit breaker
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};

// Configuration
pub use config::{AnalysisConfig, ConfigError, LookbackPreset, MAX_LOOKBACK_DAYS};

// Price source trait and types
pub use data_source::{CloseSeriesFuture, HistoryRequest, PriceSource, SourceError, SourceErrorKind};

// Domain models
pub use domain::{
    ClosePoint, CloseSeries, DateAlignment, DateRange, Instrument, InstrumentSet, PriceTable,
    Symbol, TradingDate,
};

// Error types
pub use error::{CoreError, ValidationError};

// Exports
pub use export::{
    export_change_csv, export_trend_csv, write_change_csv, write_trend_csv, ExportError,
    DEFAULT_SUMMARY_FILE,
};

// HTTP client types
pub use http_client::{
    HttpClient, HttpError, HttpErrorKind, HttpRequest, HttpResponse, ReqwestHttpClient,
    ScriptedHttpClient,
};

// Pipeline
pub use pipeline::{run_analysis, AnalysisOutcome};

// Relative strength
pub use relative_strength::{
    compute_relative_strength, AnalysisError, AnalysisParams, ChangeEntry, EmptyTableReason,
    Outperformers, RelativeStrengthChange, RelativeStrengthReport, RelativeStrengthTable,
};

// Retry logic
pub use retry::{Backoff, RetryConfig};

// Source identifiers
pub use source::ProviderId;

// Throttling
pub use throttling::Throttle;
