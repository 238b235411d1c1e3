//! Price source trait and request/error types.
//!
//! A [`PriceSource`] returns the daily closes of one symbol over a date
//! window. Everything about *how* the closes are obtained (HTTP, caching,
//! retries, throttling, synthetic generation) stays behind this trait so the
//! relative-strength calculation can be exercised with in-memory tables.
//!
//! # Example
//!
//! ```rust,ignore
//! use sectorwatch_core::{DateRange, HistoryRequest, PriceSource, Symbol, TradingDate, YahooAdapter};
//!
//! async fn nifty_closes(adapter: &YahooAdapter) -> Result<(), Box<dyn std::error::Error>> {
//!     let range = DateRange::lookback(TradingDate::today_utc(), 90)?;
//!     let request = HistoryRequest::new(Symbol::parse("^NSEI")?, range);
//!     let series = adapter.daily_closes(request).await?;
//!     println!("{} closes", series.len());
//!     Ok(())
//! }
//! ```

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use crate::{CloseSeries, DateRange, ProviderId, Symbol};

/// Source-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    /// Provider answered but has no closes for the symbol/window.
    NoData,
    Unavailable,
    RateLimited,
    InvalidRequest,
    Internal,
}

impl SourceErrorKind {
    pub const fn code(self) -> &'static str {
        match self {
            Self::NoData => "source.no_data",
            Self::Unavailable => "source.unavailable",
            Self::RateLimited => "source.rate_limited",
            Self::InvalidRequest => "source.invalid_request",
            Self::Internal => "source.internal",
        }
    }
}

/// Structured price source error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn no_data(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::NoData,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidRequest,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Request payload for a daily close history.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HistoryRequest {
    pub symbol: Symbol,
    pub range: DateRange,
}

impl HistoryRequest {
    pub fn new(symbol: Symbol, range: DateRange) -> Self {
        Self { symbol, range }
    }

    /// Stable key used by caches and logs.
    pub fn cache_key(&self) -> String {
        format!("{}:{}:{}", self.symbol, self.range.start, self.range.end)
    }
}

/// Boxed future returned by [`PriceSource::daily_closes`].
pub type CloseSeriesFuture<'a> =
    Pin<Box<dyn Future<Output = Result<CloseSeries, SourceError>> + Send + 'a>>;

/// Price source contract.
///
/// Implementations must be `Send + Sync`; the CLI shares one source across
/// the whole fetch. Returned series may contain dates outside the requested
/// window; callers trim them.
pub trait PriceSource: Send + Sync {
    /// Returns the provider identifier.
    fn id(&self) -> ProviderId;

    /// Fetches daily closes for one symbol.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if:
    /// - The provider has no data for the symbol ([`SourceErrorKind::NoData`])
    /// - The provider is unavailable or rate limiting
    /// - The response cannot be parsed
    fn daily_closes<'a>(&'a self, req: HistoryRequest) -> CloseSeriesFuture<'a>;
}

impl<S> PriceSource for std::sync::Arc<S>
where
    S: PriceSource + ?Sized,
{
    fn id(&self) -> ProviderId {
        (**self).id()
    }

    fn daily_closes<'a>(&'a self, req: HistoryRequest) -> CloseSeriesFuture<'a> {
        (**self).daily_closes(req)
    }
}
