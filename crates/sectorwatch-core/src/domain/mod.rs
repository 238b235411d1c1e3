//! # Domain Models
//!
//! Canonical domain types for sector relative-strength analysis.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Validated provider ticker (`^NSEI`, `^CNXIT`) |
//! | [`Instrument`] | Label paired with a symbol |
//! | [`InstrumentSet`] | Ordered instruments plus benchmark label |
//! | [`TradingDate`] | Calendar date of a trading session |
//! | [`DateRange`] | Requested `[start, end)` window |
//! | [`CloseSeries`] | Daily closes for one symbol |
//! | [`PriceTable`] | Date-indexed closes, one column per label |
//!
//! All types validate their invariants at construction time.

mod date;
mod instrument;
mod price_table;
mod symbol;

pub use date::{DateRange, TradingDate};
pub use instrument::{Instrument, InstrumentSet};
pub use price_table::{ClosePoint, CloseSeries, DateAlignment, PriceTable};
pub use symbol::Symbol;
