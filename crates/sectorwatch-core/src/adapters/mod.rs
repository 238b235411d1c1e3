//! Price source adapters.
//!
//! | Adapter | Provider | Network |
//! |---------|----------|---------|
//! | [`YahooAdapter`] | Yahoo Finance v8 chart | yes |
//! | [`SyntheticSource`] | seeded random walk | no |
//! | [`FixtureSource`] | preloaded series | no |

mod fixture;
mod synthetic;
mod yahoo;

pub use fixture::FixtureSource;
pub use synthetic::SyntheticSource;
pub use yahoo::{YahooAdapter, YahooAuthManager};
