//! # Domain Types
//!
//! Validated request parameters shared by every fetcher.
//!
//! | Type | Allowed values |
//! |------|----------------|
//! | [`Ticker`] | non-empty, ASCII alphanumerics plus `.` and `-` |
//! | [`AssetClass`] | `stock` (`s`), `etf` (`e`) |
//! | [`HistoryRange`] | `3M`, `6M`, `YTD`, `1Y`, `5Y`, `10Y`, `Max` |
//! | [`Period`] | `Daily`, `Weekly`, `Monthly`, `Quarterly`, `Annual` |
//! | [`StatementPeriod`] | `annual`, `quarterly`, `trailing` |
//!
//! Parsing any of these from a string is the validation step: a value outside
//! its allowed set is a [`ValidationError`](crate::ValidationError) and never
//! reaches the network.

mod asset_class;
mod params;
mod ticker;

pub use asset_class::AssetClass;
pub use params::{HistoryRange, Period, StatementPeriod};
pub use ticker::Ticker;
