//! One fetcher per data type.
//!
//! Each fetcher validates its parameters, renders its URL template, goes
//! through the shared [`RateLimitedClient`] and decodes with its fixed
//! [`DecodeStrategy`]. Validation always happens before any network access.

mod historical;
mod quote;
mod revenue;
mod statements;
mod time_series;

use std::sync::Arc;

use tracing::debug;

use crate::decode::DecodeStrategy;
use crate::domain::{AssetClass, Ticker};
use crate::envelope::{DataEnvelope, DataType};
use crate::throttling::RateLimitedClient;
use crate::{FetchError, ValidationError};

pub use historical::{HistoricalFetcher, HistoryRequest};
pub use quote::QuoteFetcher;
pub use revenue::RevenueFetcher;
pub use statements::{Statement, StatementFetcher, StatementRequest};
pub use time_series::TimeSeriesFetcher;

/// Ticker plus asset class, the parameters shared by quote and time series.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetRef {
    pub ticker: Ticker,
    pub asset_class: AssetClass,
}

impl AssetRef {
    pub fn new(ticker: Ticker, asset_class: AssetClass) -> Self {
        Self {
            ticker,
            asset_class,
        }
    }

    pub fn parse(ticker: &str, asset_class: &str) -> Result<Self, ValidationError> {
        Ok(Self::new(Ticker::parse(ticker)?, asset_class.parse()?))
    }
}

/// Every fetcher over one shared client.
#[derive(Debug, Clone)]
pub struct Fetchers {
    pub historical: HistoricalFetcher,
    pub quote: QuoteFetcher,
    pub time_series: TimeSeriesFetcher,
    pub balance_sheet: StatementFetcher,
    pub cash_flow: StatementFetcher,
    pub income: StatementFetcher,
    pub ratios: StatementFetcher,
    pub revenue: RevenueFetcher,
}

impl Fetchers {
    pub fn new(client: Arc<RateLimitedClient>) -> Self {
        Self {
            historical: HistoricalFetcher::new(Arc::clone(&client)),
            quote: QuoteFetcher::new(Arc::clone(&client)),
            time_series: TimeSeriesFetcher::new(Arc::clone(&client)),
            balance_sheet: StatementFetcher::new(Statement::BalanceSheet, Arc::clone(&client)),
            cash_flow: StatementFetcher::new(Statement::CashFlow, Arc::clone(&client)),
            income: StatementFetcher::new(Statement::Income, Arc::clone(&client)),
            ratios: StatementFetcher::new(Statement::Ratios, Arc::clone(&client)),
            revenue: RevenueFetcher::new(client),
        }
    }

    pub fn statement(&self, statement: Statement) -> &StatementFetcher {
        match statement {
            Statement::BalanceSheet => &self.balance_sheet,
            Statement::CashFlow => &self.cash_flow,
            Statement::Income => &self.income,
            Statement::Ratios => &self.ratios,
        }
    }
}

async fn fetch_envelope(
    client: &RateLimitedClient,
    data_type: DataType,
    url: String,
    strategy: DecodeStrategy,
) -> Result<DataEnvelope, FetchError> {
    debug!(%data_type, %url, "fetching");
    let document = client.fetch_json(&url).await?;
    let data = strategy.decode(document)?;
    if data.is_empty() {
        debug!(%data_type, "upstream returned an empty payload");
    }

    Ok(DataEnvelope::new(data_type, data))
}
