use std::sync::Arc;

use super::fetch_envelope;
use crate::decode::labels::HISTORICAL_LABELS;
use crate::decode::DecodeStrategy;
use crate::domain::{AssetClass, HistoryRange, Period, Ticker};
use crate::envelope::{DataEnvelope, DataType};
use crate::throttling::RateLimitedClient;
use crate::url_template::UrlTemplate;
use crate::{FetchError, ValidationError};

const TEMPLATE: UrlTemplate =
    UrlTemplate::new("/api/symbol/{asset_class}/{ticker}/history?range={range}&period={period}");

const STRATEGY: DecodeStrategy = DecodeStrategy::Flat {
    path: &["data", "data"],
    table: &HISTORICAL_LABELS,
};

/// Validated parameters of a historical price request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HistoryRequest {
    pub ticker: Ticker,
    pub asset_class: AssetClass,
    pub range: HistoryRange,
    pub period: Period,
}

impl HistoryRequest {
    /// Request with the default one-year daily window.
    pub fn new(ticker: Ticker, asset_class: AssetClass) -> Self {
        Self {
            ticker,
            asset_class,
            range: HistoryRange::default(),
            period: Period::default(),
        }
    }

    pub fn with_range(mut self, range: HistoryRange) -> Self {
        self.range = range;
        self
    }

    pub fn with_period(mut self, period: Period) -> Self {
        self.period = period;
        self
    }

    /// Parses raw parameters; omitted range and period fall back to `1Y` and `Daily`.
    pub fn parse(
        ticker: &str,
        asset_class: &str,
        range: Option<&str>,
        period: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let mut request = Self::new(Ticker::parse(ticker)?, asset_class.parse()?);
        if let Some(range) = range {
            request.range = range.parse()?;
        }
        if let Some(period) = period {
            request.period = period.parse()?;
        }
        Ok(request)
    }
}

/// Daily/weekly/... OHLCV rows from the JSON API.
#[derive(Debug, Clone)]
pub struct HistoricalFetcher {
    client: Arc<RateLimitedClient>,
}

impl HistoricalFetcher {
    pub fn new(client: Arc<RateLimitedClient>) -> Self {
        Self { client }
    }

    pub fn url(&self, request: &HistoryRequest) -> Result<String, ValidationError> {
        TEMPLATE.render(
            &self.client.policy().endpoints.api_base,
            &[
                ("asset_class", request.asset_class.path_code()),
                ("ticker", request.ticker.as_str()),
                ("range", request.range.as_str()),
                ("period", request.period.as_str()),
            ],
        )
    }

    pub async fn fetch(&self, request: &HistoryRequest) -> Result<DataEnvelope, FetchError> {
        let url = self.url(request)?;
        fetch_envelope(&self.client, DataType::Historical, url, STRATEGY).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{Endpoints, FetchPolicy};

    fn fetcher() -> HistoricalFetcher {
        let policy = FetchPolicy::default()
            .with_endpoints(Endpoints::new("https://api.test", "https://site.test"));
        HistoricalFetcher::new(Arc::new(RateLimitedClient::from_policy(policy)))
    }

    #[test]
    fn builds_history_url_with_asset_code() {
        let request = HistoryRequest::parse("MSFT", "stock", Some("5Y"), Some("Weekly"))
            .expect("valid parameters");

        assert_eq!(
            fetcher().url(&request).expect("url renders"),
            "https://api.test/api/symbol/s/MSFT/history?range=5Y&period=Weekly"
        );
    }

    #[test]
    fn omitted_parameters_use_defaults() {
        let request = HistoryRequest::parse("SCHD", "e", None, None).expect("valid parameters");

        assert_eq!(request.range, HistoryRange::OneYear);
        assert_eq!(request.period, Period::Daily);
    }

    #[test]
    fn unknown_range_is_rejected() {
        let error = HistoryRequest::parse("MSFT", "s", Some("2Y"), None).expect_err("2Y is not allowed");

        assert_eq!(
            error,
            ValidationError::InvalidRange {
                value: String::from("2Y")
            }
        );
    }
}
