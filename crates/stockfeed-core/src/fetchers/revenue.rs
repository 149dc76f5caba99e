use std::sync::Arc;

use super::fetch_envelope;
use crate::decode::labels::REVENUE_LABELS;
use crate::decode::{DecodeStrategy, IndexedRows};
use crate::domain::Ticker;
use crate::envelope::{DataEnvelope, DataType};
use crate::throttling::RateLimitedClient;
use crate::url_template::UrlTemplate;
use crate::{FetchError, ValidationError};

const TEMPLATE: UrlTemplate = UrlTemplate::new(
    "/stocks/{ticker}/revenue/__data.json?x-sveltekit-trailing-slash=1&x-sveltekit-invalidated=001",
);

const STRATEGY: DecodeStrategy = DecodeStrategy::Indexed {
    glossary_key: "data",
    rows: IndexedRows::Records,
    table: &REVENUE_LABELS,
};

/// Revenue history; each resolved entry is a dated record.
#[derive(Debug, Clone)]
pub struct RevenueFetcher {
    client: Arc<RateLimitedClient>,
}

impl RevenueFetcher {
    pub fn new(client: Arc<RateLimitedClient>) -> Self {
        Self { client }
    }

    pub fn url(&self, ticker: &Ticker) -> Result<String, ValidationError> {
        TEMPLATE.render(
            &self.client.policy().endpoints.site_base,
            &[("ticker", ticker.as_str())],
        )
    }

    pub async fn fetch(&self, ticker: &Ticker) -> Result<DataEnvelope, FetchError> {
        let url = self.url(ticker)?;
        fetch_envelope(&self.client, DataType::Revenue, url, STRATEGY).await
    }
}
