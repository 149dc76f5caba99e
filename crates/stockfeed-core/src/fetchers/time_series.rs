use std::sync::Arc;

use super::{fetch_envelope, AssetRef};
use crate::decode::DecodeStrategy;
use crate::envelope::{DataEnvelope, DataType};
use crate::throttling::RateLimitedClient;
use crate::url_template::UrlTemplate;
use crate::{FetchError, ValidationError};

const TEMPLATE: UrlTemplate = UrlTemplate::new("/api/symbol/{asset_class}/{ticker}/history?type=chart");

/// Chart series of `[timestamp_ms, close]` pairs, decoded into dated closes.
#[derive(Debug, Clone)]
pub struct TimeSeriesFetcher {
    client: Arc<RateLimitedClient>,
}

impl TimeSeriesFetcher {
    pub fn new(client: Arc<RateLimitedClient>) -> Self {
        Self { client }
    }

    pub fn url(&self, asset: &AssetRef) -> Result<String, ValidationError> {
        TEMPLATE.render(
            &self.client.policy().endpoints.api_base,
            &[
                ("asset_class", asset.asset_class.path_code()),
                ("ticker", asset.ticker.as_str()),
            ],
        )
    }

    pub async fn fetch(&self, asset: &AssetRef) -> Result<DataEnvelope, FetchError> {
        let url = self.url(asset)?;
        let strategy = DecodeStrategy::PricePairs {
            path: &["data"],
            offset: self.client.policy().calendar_offset,
        };
        fetch_envelope(&self.client, DataType::TimeSeries, url, strategy).await
    }
}
