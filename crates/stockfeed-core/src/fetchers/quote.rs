use std::sync::Arc;

use super::{fetch_envelope, AssetRef};
use crate::decode::labels::{ETF_QUOTE_LABELS, STOCK_QUOTE_LABELS};
use crate::decode::{DecodeStrategy, LabelTable};
use crate::domain::AssetClass;
use crate::envelope::{DataEnvelope, DataType};
use crate::throttling::RateLimitedClient;
use crate::url_template::UrlTemplate;
use crate::{FetchError, ValidationError};

const TEMPLATE: UrlTemplate = UrlTemplate::new("/api/quotes/{asset_class}/{ticker}");

/// Live quote for a stock or ETF.
#[derive(Debug, Clone)]
pub struct QuoteFetcher {
    client: Arc<RateLimitedClient>,
}

impl QuoteFetcher {
    pub fn new(client: Arc<RateLimitedClient>) -> Self {
        Self { client }
    }

    /// Label table for the asset class; the upstream keys coincide but the
    /// tables are kept per class.
    pub const fn labels(asset_class: AssetClass) -> &'static LabelTable {
        match asset_class {
            AssetClass::Stock => &STOCK_QUOTE_LABELS,
            AssetClass::Etf => &ETF_QUOTE_LABELS,
        }
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
        let strategy = DecodeStrategy::Flat {
            path: &["data"],
            table: Self::labels(asset.asset_class),
        };
        fetch_envelope(&self.client, DataType::Quote, url, strategy).await
    }
}
