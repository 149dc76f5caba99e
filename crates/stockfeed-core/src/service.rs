use std::sync::Arc;

use tracing::info;

use crate::domain::{AssetClass, StatementPeriod, Ticker};
use crate::envelope::{ComposedResult, DataEnvelope};
use crate::fetchers::{AssetRef, Fetchers, HistoryRequest, Statement, StatementRequest};
use crate::orchestrator::Orchestrator;
use crate::policy::FetchPolicy;
use crate::throttling::RateLimitedClient;
use crate::FetchError;

/// Entry point for a routing layer: raw string parameters in, envelopes out.
///
/// Every parameter is validated before the network is touched.
#[derive(Debug, Clone)]
pub struct MarketDataService {
    client: Arc<RateLimitedClient>,
    fetchers: Arc<Fetchers>,
    stock: Orchestrator,
    etf: Orchestrator,
}

impl MarketDataService {
    pub fn new(client: Arc<RateLimitedClient>) -> Self {
        let fetchers = Arc::new(Fetchers::new(Arc::clone(&client)));
        Self {
            stock: Orchestrator::stock(Arc::clone(&fetchers)),
            etf: Orchestrator::etf(Arc::clone(&fetchers)),
            client,
            fetchers,
        }
    }

    /// Service over the reqwest transport, configured from `STOCKFEED_*` variables.
    pub fn from_env() -> Result<Self, FetchError> {
        let policy = FetchPolicy::from_env()?;
        info!(
            max_concurrency = policy.max_concurrency,
            api_base = %policy.endpoints.api_base,
            "starting market data service"
        );
        Ok(Self::new(Arc::new(RateLimitedClient::from_policy(policy))))
    }

    pub fn client(&self) -> &Arc<RateLimitedClient> {
        &self.client
    }

    pub fn fetchers(&self) -> &Fetchers {
        &self.fetchers
    }

    /// Historical prices; `range` and `period` default to `1Y` and `Daily`.
    pub async fn historical(
        &self,
        ticker: &str,
        asset_class: &str,
        range: Option<&str>,
        period: Option<&str>,
    ) -> Result<DataEnvelope, FetchError> {
        let request = HistoryRequest::parse(ticker, asset_class, range, period)?;
        self.fetchers.historical.fetch(&request).await
    }

    pub async fn quote(&self, ticker: &str, asset_class: &str) -> Result<DataEnvelope, FetchError> {
        let asset = AssetRef::parse(ticker, asset_class)?;
        self.fetchers.quote.fetch(&asset).await
    }

    pub async fn time_series(
        &self,
        ticker: &str,
        asset_class: &str,
    ) -> Result<DataEnvelope, FetchError> {
        let asset = AssetRef::parse(ticker, asset_class)?;
        self.fetchers.time_series.fetch(&asset).await
    }

    /// A financial statement; `period` defaults per statement (income is quarterly).
    pub async fn statement(
        &self,
        statement: Statement,
        ticker: &str,
        period: Option<&str>,
    ) -> Result<DataEnvelope, FetchError> {
        let ticker = Ticker::parse(ticker)?;
        let period = match period {
            Some(period) => period.parse::<StatementPeriod>()?,
            None => statement.default_period(),
        };
        self.fetchers
            .statement(statement)
            .fetch(&StatementRequest::new(ticker, period))
            .await
    }

    pub async fn revenue(&self, ticker: &str) -> Result<DataEnvelope, FetchError> {
        let ticker = Ticker::parse(ticker)?;
        self.fetchers.revenue.fetch(&ticker).await
    }

    /// Full composition for the given asset class.
    pub async fn compose(
        &self,
        ticker: &str,
        asset_class: &str,
    ) -> Result<ComposedResult, FetchError> {
        let asset = AssetRef::parse(ticker, asset_class)?;
        self.orchestrator(asset.asset_class)
            .compose(&asset.ticker)
            .await
    }

    pub async fn compose_stock(&self, ticker: &str) -> Result<ComposedResult, FetchError> {
        let ticker = Ticker::parse(ticker)?;
        self.stock.compose(&ticker).await
    }

    pub async fn compose_etf(&self, ticker: &str) -> Result<ComposedResult, FetchError> {
        let ticker = Ticker::parse(ticker)?;
        self.etf.compose(&ticker).await
    }

    pub fn orchestrator(&self, asset_class: AssetClass) -> &Orchestrator {
        match asset_class {
            AssetClass::Stock => &self.stock,
            AssetClass::Etf => &self.etf,
        }
    }

    /// Closes the shared connection context. Idempotent.
    pub fn shutdown(&self) {
        info!("shutting down market data service");
        self.client.close();
    }
}
