use std::fmt::{Display, Formatter};
use std::sync::Arc;

use super::fetch_envelope;
use crate::decode::labels::{BALANCE_SHEET_LABELS, CASH_FLOW_LABELS, INCOME_LABELS, RATIOS_LABELS};
use crate::decode::{DecodeStrategy, IndexedRows, LabelTable};
use crate::domain::{StatementPeriod, Ticker};
use crate::envelope::{DataEnvelope, DataType};
use crate::throttling::RateLimitedClient;
use crate::url_template::UrlTemplate;
use crate::{FetchError, ValidationError};

const GLOSSARY_KEY: &str = "financialData";

/// Financial statements served as index-encoded site documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Statement {
    BalanceSheet,
    CashFlow,
    Income,
    Ratios,
}

impl Statement {
    pub const ALL: [Self; 4] = [
        Self::BalanceSheet,
        Self::CashFlow,
        Self::Income,
        Self::Ratios,
    ];

    pub const fn data_type(self) -> DataType {
        match self {
            Self::BalanceSheet => DataType::BalanceSheet,
            Self::CashFlow => DataType::CashFlow,
            Self::Income => DataType::Income,
            Self::Ratios => DataType::Ratios,
        }
    }

    pub const fn labels(self) -> &'static LabelTable {
        match self {
            Self::BalanceSheet => &BALANCE_SHEET_LABELS,
            Self::CashFlow => &CASH_FLOW_LABELS,
            Self::Income => &INCOME_LABELS,
            Self::Ratios => &RATIOS_LABELS,
        }
    }

    /// Period used when the caller gives none.
    pub const fn default_period(self) -> StatementPeriod {
        match self {
            Self::Income => StatementPeriod::Quarterly,
            _ => StatementPeriod::Annual,
        }
    }

    const fn template(self) -> UrlTemplate {
        match self {
            Self::BalanceSheet => UrlTemplate::new(
                "/stocks/{ticker}/financials/balance-sheet/__data.json?p={period}&x-sveltekit-trailing-slash=1&x-sveltekit-invalidated=001",
            ),
            Self::CashFlow => UrlTemplate::new(
                "/stocks/{ticker}/financials/cash-flow-statement/__data.json?p={period}&x-sveltekit-trailing-slash=1&x-sveltekit-invalidated=001",
            ),
            Self::Income => UrlTemplate::new(
                "/stocks/{ticker}/financials/__data.json?p={period}&x-sveltekit-trailing-slash=1&x-sveltekit-invalidated=001",
            ),
            Self::Ratios => UrlTemplate::new(
                "/stocks/{ticker}/financials/ratios/__data.json?p={period}&x-sveltekit-trailing-slash=1&x-sveltekit-invalidated=001",
            ),
        }
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.data_type().as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StatementRequest {
    pub ticker: Ticker,
    pub period: StatementPeriod,
}

impl StatementRequest {
    pub fn new(ticker: Ticker, period: StatementPeriod) -> Self {
        Self { ticker, period }
    }
}

/// Fetcher for one [`Statement`].
#[derive(Debug, Clone)]
pub struct StatementFetcher {
    statement: Statement,
    client: Arc<RateLimitedClient>,
}

impl StatementFetcher {
    pub fn new(statement: Statement, client: Arc<RateLimitedClient>) -> Self {
        Self { statement, client }
    }

    pub const fn statement(&self) -> Statement {
        self.statement
    }

    pub fn url(&self, request: &StatementRequest) -> Result<String, ValidationError> {
        self.statement.template().render(
            &self.client.policy().endpoints.site_base,
            &[
                ("ticker", request.ticker.as_str()),
                ("period", request.period.as_str()),
            ],
        )
    }

    pub async fn fetch(&self, request: &StatementRequest) -> Result<DataEnvelope, FetchError> {
        let url = self.url(request)?;
        let strategy = DecodeStrategy::Indexed {
            glossary_key: GLOSSARY_KEY,
            rows: IndexedRows::Scalar,
            table: self.statement.labels(),
        };
        fetch_envelope(&self.client, self.statement.data_type(), url, strategy).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{Endpoints, FetchPolicy};

    fn fetcher(statement: Statement) -> StatementFetcher {
        let policy = FetchPolicy::default()
            .with_endpoints(Endpoints::new("https://api.test", "https://site.test"));
        StatementFetcher::new(statement, Arc::new(RateLimitedClient::from_policy(policy)))
    }

    #[test]
    fn statement_urls_use_the_site_host() {
        let request = StatementRequest::new(
            Ticker::parse("AAPL").expect("valid ticker"),
            StatementPeriod::Quarterly,
        );

        assert_eq!(
            fetcher(Statement::Income).url(&request).expect("url renders"),
            "https://site.test/stocks/AAPL/financials/__data.json?p=quarterly&x-sveltekit-trailing-slash=1&x-sveltekit-invalidated=001"
        );
        assert_eq!(
            fetcher(Statement::CashFlow).url(&request).expect("url renders"),
            "https://site.test/stocks/AAPL/financials/cash-flow-statement/__data.json?p=quarterly&x-sveltekit-trailing-slash=1&x-sveltekit-invalidated=001"
        );
    }

    #[test]
    fn income_defaults_to_quarterly() {
        assert_eq!(Statement::Income.default_period(), StatementPeriod::Quarterly);
        assert_eq!(Statement::Ratios.default_period(), StatementPeriod::Annual);
    }

    #[test]
    fn every_statement_has_placeholders_for_ticker_and_period() {
        for statement in Statement::ALL {
            assert_eq!(
                statement.template().placeholders().expect("valid template"),
                vec!["ticker", "period"]
            );
        }
    }
}
