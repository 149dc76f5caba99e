use std::sync::Arc;
use std::time::Duration;

use futures::future::try_join_all;
use tracing::debug;

use crate::domain::{AssetClass, HistoryRange, Period, StatementPeriod, Ticker};
use crate::envelope::{ComposedResult, DataEnvelope, DataType};
use crate::fetchers::{AssetRef, Fetchers, HistoryRequest, Statement, StatementRequest};
use crate::FetchError;

/// One fetch inside a composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStep {
    Historical { range: HistoryRange, period: Period },
    Quote,
    TimeSeries,
    Statement {
        statement: Statement,
        period: StatementPeriod,
    },
    Revenue,
}

impl FetchStep {
    pub const fn data_type(self) -> DataType {
        match self {
            Self::Historical { .. } => DataType::Historical,
            Self::Quote => DataType::Quote,
            Self::TimeSeries => DataType::TimeSeries,
            Self::Statement { statement, .. } => statement.data_type(),
            Self::Revenue => DataType::Revenue,
        }
    }
}

/// Fixed set of fetches run for one asset class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposePlan {
    asset_class: AssetClass,
    steps: Vec<FetchStep>,
}

impl ComposePlan {
    pub fn new(asset_class: AssetClass, steps: Vec<FetchStep>) -> Self {
        Self { asset_class, steps }
    }

    /// Five years of daily history, chart series, every statement and revenue.
    pub fn stock() -> Self {
        Self::new(
            AssetClass::Stock,
            vec![
                FetchStep::Historical {
                    range: HistoryRange::FiveYears,
                    period: Period::Daily,
                },
                FetchStep::TimeSeries,
                FetchStep::Statement {
                    statement: Statement::BalanceSheet,
                    period: StatementPeriod::Annual,
                },
                FetchStep::Statement {
                    statement: Statement::CashFlow,
                    period: StatementPeriod::Annual,
                },
                FetchStep::Statement {
                    statement: Statement::Income,
                    period: StatementPeriod::Quarterly,
                },
                FetchStep::Statement {
                    statement: Statement::Ratios,
                    period: StatementPeriod::Annual,
                },
                FetchStep::Revenue,
            ],
        )
    }

    /// Five years of daily history and the chart series.
    pub fn etf() -> Self {
        Self::new(
            AssetClass::Etf,
            vec![
                FetchStep::Historical {
                    range: HistoryRange::FiveYears,
                    period: Period::Daily,
                },
                FetchStep::TimeSeries,
            ],
        )
    }

    pub fn for_asset_class(asset_class: AssetClass) -> Self {
        match asset_class {
            AssetClass::Stock => Self::stock(),
            AssetClass::Etf => Self::etf(),
        }
    }

    pub const fn asset_class(&self) -> AssetClass {
        self.asset_class
    }

    pub fn steps(&self) -> &[FetchStep] {
        &self.steps
    }
}

/// Runs a [`ComposePlan`] concurrently and merges the envelopes.
///
/// All fetches go through the same rate-limited client, so the admission
/// bound holds across the fan-out and across concurrent orchestrations.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    fetchers: Arc<Fetchers>,
    plan: ComposePlan,
}

impl Orchestrator {
    pub fn with_plan(fetchers: Arc<Fetchers>, plan: ComposePlan) -> Self {
        Self { fetchers, plan }
    }

    pub fn stock(fetchers: Arc<Fetchers>) -> Self {
        Self::with_plan(fetchers, ComposePlan::stock())
    }

    pub fn etf(fetchers: Arc<Fetchers>) -> Self {
        Self::with_plan(fetchers, ComposePlan::etf())
    }

    pub fn plan(&self) -> &ComposePlan {
        &self.plan
    }

    /// Fetches every step of the plan and merges the results.
    ///
    /// The first failing fetch fails the whole composition; remaining
    /// in-flight fetches are dropped and no partial result is returned.
    pub async fn compose(&self, ticker: &Ticker) -> Result<ComposedResult, FetchError> {
        let asset_class = self.plan.asset_class();
        debug!(%ticker, %asset_class, steps = self.plan.steps().len(), "composing");

        let envelopes = try_join_all(
            self.plan
                .steps()
                .iter()
                .map(|step| self.run_step(ticker, *step)),
        )
        .await?;

        let result = ComposedResult::from_envelopes(ticker, asset_class, envelopes)?;
        debug!(%ticker, %asset_class, data_types = result.data.len(), "composed");
        Ok(result)
    }

    /// [`Self::compose`] bounded by `deadline`. On expiry every in-flight
    /// fetch is dropped, releasing its admission slot.
    pub async fn compose_within(
        &self,
        ticker: &Ticker,
        deadline: Duration,
    ) -> Result<ComposedResult, FetchError> {
        tokio::time::timeout(deadline, self.compose(ticker))
            .await
            .map_err(|_| FetchError::DeadlineExceeded(deadline))?
    }

    async fn run_step(&self, ticker: &Ticker, step: FetchStep) -> Result<DataEnvelope, FetchError> {
        let asset = || AssetRef::new(ticker.clone(), self.plan.asset_class());

        match step {
            FetchStep::Historical { range, period } => {
                let request = HistoryRequest::new(ticker.clone(), self.plan.asset_class())
                    .with_range(range)
                    .with_period(period);
                self.fetchers.historical.fetch(&request).await
            }
            FetchStep::Quote => self.fetchers.quote.fetch(&asset()).await,
            FetchStep::TimeSeries => self.fetchers.time_series.fetch(&asset()).await,
            FetchStep::Statement { statement, period } => {
                let request = StatementRequest::new(ticker.clone(), period);
                self.fetchers.statement(statement).fetch(&request).await
            }
            FetchStep::Revenue => self.fetchers.revenue.fetch(ticker).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn stock_plan_covers_seven_distinct_data_types() {
        let plan = ComposePlan::stock();
        let data_types: BTreeSet<_> = plan.steps().iter().map(|step| step.data_type()).collect();

        assert_eq!(plan.steps().len(), 7);
        assert_eq!(
            data_types,
            BTreeSet::from([
                DataType::Historical,
                DataType::TimeSeries,
                DataType::BalanceSheet,
                DataType::CashFlow,
                DataType::Income,
                DataType::Ratios,
                DataType::Revenue,
            ])
        );
    }

    #[test]
    fn etf_plan_is_history_and_series() {
        let plan = ComposePlan::for_asset_class(AssetClass::Etf);

        assert_eq!(plan.asset_class(), AssetClass::Etf);
        assert_eq!(
            plan.steps()
                .iter()
                .map(|step| step.data_type())
                .collect::<Vec<_>>(),
            vec![DataType::Historical, DataType::TimeSeries]
        );
    }

    #[test]
    fn compositions_use_five_years_of_daily_history() {
        assert!(ComposePlan::stock().steps().contains(&FetchStep::Historical {
            range: HistoryRange::FiveYears,
            period: Period::Daily,
        }));
    }
}
