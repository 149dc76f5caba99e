use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::{AssetClass, Ticker};
use crate::FetchError;

/// One decoded record: human-readable label to value.
pub type DecodedRecord = Map<String, Value>;

/// Data types served by the fetchers. Serialized as the composition key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Historical,
    Quote,
    TimeSeries,
    BalanceSheet,
    CashFlow,
    Income,
    Ratios,
    Revenue,
}

impl DataType {
    pub const ALL: [Self; 8] = [
        Self::Historical,
        Self::Quote,
        Self::TimeSeries,
        Self::BalanceSheet,
        Self::CashFlow,
        Self::Income,
        Self::Ratios,
        Self::Revenue,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Historical => "historical",
            Self::Quote => "quote",
            Self::TimeSeries => "time_series",
            Self::BalanceSheet => "balance_sheet",
            Self::CashFlow => "cash_flow",
            Self::Income => "income",
            Self::Ratios => "ratios",
            Self::Revenue => "revenue",
        }
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded payload of one fetch.
///
/// `Empty` carries the upstream's own empty value (`null`, `[]`, `{}`, ...)
/// unchanged; it is a successful outcome, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    Record(DecodedRecord),
    Rows(Vec<DecodedRecord>),
    Empty(Value),
}

impl Payload {
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty(_))
    }

    pub fn as_record(&self) -> Option<&DecodedRecord> {
        match self {
            Self::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_rows(&self) -> Option<&[DecodedRecord]> {
        match self {
            Self::Rows(rows) => Some(rows),
            _ => None,
        }
    }
}

/// Result of a single per-data-type fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataEnvelope {
    pub data_type: DataType,
    pub data: Payload,
}

impl DataEnvelope {
    pub fn new(data_type: DataType, data: Payload) -> Self {
        Self { data_type, data }
    }
}

/// Merged result of one orchestration, keyed by data type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposedResult {
    pub ticker: String,
    pub asset_class: AssetClass,
    pub data: BTreeMap<DataType, Payload>,
}

impl ComposedResult {
    /// Merges envelopes; a data type seen twice fails the whole composition.
    pub fn from_envelopes(
        ticker: &Ticker,
        asset_class: AssetClass,
        envelopes: impl IntoIterator<Item = DataEnvelope>,
    ) -> Result<Self, FetchError> {
        let mut data = BTreeMap::new();
        for envelope in envelopes {
            if data.insert(envelope.data_type, envelope.data).is_some() {
                return Err(FetchError::DuplicateDataType(envelope.data_type));
            }
        }

        Ok(Self {
            ticker: ticker.as_str().to_owned(),
            asset_class,
            data,
        })
    }

    pub fn get(&self, data_type: DataType) -> Option<&Payload> {
        self.data.get(&data_type)
    }

    pub fn data_types(&self) -> impl Iterator<Item = DataType> + '_ {
        self.data.keys().copied()
    }
}
