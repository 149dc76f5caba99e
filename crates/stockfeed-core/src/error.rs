use std::time::Duration;

use thiserror::Error;

use crate::envelope::DataType;
use crate::http_client::HttpError;

/// Parameter, template and configuration errors. Raised before any network access.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("ticker cannot be empty")]
    EmptyTicker,
    #[error("ticker length {len} exceeds max {max}")]
    TickerTooLong { len: usize, max: usize },
    #[error("ticker contains invalid character '{ch}' at index {index}")]
    TickerInvalidChar { ch: char, index: usize },

    #[error("invalid asset class '{value}', expected one of s, e, stock, etf")]
    InvalidAssetClass { value: String },
    #[error("invalid range '{value}', expected one of 3M, 6M, YTD, 1Y, 5Y, 10Y, Max")]
    InvalidRange { value: String },
    #[error("invalid period '{value}', expected one of Daily, Weekly, Monthly, Quarterly, Annual")]
    InvalidPeriod { value: String },
    #[error("invalid statement period '{value}', expected one of annual, quarterly, trailing")]
    InvalidStatementPeriod { value: String },

    #[error("placeholder '{name}' has an empty value")]
    EmptyPlaceholder { name: String },
    #[error("no value provided for placeholder '{name}'")]
    MissingPlaceholder { name: String },
    #[error("malformed placeholder in url template '{template}'")]
    MalformedTemplate { template: String },

    #[error("invalid configuration value for {key}: '{value}'")]
    InvalidConfig { key: &'static str, value: String },
}

/// Upstream payload did not have the shape its decoder expects.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("response body is not valid json: {message}")]
    InvalidJson { message: String },
    #[error("missing target node: document has {found} nodes")]
    MissingTargetNode { found: usize },
    #[error("target node has no data array")]
    MissingNodeData,
    #[error("no glossary index under key '{key}'")]
    MissingGlossaryIndex { key: String },
    #[error("glossary at index {index} is not a non-empty object")]
    InvalidGlossary { index: usize },
    #[error("index {index} is outside the value pool of length {len}")]
    IndexOutOfBounds { index: i64, len: usize },
    #[error("expected an integer index for field '{field}'")]
    ExpectedIndex { field: String },
    #[error("expected an index list for field '{field}'")]
    ExpectedIndexList { field: String },
    #[error("expected an index-encoded record for field '{field}'")]
    ExpectedRecord { field: String },
    #[error("expected {expected} at '{path}'")]
    UnexpectedShape { expected: &'static str, path: String },
    #[error("time series entry {index} is not a [timestamp_ms, price] pair")]
    MalformedSeriesEntry { index: usize },
    #[error("timestamp {value} is outside the supported calendar range")]
    InvalidTimestamp { value: i64 },
}

/// Top-level error for fetch, decode and composition calls.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("upstream request failed with status {status} ({reason})")]
    Upstream { status: u16, reason: String },

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("transport error: {0}")]
    Transport(#[from] HttpError),

    #[error("deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),

    #[error("data type '{0}' was produced more than once in a single composition")]
    DuplicateDataType(DataType),
}

impl FetchError {
    pub fn upstream(status: u16, reason: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            reason: reason.into(),
        }
    }

    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "fetch.validation",
            Self::Upstream { .. } => "fetch.upstream",
            Self::Decode(_) => "fetch.decode",
            Self::Transport(_) => "fetch.transport",
            Self::DeadlineExceeded(_) => "fetch.deadline_exceeded",
            Self::DuplicateDataType(_) => "fetch.duplicate_data_type",
        }
    }

    /// HTTP status of an upstream failure, if this is one.
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }
}
