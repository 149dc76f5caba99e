use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Look-back window for historical price rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoryRange {
    #[serde(rename = "3M")]
    ThreeMonths,
    #[serde(rename = "6M")]
    SixMonths,
    #[serde(rename = "YTD")]
    YearToDate,
    #[default]
    #[serde(rename = "1Y")]
    OneYear,
    #[serde(rename = "5Y")]
    FiveYears,
    #[serde(rename = "10Y")]
    TenYears,
    #[serde(rename = "Max")]
    Max,
}

impl HistoryRange {
    pub const ALL: [Self; 7] = [
        Self::ThreeMonths,
        Self::SixMonths,
        Self::YearToDate,
        Self::OneYear,
        Self::FiveYears,
        Self::TenYears,
        Self::Max,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ThreeMonths => "3M",
            Self::SixMonths => "6M",
            Self::YearToDate => "YTD",
            Self::OneYear => "1Y",
            Self::FiveYears => "5Y",
            Self::TenYears => "10Y",
            Self::Max => "Max",
        }
    }
}

impl Display for HistoryRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HistoryRange {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|range| range.as_str() == value.trim())
            .ok_or_else(|| ValidationError::InvalidRange {
                value: value.to_owned(),
            })
    }
}

/// Row interval for historical price data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    #[default]
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Annual,
}

impl Period {
    pub const ALL: [Self; 5] = [
        Self::Daily,
        Self::Weekly,
        Self::Monthly,
        Self::Quarterly,
        Self::Annual,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "Daily",
            Self::Weekly => "Weekly",
            Self::Monthly => "Monthly",
            Self::Quarterly => "Quarterly",
            Self::Annual => "Annual",
        }
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|period| period.as_str() == value.trim())
            .ok_or_else(|| ValidationError::InvalidPeriod {
                value: value.to_owned(),
            })
    }
}

/// Reporting period for financial statements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementPeriod {
    #[default]
    Annual,
    Quarterly,
    Trailing,
}

impl StatementPeriod {
    pub const ALL: [Self; 3] = [Self::Annual, Self::Quarterly, Self::Trailing];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Annual => "annual",
            Self::Quarterly => "quarterly",
            Self::Trailing => "trailing",
        }
    }
}

impl Display for StatementPeriod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatementPeriod {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "annual" => Ok(Self::Annual),
            "quarterly" => Ok(Self::Quarterly),
            "trailing" | "ttm" => Ok(Self::Trailing),
            _ => Err(ValidationError::InvalidStatementPeriod {
                value: value.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_range_round_trips_through_its_label() {
        for range in HistoryRange::ALL {
            assert_eq!(range.as_str().parse::<HistoryRange>(), Ok(range));
        }
    }

    #[test]
    fn rejects_range_outside_allowed_set() {
        let err = "2Y".parse::<HistoryRange>().expect_err("must fail");
        assert_eq!(
            err,
            ValidationError::InvalidRange {
                value: String::from("2Y")
            }
        );
    }

    #[test]
    fn period_labels_are_case_sensitive() {
        assert_eq!("Weekly".parse::<Period>(), Ok(Period::Weekly));
        assert!("weekly".parse::<Period>().is_err());
    }

    #[test]
    fn defaults_match_boundary_defaults() {
        assert_eq!(HistoryRange::default(), HistoryRange::OneYear);
        assert_eq!(Period::default(), Period::Daily);
        assert_eq!(StatementPeriod::default(), StatementPeriod::Annual);
    }

    #[test]
    fn statement_period_accepts_ttm_alias() {
        assert_eq!("TTM".parse::<StatementPeriod>(), Ok(StatementPeriod::Trailing));
    }
}
