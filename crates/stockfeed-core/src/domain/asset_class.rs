use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Asset classes served by the upstream provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    Stock,
    Etf,
}

impl AssetClass {
    pub const ALL: [Self; 2] = [Self::Stock, Self::Etf];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stock => "stock",
            Self::Etf => "etf",
        }
    }

    /// Single-letter code used in upstream URL paths.
    pub const fn path_code(self) -> &'static str {
        match self {
            Self::Stock => "s",
            Self::Etf => "e",
        }
    }
}

impl Display for AssetClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetClass {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "s" | "stock" | "stocks" => Ok(Self::Stock),
            "e" | "etf" | "etfs" => Ok(Self::Etf),
            _ => Err(ValidationError::InvalidAssetClass {
                value: value.to_owned(),
            }),
        }
    }
}
