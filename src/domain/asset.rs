//! Assets and amounts.
//!
//! An [`Asset`] is either a chain-native coin identified by its denom or a
//! contract token identified by its contract address. The serde form is the
//! chain's asset-info JSON, so the type can be sent to and read from the
//! contracts as-is:
//!
//! ```
//! use dcabot::domain::asset::Asset;
//!
//! let asset = Asset::native("uluna");
//! let json = serde_json::to_string(&asset).unwrap();
//! assert_eq!(json, r#"{"native_token":{"denom":"uluna"}}"#);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Amounts are in the asset's smallest unit.
pub type Amount = u128;

/// A whitelisted-or-not asset on the chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Asset {
    /// A chain-native coin.
    #[serde(rename = "native_token")]
    Native {
        /// Bank denom, e.g. `uluna`.
        denom: String,
    },
    /// A contract token.
    #[serde(rename = "token")]
    Contract {
        /// Token contract address.
        #[serde(rename = "contract_addr")]
        address: String,
    },
}

impl Asset {
    /// A native coin with the given denom.
    pub fn native(denom: impl Into<String>) -> Self {
        Self::Native {
            denom: denom.into(),
        }
    }

    /// A contract token at the given address.
    pub fn contract(address: impl Into<String>) -> Self {
        Self::Contract {
            address: address.into(),
        }
    }

    /// Build an asset from its stored class tag and identifier.
    pub fn from_parts(class: AssetClass, id: impl Into<String>) -> Self {
        match class {
            AssetClass::NativeToken => Self::native(id),
            AssetClass::Token => Self::contract(id),
        }
    }

    /// The denom or contract address.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Native { denom } => denom,
            Self::Contract { address } => address,
        }
    }

    #[must_use]
    pub const fn class(&self) -> AssetClass {
        match self {
            Self::Native { .. } => AssetClass::NativeToken,
            Self::Contract { .. } => AssetClass::Token,
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Kind of asset, stored alongside the identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    NativeToken,
    Token,
}

impl AssetClass {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NativeToken => "native_token",
            Self::Token => "token",
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetClass {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "native_token" => Ok(Self::NativeToken),
            "token" => Ok(Self::Token),
            other => Err(DomainError::UnknownAssetClass {
                class: other.to_string(),
            }),
        }
    }
}

/// An asset together with an amount of it.
///
/// Serialises as the chain's `{"info": ..., "amount": "123"}` asset form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetAmount {
    #[serde(rename = "info")]
    pub asset: Asset,
    #[serde(with = "amount_string")]
    pub amount: Amount,
}

impl AssetAmount {
    #[must_use]
    pub const fn new(asset: Asset, amount: Amount) -> Self {
        Self { asset, amount }
    }
}

impl fmt::Display for AssetAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.asset)
    }
}

/// Serde helpers for amounts carried as decimal strings on the wire.
pub mod amount_string {
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::Amount;

    pub fn serialize<S: Serializer>(amount: &Amount, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(amount)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}
