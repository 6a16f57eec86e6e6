//! Domain identifier types with proper encapsulation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Store-assigned hop identifier.
///
/// Stable for a given pair key across syncs; the path encoding refers to
/// hops by this number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HopId(u32);

impl HopId {
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for HopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for HopId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// On-chain account address of a DCA user.
///
/// The inner String is private to ensure all construction goes through
/// the defined constructors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserAddress(String);

impl UserAddress {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for UserAddress {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for UserAddress {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Local order identifier: `"{user}-{chain_order_id}"`.
///
/// The DCA contract numbers orders per user, so the user address is folded
/// into the key to make it globally unique.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(String);

impl OrderId {
    /// Compose the id of a user's chain order.
    #[must_use]
    pub fn new(user: &UserAddress, chain_id: u64) -> Self {
        Self(format!("{user}-{chain_id}"))
    }

    /// Wrap an id read back from storage.
    pub fn from_raw(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
