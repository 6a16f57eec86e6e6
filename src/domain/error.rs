//! Domain validation errors for core domain types.
//!
//! This module defines errors that occur when domain invariants are violated:
//! malformed path encodings, hops that do not chain, catalog mutations that
//! would break whitelisting rules, and fee balances that cannot cover a route.
//!
//! # Examples
//!
//! ```
//! use dcabot::domain::error::DomainError;
//! use dcabot::domain::path::Path;
//!
//! let result = Path::decode("<1><1>");
//! assert!(matches!(result, Err(DomainError::DuplicateHopInPath { .. })));
//! ```

use thiserror::Error;

use super::id::HopId;

/// Errors that occur when domain invariants are violated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A hop must join two distinct assets.
    #[error("hop endpoints must differ, got {asset} on both sides")]
    IdenticalHopEndpoints {
        /// The asset given for both sides.
        asset: String,
    },

    /// Catalog mutations may only reference whitelisted assets.
    #[error("asset {asset} is not whitelisted")]
    AssetNotWhitelisted {
        /// Identifier of the offending asset.
        asset: String,
    },

    /// A hop for this pair already exists.
    #[error("a hop for pair {pair_key} already exists")]
    DuplicateHop {
        /// Canonical pair key of the existing hop.
        pair_key: String,
    },

    /// A hop id with the same value is already in the catalog.
    #[error("hop id {id} is already taken")]
    HopIdTaken {
        /// The conflicting id.
        id: HopId,
    },

    /// A path referenced a hop the catalog does not know.
    #[error("unknown hop {id}")]
    UnknownHop {
        /// The missing hop id.
        id: HopId,
    },

    /// Consecutive path steps do not share an asset.
    #[error("path step {step} offers {found}, expected {expected}")]
    BrokenPath {
        /// Zero-based index of the step that failed to chain.
        step: usize,
        /// Asset the previous step produced.
        expected: String,
        /// Asset this step would consume.
        found: String,
    },

    /// Paths must contain at least one hop.
    #[error("path is empty")]
    EmptyPath,

    /// The textual form of a path could not be parsed.
    #[error("malformed path {input:?}: {reason}")]
    MalformedPath {
        /// The rejected input.
        input: String,
        /// What was wrong with it.
        reason: &'static str,
    },

    /// A hop may appear at most once in a path, in either direction.
    #[error("hop {id} appears more than once in the path")]
    DuplicateHopInPath {
        /// The repeated hop id.
        id: HopId,
    },

    /// The user's fee balances cannot pay for every hop.
    #[error("fee balances cover {} of {hops_needed} hops", .hops_needed - .hops_uncovered)]
    InsufficientFeeFunds {
        /// Hops the route needs paid.
        hops_needed: usize,
        /// Hops left unpaid after every balance was used.
        hops_uncovered: usize,
    },

    /// Asset class tags are `native_token` or `token`.
    #[error("unknown asset class {class:?}")]
    UnknownAssetClass {
        /// The unrecognised tag.
        class: String,
    },
}
