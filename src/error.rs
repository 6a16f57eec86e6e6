use thiserror::Error;

use crate::domain::error::DomainError;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Route selection errors.
///
/// These are expected outcomes of planning a purchase, not infrastructure
/// faults: the caller records them against the order and moves on.
#[derive(Error, Debug, Clone)]
pub enum RouteError {
    #[error("no route from {start} to {target} within {max_hops} hops")]
    NoRouteAvailable {
        start: String,
        target: String,
        max_hops: usize,
    },

    #[error("none of the {candidates} candidate routes is affordable with the user's tip balance")]
    NoAffordableRoute { candidates: usize },

    #[error("none of the {candidates} affordable routes could be simulated and priced")]
    NoValidRoute { candidates: usize },
}

/// Errors raised while simulating, pricing or submitting a purchase.
#[derive(Error, Debug, Clone)]
pub enum ExecutionError {
    #[error("route simulation failed: {0}")]
    SimulationFailed(String),

    #[error("no usable USD price for {asset}")]
    PricingUnavailable { asset: String },

    #[error("failed to submit purchase: {0}")]
    SubmissionFailed(String),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Route(#[from] RouteError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("parse error: {0}")]
    Parse(String),
}

impl Error {
    /// True for errors that describe a per-order planning or execution
    /// outcome rather than an infrastructure fault.
    #[must_use]
    pub const fn is_expected(&self) -> bool {
        matches!(
            self,
            Self::Route(_) | Self::Execution(_) | Self::Domain(DomainError::InsufficientFeeFunds { .. })
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
