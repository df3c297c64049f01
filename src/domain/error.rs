use std::fmt;
use thiserror::Error;

/// Which of the four reconciled records a lookup failed on. Callers use this
/// to tell a malformed order_id apart from a race with record creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Order,
    BillingStatement,
    Transaction,
    Booking,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Order => "order",
            Self::BillingStatement => "billing statement",
            Self::Transaction => "transaction",
            Self::Booking => "booking",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ReconError {
    #[error("{0} not found")]
    NotFound(RecordKind),

    #[error("missing authentication")]
    Unauthenticated,

    #[error("caller does not own this record")]
    AccessDenied,

    #[error("payment provider: {0}")]
    Provider(String),

    #[error("invalid provider response: {0}")]
    InvalidProviderResponse(String),

    #[error("rate limited")]
    RateLimited,

    #[error("validation: {0}")]
    Validation(String),

    #[error("notification signature: {0}")]
    Signature(String),

    #[error("database: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),
}
