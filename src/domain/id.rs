use derive_more::Display;
use serde::{Deserialize, Serialize};

use super::error::ReconError;

/// Order identifier — the join key shared by the Transaction, Order and
/// Billing Statement records. Immutable once an Order exists.
#[derive(Debug, Clone, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    pub fn new(id: impl Into<String>) -> Result<Self, ReconError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ReconError::Validation("order id must not be empty".into()));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Booking identifier. Bookings are created upstream; this engine only ever
/// joins to them via `Order.booking_id`.
#[derive(Debug, Clone, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingId(String);

impl BookingId {
    pub fn new(id: impl Into<String>) -> Result<Self, ReconError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ReconError::Validation("booking id must not be empty".into()));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
