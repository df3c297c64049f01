use {
    super::error::ReconError,
    serde::{Deserialize, Serialize},
    std::fmt,
};

/// Gross order amount in the provider's smallest unit. The provider API
/// rejects fractional amounts, so this is an integer end to end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(i64);

impl Amount {
    pub fn new(value: i64) -> Result<Self, ReconError> {
        if value < 0 {
            return Err(ReconError::Validation(format!(
                "amount cannot be negative, got: {value}"
            )));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
