use {
    super::amount::Amount,
    super::error::ReconError,
    super::id::OrderId,
    super::record::CustomerDetails,
    std::{fmt, future::Future, pin::Pin},
};

/// Payment method identifiers the checkout API may pass as a hint. A hint
/// restricts the provider's payment page to that single method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMethod {
    CreditCard,
    BankTransfer,
    Gopay,
    Shopeepay,
    Qris,
    Echannel,
    Cstore,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreditCard => "credit_card",
            Self::BankTransfer => "bank_transfer",
            Self::Gopay => "gopay",
            Self::Shopeepay => "shopeepay",
            Self::Qris => "qris",
            Self::Echannel => "echannel",
            Self::Cstore => "cstore",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for PaymentMethod {
    type Error = ReconError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "credit_card" => Ok(Self::CreditCard),
            "bank_transfer" => Ok(Self::BankTransfer),
            "gopay" => Ok(Self::Gopay),
            "shopeepay" => Ok(Self::Shopeepay),
            "qris" => Ok(Self::Qris),
            "echannel" => Ok(Self::Echannel),
            "cstore" => Ok(Self::Cstore),
            other => Err(ReconError::Validation(format!(
                "unknown payment method: {other}"
            ))),
        }
    }
}

/// Normalized payload for the provider's transaction-create call.
#[derive(Debug, Clone)]
pub struct ChargeRequest {
    pub order_id: OrderId,
    pub amount: Amount,
    pub customer: CustomerDetails,
    pub enabled_payments: Option<Vec<PaymentMethod>>,
}

/// What a successful create call returns. Reused verbatim on every
/// subsequent checkout for the same order_id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderToken {
    pub token: String,
    pub redirect_url: String,
}

/// Live transaction state as reported by the provider's status endpoint.
#[derive(Debug, Clone)]
pub struct StatusReport {
    pub transaction_status: String,
    pub fraud_status: Option<String>,
    pub raw: serde_json::Value,
}

pub trait PaymentProvider: Send + Sync {
    fn create_transaction<'a>(
        &'a self,
        request: &'a ChargeRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ProviderToken, ReconError>> + Send + 'a>>;

    /// `Ok(None)` is the provider's "transaction not found" — the expected
    /// must-create outcome, never an error.
    fn query_status<'a>(
        &'a self,
        order_id: &'a OrderId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<StatusReport>, ReconError>> + Send + 'a>>;
}
