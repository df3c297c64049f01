use {
    serde::{Deserialize, Serialize},
    std::fmt,
};

/// The provider's `transaction_status` vocabulary. Anything outside the
/// known set is carried verbatim for logging and never mapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderStatus {
    Capture,
    Settlement,
    Pending,
    Cancel,
    Deny,
    Expire,
    Unrecognized(String),
}

impl ProviderStatus {
    pub fn parse(s: &str) -> Self {
        match s {
            "capture" => Self::Capture,
            "settlement" => Self::Settlement,
            "pending" => Self::Pending,
            "cancel" => Self::Cancel,
            "deny" => Self::Deny,
            "expire" => Self::Expire,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Capture => "capture",
            Self::Settlement => "settlement",
            Self::Pending => "pending",
            Self::Cancel => "cancel",
            Self::Deny => "deny",
            Self::Expire => "expire",
            Self::Unrecognized(raw) => raw,
        }
    }
}

impl fmt::Display for ProviderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
        }
    }

    /// `confirmed` and `cancelled` are terminal — no transition leaves them.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentState {
    Unpaid,
    Success,
    Failed,
}

impl PaymentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unpaid => "unpaid",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for PaymentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingState {
    Unpaid,
    Success,
    Failed,
}

impl BillingState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unpaid => "unpaid",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for BillingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The single source-of-truth state value replicated onto all four records.
/// After any successful reconciliation every record carries the same triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTriple {
    pub status: OrderStatus,
    #[serde(rename = "paymentStatus")]
    pub payment: PaymentState,
    #[serde(rename = "billingStatus")]
    pub billing: BillingState,
}

impl StatusTriple {
    /// The sole state assigned at record creation.
    pub fn initial() -> Self {
        Self {
            status: OrderStatus::Pending,
            payment: PaymentState::Unpaid,
            billing: BillingState::Unpaid,
        }
    }
}

/// The one place translating provider vocabulary into domain vocabulary.
/// Both ingestion paths call through here — never duplicate this table.
/// `None` means the status is unrecognized and stored values stay untouched.
pub fn map_provider_status(status: &ProviderStatus) -> Option<StatusTriple> {
    match status {
        ProviderStatus::Capture | ProviderStatus::Settlement => Some(StatusTriple {
            status: OrderStatus::Confirmed,
            payment: PaymentState::Success,
            billing: BillingState::Success,
        }),
        ProviderStatus::Pending => Some(StatusTriple::initial()),
        ProviderStatus::Cancel | ProviderStatus::Deny | ProviderStatus::Expire => {
            Some(StatusTriple {
                status: OrderStatus::Cancelled,
                payment: PaymentState::Failed,
                billing: BillingState::Failed,
            })
        }
        ProviderStatus::Unrecognized(_) => None,
    }
}
