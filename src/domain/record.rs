use {
    super::amount::Amount,
    super::id::{BookingId, OrderId},
    super::status::StatusTriple,
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
};

/// Customer contact fields sent to the provider and stored on the
/// Transaction record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

impl CustomerDetails {
    /// Provider payloads must not carry empty contact fields — the original
    /// checkout form leaves them blank for walk-in customers.
    pub fn normalized(mut self) -> Self {
        if self.name.trim().is_empty() {
            self.name = "Customer".to_string();
        }
        if self.email.trim().is_empty() {
            self.email = "customer@example.com".to_string();
        }
        if self.phone.trim().is_empty() {
            self.phone = "-".to_string();
        }
        self
    }
}

/// The commercial intent to pay, keyed by order_id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: OrderId,
    pub booking_id: BookingId,
    pub user_id: String,
    pub amount: Amount,
    #[serde(flatten)]
    pub triple: StatusTriple,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn new(
        order_id: OrderId,
        booking_id: BookingId,
        user_id: String,
        amount: Amount,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            order_id,
            booking_id,
            user_id,
            amount,
            triple: StatusTriple::initial(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// The payable invoice line mirroring an Order ("tagihan" upstream).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingStatement {
    pub order_id: OrderId,
    pub booking_id: BookingId,
    pub user_id: String,
    pub amount: Amount,
    #[serde(flatten)]
    pub triple: StatusTriple,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BillingStatement {
    pub fn new(
        order_id: OrderId,
        booking_id: BookingId,
        user_id: String,
        amount: Amount,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            order_id,
            booking_id,
            user_id,
            amount,
            triple: StatusTriple::initial(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// The provider-facing record. It is created tokenless as the claim on the
/// provider create call; token and redirect URL are write-once, attached
/// when the provider issues them and never overwritten afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub order_id: OrderId,
    pub booking_id: BookingId,
    pub user_id: String,
    pub amount: Amount,
    pub customer: CustomerDetails,
    #[serde(flatten)]
    pub triple: StatusTriple,
    pub token: Option<String>,
    pub redirect_url: Option<String>,
    #[serde(default)]
    pub provider_payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        order_id: OrderId,
        booking_id: BookingId,
        user_id: String,
        amount: Amount,
        customer: CustomerDetails,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            order_id,
            booking_id,
            user_id,
            amount,
            customer,
            triple: StatusTriple::initial(),
            token: None,
            redirect_url: None,
            provider_payload: serde_json::Value::Null,
            created_at: now,
            updated_at: now,
        }
    }
}

/// The underlying service appointment being paid for. Created upstream;
/// this engine only patches its status fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub booking_id: BookingId,
    pub user_id: String,
    #[serde(flatten)]
    pub triple: StatusTriple,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
