#![allow(dead_code)]

use chrono::Utc;
use pay_recon::domain::amount::Amount;
use pay_recon::domain::error::ReconError;
use pay_recon::domain::id::{BookingId, OrderId};
use pay_recon::domain::provider::{
    ChargeRequest, PaymentProvider, ProviderToken, StatusReport,
};
use pay_recon::domain::record::{
    BillingStatement, Booking, CustomerDetails, Order, Transaction,
};
use pay_recon::domain::status::StatusTriple;
use pay_recon::domain::store::{Collection, RecordPatch, RecordStore};
use pay_recon::services::gateway::CheckoutRequest;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

// ── In-memory document store ───────────────────────────────────────────────
// Fake for the injected store dependency. One mutex around the whole map
// makes the batch genuinely atomic: a batch either fully applies under the
// lock or fails before touching anything.

#[derive(Default)]
pub struct MemoryStore {
    docs: Mutex<HashMap<(Collection, String), serde_json::Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn doc(&self, collection: Collection, id: &str) -> Option<serde_json::Value> {
        self.docs
            .lock()
            .unwrap()
            .get(&(collection, id.to_string()))
            .cloned()
    }

    pub fn insert(&self, collection: Collection, id: &str, doc: serde_json::Value) {
        self.docs
            .lock()
            .unwrap()
            .insert((collection, id.to_string()), doc);
    }

    pub fn contains(&self, collection: Collection, id: &str) -> bool {
        self.docs
            .lock()
            .unwrap()
            .contains_key(&(collection, id.to_string()))
    }
}

impl RecordStore for MemoryStore {
    fn get<'a>(
        &'a self,
        collection: Collection,
        id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<serde_json::Value>, ReconError>> + Send + 'a>>
    {
        Box::pin(async move { Ok(self.doc(collection, id)) })
    }

    fn create<'a>(
        &'a self,
        collection: Collection,
        id: &'a str,
        doc: serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = Result<bool, ReconError>> + Send + 'a>> {
        Box::pin(async move {
            let mut docs = self.docs.lock().unwrap();
            let key = (collection, id.to_string());
            if docs.contains_key(&key) {
                return Ok(false);
            }
            docs.insert(key, doc);
            Ok(true)
        })
    }

    fn batch_update(
        &self,
        patches: Vec<RecordPatch>,
    ) -> Pin<Box<dyn Future<Output = Result<(), ReconError>> + Send + '_>> {
        Box::pin(async move {
            let mut docs = self.docs.lock().unwrap();

            // All targets must exist before anything is applied.
            for patch in &patches {
                if !docs.contains_key(&(patch.collection, patch.id.clone())) {
                    return Err(ReconError::NotFound(patch.collection.kind()));
                }
            }

            for patch in patches {
                let doc = docs
                    .get_mut(&(patch.collection, patch.id.clone()))
                    .expect("existence checked above");
                let obj = doc.as_object_mut().expect("documents are objects");
                for (key, value) in patch.fields {
                    obj.insert(key, value);
                }
            }
            Ok(())
        })
    }

    fn delete<'a>(
        &'a self,
        collection: Collection,
        id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<(), ReconError>> + Send + 'a>> {
        Box::pin(async move {
            self.docs.lock().unwrap().remove(&(collection, id.to_string()));
            Ok(())
        })
    }
}

// ── Scripted payment provider ──────────────────────────────────────────────

#[derive(Clone)]
pub enum CreateScript {
    Succeed,
    /// Transport failure — retriable ProviderError.
    Fail,
    /// 2xx response missing token/redirect_url.
    Malformed,
}

#[derive(Clone)]
pub enum StatusScript {
    NotFound,
    Report(String),
    Fail,
}

pub struct FakeProvider {
    pub create_script: Mutex<CreateScript>,
    pub status_script: Mutex<StatusScript>,
    pub create_delay: Mutex<Duration>,
    pub create_calls: AtomicUsize,
    pub query_calls: AtomicUsize,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self {
            create_script: Mutex::new(CreateScript::Succeed),
            status_script: Mutex::new(StatusScript::NotFound),
            create_delay: Mutex::new(Duration::ZERO),
            create_calls: AtomicUsize::new(0),
            query_calls: AtomicUsize::new(0),
        }
    }

    pub fn script_create(&self, script: CreateScript) {
        *self.create_script.lock().unwrap() = script;
    }

    /// Hold every create call open for `delay`, so tests can overlap a
    /// second checkout with one that is still talking to the provider.
    pub fn delay_create(&self, delay: Duration) {
        *self.create_delay.lock().unwrap() = delay;
    }

    pub fn script_status(&self, script: StatusScript) {
        *self.status_script.lock().unwrap() = script;
    }

    pub fn create_count(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn query_count(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }
}

impl PaymentProvider for FakeProvider {
    fn create_transaction<'a>(
        &'a self,
        request: &'a ChargeRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ProviderToken, ReconError>> + Send + 'a>> {
        Box::pin(async move {
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            let delay = *self.create_delay.lock().unwrap();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            match self.create_script.lock().unwrap().clone() {
                CreateScript::Succeed => Ok(ProviderToken {
                    token: format!("tok-{}", request.order_id),
                    redirect_url: format!("https://pay.example/{}", request.order_id),
                }),
                CreateScript::Fail => {
                    Err(ReconError::Provider("connection refused".into()))
                }
                CreateScript::Malformed => Err(ReconError::InvalidProviderResponse(
                    "create response missing token".into(),
                )),
            }
        })
    }

    fn query_status<'a>(
        &'a self,
        order_id: &'a OrderId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<StatusReport>, ReconError>> + Send + 'a>>
    {
        Box::pin(async move {
            self.query_calls.fetch_add(1, Ordering::SeqCst);
            match self.status_script.lock().unwrap().clone() {
                StatusScript::NotFound => Ok(None),
                StatusScript::Report(status) => Ok(Some(StatusReport {
                    transaction_status: status.clone(),
                    fraud_status: Some("accept".into()),
                    raw: serde_json::json!({
                        "order_id": order_id.as_str(),
                        "transaction_status": status,
                        "status_code": "200",
                    }),
                })),
                StatusScript::Fail => Err(ReconError::Provider("timeout".into())),
            }
        })
    }
}

// ── Builders ───────────────────────────────────────────────────────────────

pub fn oid(id: &str) -> OrderId {
    OrderId::new(id).unwrap()
}

pub fn bid(id: &str) -> BookingId {
    BookingId::new(id).unwrap()
}

pub fn seed_booking(store: &MemoryStore, booking_id: &str, user_id: &str) {
    let now = Utc::now();
    let booking = Booking {
        booking_id: bid(booking_id),
        user_id: user_id.to_string(),
        triple: StatusTriple::initial(),
        created_at: now,
        updated_at: now,
    };
    store.insert(
        Collection::Bookings,
        booking_id,
        serde_json::to_value(&booking).unwrap(),
    );
}

/// Seed the full four-record group for an order in its initial pending
/// state, with an issued provider token unless `token` is None.
pub fn seed_group(
    store: &MemoryStore,
    order_id: &str,
    booking_id: &str,
    user_id: &str,
    token: Option<&str>,
) {
    let now = Utc::now();
    seed_booking(store, booking_id, user_id);

    let order = Order::new(oid(order_id), bid(booking_id), user_id.to_string(), amt(50_000), now);
    store.insert(
        Collection::Orders,
        order_id,
        serde_json::to_value(&order).unwrap(),
    );

    let billing = BillingStatement::new(
        oid(order_id),
        bid(booking_id),
        user_id.to_string(),
        amt(50_000),
        now,
    );
    store.insert(
        Collection::BillingStatements,
        order_id,
        serde_json::to_value(&billing).unwrap(),
    );

    let transaction = Transaction {
        order_id: oid(order_id),
        booking_id: bid(booking_id),
        user_id: user_id.to_string(),
        amount: amt(50_000),
        customer: CustomerDetails::default().normalized(),
        triple: StatusTriple::initial(),
        token: token.map(str::to_string),
        redirect_url: token.map(|t| format!("https://pay.example/{t}")),
        provider_payload: serde_json::Value::Null,
        created_at: now,
        updated_at: now,
    };
    store.insert(
        Collection::Transactions,
        order_id,
        serde_json::to_value(&transaction).unwrap(),
    );
}

pub fn amt(value: i64) -> Amount {
    Amount::new(value).unwrap()
}

/// Backdate a record's `updatedAt`, e.g. to make a tokenless Transaction
/// look like the leftover of a long-dead request.
pub fn age_record(store: &MemoryStore, collection: Collection, id: &str, age: chrono::Duration) {
    let mut doc = store.doc(collection, id).expect("record exists");
    doc["updatedAt"] = serde_json::json!(Utc::now() - age);
    store.insert(collection, id, doc);
}

pub fn checkout(order_id: &str, booking_id: &str, user_id: &str) -> CheckoutRequest {
    CheckoutRequest {
        order_id: oid(order_id),
        booking_id: bid(booking_id),
        user_id: user_id.to_string(),
        amount: amt(50_000),
        customer: CustomerDetails::default(),
        payment_type: None,
    }
}

/// The stored {status, paymentStatus, billingStatus} of one record.
pub fn stored_triple(store: &MemoryStore, collection: Collection, id: &str) -> (String, String, String) {
    let doc = store.doc(collection, id).expect("record exists");
    let field = |name: &str| {
        doc.get(name)
            .and_then(|v| v.as_str())
            .unwrap_or_else(|| panic!("{name} missing on {id}"))
            .to_string()
    };
    (field("status"), field("paymentStatus"), field("billingStatus"))
}

pub fn all_collections(order_id: &str, booking_id: &str) -> [(Collection, String); 4] {
    [
        (Collection::Transactions, order_id.to_string()),
        (Collection::Orders, order_id.to_string()),
        (Collection::BillingStatements, order_id.to_string()),
        (Collection::Bookings, booking_id.to_string()),
    ]
}
