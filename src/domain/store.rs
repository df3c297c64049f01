use {
    super::error::{ReconError, RecordKind},
    serde::de::DeserializeOwned,
    std::{future::Future, pin::Pin},
};

/// The four record collections the reconciliation engine touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Orders,
    BillingStatements,
    Transactions,
    Bookings,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Orders => "orders",
            Self::BillingStatements => "billing_statements",
            Self::Transactions => "transactions",
            Self::Bookings => "bookings",
        }
    }

    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Orders => RecordKind::Order,
            Self::BillingStatements => RecordKind::BillingStatement,
            Self::Transactions => RecordKind::Transaction,
            Self::Bookings => RecordKind::Booking,
        }
    }
}

/// A partial update to one record. Merge semantics: named fields are
/// replaced, everything else on the document survives.
#[derive(Debug, Clone)]
pub struct RecordPatch {
    pub collection: Collection,
    pub id: String,
    pub fields: serde_json::Map<String, serde_json::Value>,
}

/// Document store boundary. The engine needs exactly four operations:
/// point read, create-if-absent, atomic multi-record patch, and delete
/// (compensation only). Injected at construction time so tests can
/// substitute an in-memory fake.
pub trait RecordStore: Send + Sync {
    fn get<'a>(
        &'a self,
        collection: Collection,
        id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<serde_json::Value>, ReconError>> + Send + 'a>>;

    /// Returns `false` when the record already existed (nothing written).
    fn create<'a>(
        &'a self,
        collection: Collection,
        id: &'a str,
        doc: serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = Result<bool, ReconError>> + Send + 'a>>;

    /// Applies every patch or none. Fails with `NotFound` if any target
    /// record is absent; no partial commit is ever observable.
    fn batch_update(
        &self,
        patches: Vec<RecordPatch>,
    ) -> Pin<Box<dyn Future<Output = Result<(), ReconError>> + Send + '_>>;

    fn delete<'a>(
        &'a self,
        collection: Collection,
        id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<(), ReconError>> + Send + 'a>>;
}

/// Typed point read: absent record maps to `NotFound` for the collection's
/// record kind.
pub async fn fetch<T: DeserializeOwned>(
    store: &dyn RecordStore,
    collection: Collection,
    id: &str,
) -> Result<T, ReconError> {
    let doc = store
        .get(collection, id)
        .await?
        .ok_or(ReconError::NotFound(collection.kind()))?;
    Ok(serde_json::from_value(doc)?)
}
