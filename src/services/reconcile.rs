use {
    crate::domain::{
        error::ReconError,
        id::OrderId,
        record::{BillingStatement, Booking, Order, Transaction},
        status::{ProviderStatus, StatusTriple, map_provider_status},
        store::{Collection, RecordPatch, RecordStore, fetch},
    },
    chrono::{DateTime, Utc},
};

/// What a reconciliation attempt did. Every non-error outcome is safe to
/// acknowledge to the notification sender — re-delivery must stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconOutcome {
    /// All four records now carry this triple.
    Updated { triple: StatusTriple },
    /// Provider reported the state we already store — idempotent no-op.
    Unchanged,
    /// Stored state is terminal and the report disagrees; skipped so a
    /// late or out-of-order notification can never regress a settled order.
    Stale,
    /// Provider status outside the known vocabulary; stored values kept.
    Unrecognized,
}

/// Bring all four records for `order_id` into agreement with a
/// provider-reported status. The single choke point for mutation of the
/// record group: reads all precede writes, and the write is one atomic
/// batch across the group.
///
/// Precondition: a Transaction record for `order_id` exists. Absence is a
/// non-retriable `NotFound` — the ingestion path validates creation first.
pub async fn reconcile(
    store: &dyn RecordStore,
    order_id: &OrderId,
    provider_status: &ProviderStatus,
    provider_payload: &serde_json::Value,
) -> Result<ReconOutcome, ReconError> {
    let transaction: Transaction =
        fetch(store, Collection::Transactions, order_id.as_str()).await?;
    let order: Order = fetch(store, Collection::Orders, order_id.as_str()).await?;
    let _billing: BillingStatement =
        fetch(store, Collection::BillingStatements, order_id.as_str()).await?;
    let booking: Booking = fetch(store, Collection::Bookings, order.booking_id.as_str()).await?;

    let Some(triple) = map_provider_status(provider_status) else {
        tracing::warn!(
            order_id = %order_id,
            provider_status = %provider_status,
            "unrecognized provider status, records left untouched"
        );
        return Ok(ReconOutcome::Unrecognized);
    };

    let now = Utc::now();

    if triple == transaction.triple {
        // Re-delivered notification. State is already right; still keep the
        // latest provider evidence on the Transaction.
        store
            .batch_update(vec![payload_patch(order_id, provider_payload, now)?])
            .await?;
        return Ok(ReconOutcome::Unchanged);
    }

    if transaction.triple.status.is_terminal() {
        tracing::warn!(
            order_id = %order_id,
            stored = %transaction.triple.status,
            incoming = %triple.status,
            "provider status would regress a terminal record, skipped"
        );
        store
            .batch_update(vec![payload_patch(order_id, provider_payload, now)?])
            .await?;
        return Ok(ReconOutcome::Stale);
    }

    let mut transaction_fields = triple_fields(&triple, now)?;
    transaction_fields.insert("providerPayload".to_string(), provider_payload.clone());

    store
        .batch_update(vec![
            RecordPatch {
                collection: Collection::Transactions,
                id: order_id.as_str().to_string(),
                fields: transaction_fields,
            },
            RecordPatch {
                collection: Collection::Orders,
                id: order_id.as_str().to_string(),
                fields: triple_fields(&triple, now)?,
            },
            RecordPatch {
                collection: Collection::BillingStatements,
                id: order_id.as_str().to_string(),
                fields: triple_fields(&triple, now)?,
            },
            RecordPatch {
                collection: Collection::Bookings,
                id: booking.booking_id.as_str().to_string(),
                fields: triple_fields(&triple, now)?,
            },
        ])
        .await?;

    tracing::info!(
        order_id = %order_id,
        provider_status = %provider_status,
        status = %triple.status,
        payment = %triple.payment,
        "reconciled all records"
    );

    Ok(ReconOutcome::Updated { triple })
}

fn triple_fields(
    triple: &StatusTriple,
    now: DateTime<Utc>,
) -> Result<serde_json::Map<String, serde_json::Value>, ReconError> {
    let mut fields = serde_json::Map::new();
    fields.insert("status".to_string(), serde_json::to_value(triple.status)?);
    fields.insert(
        "paymentStatus".to_string(),
        serde_json::to_value(triple.payment)?,
    );
    fields.insert(
        "billingStatus".to_string(),
        serde_json::to_value(triple.billing)?,
    );
    fields.insert("updatedAt".to_string(), serde_json::to_value(now)?);
    Ok(fields)
}

fn payload_patch(
    order_id: &OrderId,
    provider_payload: &serde_json::Value,
    now: DateTime<Utc>,
) -> Result<RecordPatch, ReconError> {
    let mut fields = serde_json::Map::new();
    fields.insert("providerPayload".to_string(), provider_payload.clone());
    fields.insert("updatedAt".to_string(), serde_json::to_value(now)?);
    Ok(RecordPatch {
        collection: Collection::Transactions,
        id: order_id.as_str().to_string(),
        fields,
    })
}
