use {
    super::reconcile::reconcile,
    crate::domain::{
        error::ReconError,
        id::OrderId,
        provider::PaymentProvider,
        record::{BillingStatement, Booking, Order, Transaction},
        status::ProviderStatus,
        store::{Collection, RecordStore, fetch},
    },
};

/// The reconciled view of the whole record group, read back fresh after
/// any commit so the caller never sees this request's transient values.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusView {
    pub transaction: Transaction,
    pub order: Order,
    pub billing_statement: BillingStatement,
    pub booking: Booking,
}

/// Pull path: check live provider state for an order and reconcile.
///
/// A Transaction without a token was never linked to a provider
/// transaction — the stored state is returned without any provider call.
/// A provider outage degrades to the stored state instead of failing the
/// request; the provider's own webhook will catch the records up later.
pub async fn poll_status(
    store: &dyn RecordStore,
    provider: &dyn PaymentProvider,
    order_id: &OrderId,
    caller: &str,
) -> Result<StatusView, ReconError> {
    let transaction: Transaction =
        fetch(store, Collection::Transactions, order_id.as_str()).await?;
    if transaction.user_id != caller {
        return Err(ReconError::AccessDenied);
    }

    if transaction.token.is_some() {
        match provider.query_status(order_id).await {
            Ok(Some(report)) => {
                let status = ProviderStatus::parse(&report.transaction_status);
                if let Some(fraud) = &report.fraud_status {
                    tracing::debug!(order_id = %order_id, fraud_status = %fraud, "provider fraud signal");
                }
                let outcome = reconcile(store, order_id, &status, &report.raw).await?;
                tracing::info!(order_id = %order_id, ?outcome, "poll reconciled");
            }
            Ok(None) => {
                tracing::warn!(
                    order_id = %order_id,
                    "token stored but provider reports no transaction, returning stored state"
                );
            }
            Err(ReconError::Provider(msg)) | Err(ReconError::InvalidProviderResponse(msg)) => {
                tracing::warn!(
                    order_id = %order_id,
                    error = %msg,
                    "provider unavailable, returning stored state"
                );
            }
            Err(e) => return Err(e),
        }
    }

    load_view(store, order_id).await
}

pub async fn load_view(
    store: &dyn RecordStore,
    order_id: &OrderId,
) -> Result<StatusView, ReconError> {
    let transaction: Transaction =
        fetch(store, Collection::Transactions, order_id.as_str()).await?;
    let order: Order = fetch(store, Collection::Orders, order_id.as_str()).await?;
    let billing_statement: BillingStatement =
        fetch(store, Collection::BillingStatements, order_id.as_str()).await?;
    let booking: Booking = fetch(store, Collection::Bookings, order.booking_id.as_str()).await?;
    Ok(StatusView {
        transaction,
        order,
        billing_statement,
        booking,
    })
}
