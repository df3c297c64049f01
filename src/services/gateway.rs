use {
    crate::domain::{
        amount::Amount,
        error::ReconError,
        id::{BookingId, OrderId},
        provider::{ChargeRequest, PaymentMethod, PaymentProvider, ProviderToken},
        record::{BillingStatement, Booking, CustomerDetails, Order, Transaction},
        store::{Collection, RecordPatch, RecordStore, fetch},
    },
    chrono::Utc,
    std::time::Duration,
};

/// How long a concurrent request waits for the claim owner's token to land.
const CLAIM_POLL_INTERVAL: Duration = Duration::from_millis(25);
const CLAIM_POLL_ATTEMPTS: u32 = 20;

/// A tokenless claim older than this belongs to a request that crashed
/// mid-flight and is safe to take over.
fn stale_claim_after() -> chrono::Duration {
    chrono::Duration::seconds(30)
}

/// Checkout input after request validation.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub order_id: OrderId,
    pub booking_id: BookingId,
    pub user_id: String,
    pub amount: Amount,
    pub customer: CustomerDetails,
    pub payment_type: Option<PaymentMethod>,
}

/// The three records a checkout returns. Booking is deliberately absent —
/// checkout never exposes it.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkout {
    pub order: Order,
    pub billing_statement: BillingStatement,
    pub transaction: Transaction,
}

/// Create-or-reuse the provider transaction for an order.
///
/// Order and Billing Statement are created together, once, on the first
/// request for an order_id. A stored token is reused verbatim — a second
/// create call for the same order_id risks a duplicate charge. The create
/// call itself is guarded by a claim: the tokenless Transaction record is
/// persisted first, and only the request whose create-if-absent write won
/// talks to the provider. Everyone else waits for that token. If the
/// provider create fails, any records created optimistically in this call
/// are deleted again before the error surfaces.
pub async fn ensure_transaction(
    store: &dyn RecordStore,
    provider: &dyn PaymentProvider,
    request: CheckoutRequest,
) -> Result<Checkout, ReconError> {
    let booking: Booking = fetch(store, Collection::Bookings, request.booking_id.as_str()).await?;
    if booking.user_id != request.user_id {
        return Err(ReconError::AccessDenied);
    }

    let now = Utc::now();
    let customer = request.customer.clone().normalized();

    let order = Order::new(
        request.order_id.clone(),
        request.booking_id.clone(),
        request.user_id.clone(),
        request.amount,
        now,
    );
    let created_order = store
        .create(
            Collection::Orders,
            request.order_id.as_str(),
            serde_json::to_value(&order)?,
        )
        .await?;

    let billing = BillingStatement::new(
        request.order_id.clone(),
        request.booking_id.clone(),
        request.user_id.clone(),
        request.amount,
        now,
    );
    let created_billing = store
        .create(
            Collection::BillingStatements,
            request.order_id.as_str(),
            serde_json::to_value(&billing)?,
        )
        .await?;

    // A stored token wins over everything: reuse it, no provider call.
    // A stored tokenless Transaction is another request's claim on the
    // provider create; never issue a second create behind its back.
    if let Some(doc) = store
        .get(Collection::Transactions, request.order_id.as_str())
        .await?
    {
        let transaction: Transaction = serde_json::from_value(doc)?;
        return match transaction.token {
            Some(_) => {
                tracing::info!(order_id = %request.order_id, "reusing existing provider token");
                load_checkout(store, &request.order_id, transaction).await
            }
            None => {
                follow_claim(
                    store,
                    provider,
                    &request,
                    transaction,
                    created_order,
                    created_billing,
                )
                .await
            }
        };
    }

    // Claim the provider create before making it. create-if-absent picks
    // exactly one winner, so the provider sees at most one create call
    // per order_id no matter how many checkouts race.
    let claim = Transaction::new(
        request.order_id.clone(),
        request.booking_id.clone(),
        request.user_id.clone(),
        request.amount,
        customer,
        now,
    );
    let claimed = store
        .create(
            Collection::Transactions,
            request.order_id.as_str(),
            serde_json::to_value(&claim)?,
        )
        .await?;

    if !claimed {
        let stored: Transaction =
            fetch(store, Collection::Transactions, request.order_id.as_str()).await?;
        return match stored.token {
            Some(_) => {
                tracing::warn!(order_id = %request.order_id, "lost transaction claim race, returning stored token");
                load_checkout(store, &request.order_id, stored).await
            }
            None => {
                follow_claim(
                    store,
                    provider,
                    &request,
                    stored,
                    created_order,
                    created_billing,
                )
                .await
            }
        };
    }

    // The provider may already hold a transaction we never got a token
    // for (crash between create and persist). Creating again would
    // double-charge, so refuse and let an operator resolve it.
    match provider.query_status(&request.order_id).await {
        Ok(None) => {}
        Ok(Some(_)) => {
            compensate(store, &request.order_id, created_order, created_billing, true).await;
            return Err(ReconError::Validation(format!(
                "provider already holds a transaction for {} but no token is stored",
                request.order_id
            )));
        }
        Err(e) => {
            compensate(store, &request.order_id, created_order, created_billing, true).await;
            return Err(e);
        }
    }

    let issued = match provider.create_transaction(&charge_for(&request)).await {
        Ok(issued) => issued,
        Err(e) => {
            tracing::error!(order_id = %request.order_id, error = %e, "provider create failed, rolling back records");
            compensate(store, &request.order_id, created_order, created_billing, true).await;
            return Err(e);
        }
    };

    attach_token(store, &request.order_id, issued).await?;
    let stored: Transaction =
        fetch(store, Collection::Transactions, request.order_id.as_str()).await?;
    tracing::info!(order_id = %request.order_id, "provider transaction created");
    load_checkout(store, &request.order_id, stored).await
}

/// Another request holds the tokenless claim. Its token normally lands
/// within the provider timeout, so wait for it; a claim old enough that
/// its owner cannot still be in flight is taken over instead.
async fn follow_claim(
    store: &dyn RecordStore,
    provider: &dyn PaymentProvider,
    request: &CheckoutRequest,
    claim: Transaction,
    created_order: bool,
    created_billing: bool,
) -> Result<Checkout, ReconError> {
    if Utc::now() - claim.updated_at > stale_claim_after() {
        return take_over_claim(store, provider, request, created_order, created_billing).await;
    }

    for _ in 0..CLAIM_POLL_ATTEMPTS {
        tokio::time::sleep(CLAIM_POLL_INTERVAL).await;
        match store
            .get(Collection::Transactions, request.order_id.as_str())
            .await?
        {
            None => {
                // The claim owner failed and rolled back; its error is
                // surfacing on that request. This one retries.
                compensate(store, &request.order_id, created_order, created_billing, false).await;
                return Err(ReconError::Provider(
                    "checkout attempt was rolled back, retry".into(),
                ));
            }
            Some(doc) => {
                let stored: Transaction = serde_json::from_value(doc)?;
                if stored.token.is_some() {
                    return load_checkout(store, &request.order_id, stored).await;
                }
            }
        }
    }

    compensate(store, &request.order_id, created_order, created_billing, false).await;
    Err(ReconError::Provider(
        "provider transaction is still being issued, retry".into(),
    ))
}

/// The claim owner crashed before a token was attached. Provider state
/// decides: if it already holds the transaction the token is gone for
/// good, otherwise make the create call this claim never got to.
async fn take_over_claim(
    store: &dyn RecordStore,
    provider: &dyn PaymentProvider,
    request: &CheckoutRequest,
    created_order: bool,
    created_billing: bool,
) -> Result<Checkout, ReconError> {
    match provider.query_status(&request.order_id).await {
        Ok(None) => {}
        Ok(Some(_)) => {
            compensate(store, &request.order_id, created_order, created_billing, false).await;
            return Err(ReconError::Validation(format!(
                "provider already holds a transaction for {} but no token is stored",
                request.order_id
            )));
        }
        Err(e) => {
            compensate(store, &request.order_id, created_order, created_billing, false).await;
            return Err(e);
        }
    }

    let issued = match provider.create_transaction(&charge_for(request)).await {
        Ok(issued) => issued,
        Err(e) => {
            tracing::error!(order_id = %request.order_id, error = %e, "provider create failed during claim takeover");
            compensate(store, &request.order_id, created_order, created_billing, false).await;
            return Err(e);
        }
    };

    attach_token(store, &request.order_id, issued).await?;
    let stored: Transaction =
        fetch(store, Collection::Transactions, request.order_id.as_str()).await?;
    tracing::info!(order_id = %request.order_id, "recovered tokenless transaction");
    load_checkout(store, &request.order_id, stored).await
}

fn charge_for(request: &CheckoutRequest) -> ChargeRequest {
    ChargeRequest {
        order_id: request.order_id.clone(),
        amount: request.amount,
        customer: request.customer.clone().normalized(),
        enabled_payments: request.payment_type.map(|method| vec![method]),
    }
}

/// Write-once token attach. The claim record is patched, never replaced,
/// so concurrent status writes survive.
async fn attach_token(
    store: &dyn RecordStore,
    order_id: &OrderId,
    issued: ProviderToken,
) -> Result<(), ReconError> {
    let mut fields = serde_json::Map::new();
    fields.insert("token".to_string(), serde_json::Value::String(issued.token));
    fields.insert(
        "redirectUrl".to_string(),
        serde_json::Value::String(issued.redirect_url),
    );
    fields.insert("updatedAt".to_string(), serde_json::to_value(Utc::now())?);
    store
        .batch_update(vec![RecordPatch {
            collection: Collection::Transactions,
            id: order_id.as_str().to_string(),
            fields,
        }])
        .await
}

/// Read Order and Billing back from the store so the caller sees the
/// durable versions, not this request's in-memory candidates.
async fn load_checkout(
    store: &dyn RecordStore,
    order_id: &OrderId,
    transaction: Transaction,
) -> Result<Checkout, ReconError> {
    let order: Order = fetch(store, Collection::Orders, order_id.as_str()).await?;
    let billing_statement: BillingStatement =
        fetch(store, Collection::BillingStatements, order_id.as_str()).await?;
    Ok(Checkout {
        order,
        billing_statement,
        transaction,
    })
}

/// Compensating deletes for records created earlier in the same request.
/// Failures are logged, not surfaced — the provider error the caller is
/// about to receive is the actionable one.
async fn compensate(
    store: &dyn RecordStore,
    order_id: &OrderId,
    created_order: bool,
    created_billing: bool,
    created_claim: bool,
) {
    if created_claim {
        if let Err(e) = store
            .delete(Collection::Transactions, order_id.as_str())
            .await
        {
            tracing::error!(order_id = %order_id, error = %e, "failed to roll back transaction claim");
        }
    }
    if created_order {
        if let Err(e) = store.delete(Collection::Orders, order_id.as_str()).await {
            tracing::error!(order_id = %order_id, error = %e, "failed to roll back order");
        }
    }
    if created_billing {
        if let Err(e) = store
            .delete(Collection::BillingStatements, order_id.as_str())
            .await
        {
            tracing::error!(order_id = %order_id, error = %e, "failed to roll back billing statement");
        }
    }
}
