use {
    crate::{
        AppEnv, AppState,
        adapters::api_errors::ApiError,
        domain::{
            amount::Amount,
            error::ReconError,
            id::{BookingId, OrderId},
            provider::PaymentMethod,
            record::CustomerDetails,
            status::ProviderStatus,
        },
        services::{
            gateway::{CheckoutRequest, ensure_transaction},
            reconcile::{ReconOutcome, reconcile},
            status_poll::poll_status,
        },
    },
    axum::{
        Json,
        extract::{Path, State},
        http::HeaderMap,
    },
    serde::Deserialize,
    sha2::{Digest, Sha512},
};

/// Authenticated user id, attached upstream by the identity verifier.
fn caller_id(headers: &HeaderMap) -> Result<String, ReconError> {
    headers
        .get("X-User-Id")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or(ReconError::Unauthenticated)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionBody {
    pub booking_id: String,
    pub order_id: String,
    pub amount: i64,
    #[serde(default)]
    pub customer_details: Option<CustomerDetails>,
    #[serde(default)]
    pub payment_type: Option<String>,
}

pub async fn create_transaction_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateTransactionBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user_id = caller_id(&headers)?;
    let payment_type = body
        .payment_type
        .as_deref()
        .map(PaymentMethod::try_from)
        .transpose()?;

    let request = CheckoutRequest {
        order_id: OrderId::new(body.order_id)?,
        booking_id: BookingId::new(body.booking_id)?,
        user_id,
        amount: Amount::new(body.amount)?,
        customer: body.customer_details.unwrap_or_default(),
        payment_type,
    };

    let checkout = ensure_transaction(state.store.as_ref(), state.provider.as_ref(), request)
        .await?;
    Ok(Json(serde_json::to_value(checkout).map_err(ReconError::from)?))
}

/// Provider push notification. Fields beyond these stay in the raw payload
/// stored on the Transaction.
#[derive(Debug, Deserialize)]
pub struct Notification {
    pub order_id: String,
    pub transaction_status: String,
    #[serde(default)]
    pub fraud_status: Option<String>,
    #[serde(default)]
    pub status_code: Option<String>,
    #[serde(default)]
    pub gross_amount: Option<String>,
    #[serde(default)]
    pub signature_key: Option<String>,
}

/// The provider signs notifications with
/// sha512(order_id + status_code + gross_amount + server_key).
/// The sandbox omits `signature_key`, so an unsigned notification passes
/// in development only; a present signature is always verified.
pub fn verify_signature(
    note: &Notification,
    server_key: &str,
    env: AppEnv,
) -> Result<(), ReconError> {
    let Some(signature) = &note.signature_key else {
        if env.is_development() {
            return Ok(());
        }
        return Err(ReconError::Signature(
            "notification missing signature_key".into(),
        ));
    };
    let (Some(status_code), Some(gross_amount)) = (&note.status_code, &note.gross_amount) else {
        return Err(ReconError::Signature(
            "notification missing signature fields".into(),
        ));
    };

    let mut hasher = Sha512::new();
    hasher.update(note.order_id.as_bytes());
    hasher.update(status_code.as_bytes());
    hasher.update(gross_amount.as_bytes());
    hasher.update(server_key.as_bytes());
    let expected = hex::encode(hasher.finalize());

    if expected.eq_ignore_ascii_case(signature) {
        Ok(())
    } else {
        Err(ReconError::Signature("signature mismatch".into()))
    }
}

/// Webhook path. Every reconciliation outcome answers 200 so the provider
/// stops re-delivering; a missing Transaction answers 404 so it retries
/// once the record exists.
pub async fn notification_handler(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<serde_json::Value>, ApiError> {
    let raw: serde_json::Value = serde_json::from_str(&body)
        .map_err(|_| ReconError::Validation("malformed notification body".into()))?;
    let note: Notification = serde_json::from_value(raw.clone())
        .map_err(|e| ReconError::Validation(format!("notification: {e}")))?;

    verify_signature(&note, &state.server_key, state.app_env)?;

    let order_id = OrderId::new(note.order_id.as_str())?;
    let status = ProviderStatus::parse(&note.transaction_status);
    if let Some(fraud) = &note.fraud_status {
        tracing::info!(order_id = %order_id, fraud_status = %fraud, "notification fraud signal");
    }

    let outcome = reconcile(state.store.as_ref(), &order_id, &status, &raw).await?;
    let word = match outcome {
        ReconOutcome::Updated { .. } => "updated",
        ReconOutcome::Unchanged => "unchanged",
        ReconOutcome::Stale => "skipped",
        ReconOutcome::Unrecognized => "ignored",
    };
    tracing::info!(order_id = %order_id, status = word, "notification processed");
    Ok(Json(serde_json::json!({ "status": word })))
}

pub async fn status_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(order_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user_id = caller_id(&headers)?;
    state.poll_limiter.check(&user_id).await?;

    let order_id = OrderId::new(order_id)?;
    let view = poll_status(
        state.store.as_ref(),
        state.provider.as_ref(),
        &order_id,
        &user_id,
    )
    .await?;
    Ok(Json(serde_json::to_value(view).map_err(ReconError::from)?))
}
