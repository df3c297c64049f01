use {
    crate::domain::{
        error::ReconError,
        id::OrderId,
        provider::{ChargeRequest, PaymentProvider, ProviderToken, StatusReport},
    },
    std::{future::Future, pin::Pin, time::Duration},
};

/// Snap-style payment provider over HTTP. Create issues a hosted-payment
/// token; status is a point read by order_id. Server-key basic auth on
/// both, timeout treated as a provider failure.
pub struct HttpProvider {
    http: reqwest::Client,
    base_url: String,
    server_key: String,
}

impl HttpProvider {
    pub fn new(
        base_url: impl Into<String>,
        server_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ReconError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ReconError::Provider(format!("building http client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            server_key: server_key.into(),
        })
    }

    async fn create_inner(&self, request: &ChargeRequest) -> Result<ProviderToken, ReconError> {
        let mut payload = serde_json::json!({
            "transaction_details": {
                "order_id": request.order_id.as_str(),
                "gross_amount": request.amount.value(),
            },
            "customer_details": {
                "first_name": request.customer.name,
                "email": request.customer.email,
                "phone": request.customer.phone,
            },
        });
        if let Some(methods) = &request.enabled_payments {
            let names: Vec<&str> = methods.iter().map(|m| m.as_str()).collect();
            payload["enabled_payments"] = serde_json::json!(names);
        }

        let response = self
            .http
            .post(format!("{}/snap/v1/transactions", self.base_url))
            .basic_auth(&self.server_key, Some(""))
            .json(&payload)
            .send()
            .await
            .map_err(|e| ReconError::Provider(format!("create transaction: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReconError::Provider(format!(
                "create transaction: HTTP {status}: {body}"
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ReconError::Provider(format!("create transaction body: {e}")))?;

        let token = body
            .get("token")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                ReconError::InvalidProviderResponse("create response missing token".into())
            })?;
        let redirect_url = body
            .get("redirect_url")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                ReconError::InvalidProviderResponse("create response missing redirect_url".into())
            })?;

        Ok(ProviderToken {
            token: token.to_string(),
            redirect_url: redirect_url.to_string(),
        })
    }

    async fn query_inner(&self, order_id: &OrderId) -> Result<Option<StatusReport>, ReconError> {
        let response = self
            .http
            .get(format!("{}/v2/{}/status", self.base_url, order_id))
            .basic_auth(&self.server_key, Some(""))
            .send()
            .await
            .map_err(|e| ReconError::Provider(format!("query status: {e}")))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReconError::Provider(format!(
                "query status: HTTP {status}: {body}"
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ReconError::Provider(format!("query status body: {e}")))?;

        // Some deployments answer 200 with a 404 status_code in the body.
        if body.get("status_code").and_then(|v| v.as_str()) == Some("404") {
            return Ok(None);
        }

        let transaction_status = body
            .get("transaction_status")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                ReconError::InvalidProviderResponse(
                    "status response missing transaction_status".into(),
                )
            })?
            .to_string();
        let fraud_status = body
            .get("fraud_status")
            .and_then(|v| v.as_str())
            .map(str::to_string);

        Ok(Some(StatusReport {
            transaction_status,
            fraud_status,
            raw: body,
        }))
    }
}

impl PaymentProvider for HttpProvider {
    fn create_transaction<'a>(
        &'a self,
        request: &'a ChargeRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ProviderToken, ReconError>> + Send + 'a>> {
        Box::pin(self.create_inner(request))
    }

    fn query_status<'a>(
        &'a self,
        order_id: &'a OrderId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<StatusReport>, ReconError>> + Send + 'a>> {
        Box::pin(self.query_inner(order_id))
    }
}
