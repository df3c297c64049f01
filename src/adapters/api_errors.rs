use crate::AppEnv;
use crate::domain::error::ReconError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Newtype over the domain error so the HTTP mapping lives in the adapter
/// layer only.
#[derive(Debug)]
pub struct ApiError(pub ReconError);

impl From<ReconError> for ApiError {
    fn from(err: ReconError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self.0 {
            ReconError::NotFound(kind) => (
                StatusCode::NOT_FOUND,
                "not_found",
                format!("{kind} not found"),
            ),
            ReconError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "unauthenticated",
                "authentication required".to_string(),
            ),
            ReconError::AccessDenied => (
                StatusCode::FORBIDDEN,
                "access_denied",
                "caller does not own this record".to_string(),
            ),
            ReconError::Validation(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                msg.clone(),
            ),
            ReconError::Signature(_) => (
                StatusCode::BAD_REQUEST,
                "signature_error",
                "invalid notification signature".to_string(),
            ),
            ReconError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                "status checks are limited to one per second".to_string(),
            ),
            ReconError::Provider(err) => {
                tracing::error!("provider error: {err}");
                (
                    StatusCode::BAD_GATEWAY,
                    "provider_error",
                    "payment provider unavailable".to_string(),
                )
            }
            ReconError::InvalidProviderResponse(err) => {
                tracing::error!("invalid provider response: {err}");
                (
                    StatusCode::BAD_GATEWAY,
                    "provider_error",
                    "payment provider returned an unusable response".to_string(),
                )
            }
            ReconError::Database(err) => {
                tracing::error!("database error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal error".to_string(),
                )
            }
            ReconError::Serialization(err) => {
                tracing::error!("serialization error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal error".to_string(),
                )
            }
        };

        // Development deployments carry the underlying error for local
        // work; production keeps internals out of responses.
        let body = if AppEnv::from_env().is_development() {
            serde_json::json!({
                "error_code": error_code,
                "message": message,
                "detail": self.0.to_string(),
            })
        } else {
            serde_json::json!({
                "error_code": error_code,
                "message": message,
            })
        };

        (status, Json(body)).into_response()
    }
}
