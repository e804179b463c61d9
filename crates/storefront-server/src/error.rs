//! HTTP error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use storefront_commerce::checkout::FieldErrors;
use storefront_commerce::CommerceError;
use storefront_payments::GatewayError;
use storefront_store::StoreError;
use thiserror::Error;
use tracing::error;

/// Errors answered as `{"error": ..., "details"?: ...}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    Http {
        status: StatusCode,
        message: String,
        details: Option<String>,
    },

    /// Customer details failed validation; answered with the per-field messages.
    #[error("Invalid customer details: {0}")]
    Validation(FieldErrors),

    #[error(transparent)]
    Commerce(#[from] CommerceError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn with_details(self, details: impl Into<String>) -> Self {
        match self {
            ApiError::Http {
                status, message, ..
            } => ApiError::Http {
                status,
                message,
                details: Some(details.into()),
            },
            other => other,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Http { status, .. } => *status,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Commerce(e) => match e {
                CommerceError::ProductNotFound(_) => StatusCode::NOT_FOUND,
                CommerceError::Overflow | CommerceError::SerializationError(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
                _ => StatusCode::BAD_REQUEST,
            },
            ApiError::Gateway(e) => StatusCode::from_u16(e.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            ApiError::Store(StoreError::InvalidOrderId(_)) => StatusCode::BAD_REQUEST,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "request failed");
        }

        let body = match self {
            ApiError::Http {
                message, details, ..
            } => match details {
                Some(details) => serde_json::json!({ "error": message, "details": details }),
                None => serde_json::json!({ "error": message }),
            },
            ApiError::Validation(fields) => serde_json::json!({
                "error": "Invalid customer details",
                "details": fields.to_string(),
                "fields": fields,
            }),
            ApiError::Gateway(GatewayError::Rejected { message, .. }) => {
                serde_json::json!({ "error": message })
            }
            other => serde_json::json!({ "error": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
