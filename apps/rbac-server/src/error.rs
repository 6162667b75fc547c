//! Error type returned by every HTTP handler.

use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rbac_storage::StoreError;
use serde_json::json;
use thiserror::Error;

/// Messages keyed by the request field they belong to.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid request: {0:?}")]
    Validation(FieldErrors),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Integrity(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// A validation failure on a single field.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.into()]);
        ApiError::Validation(errors)
    }

    pub fn not_found() -> Self {
        ApiError::NotFound("Not found.".to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => ApiError::not_found(),
            StoreError::MissingReference { .. } => ApiError::NotFound(e.to_string()),
            StoreError::AlreadyExists => ApiError::Integrity("already exists".to_string()),
            StoreError::Conflict(msg) => ApiError::Integrity(msg),
            StoreError::Backend(msg) => ApiError::Internal(msg),
        }
    }
}

/// Report a unique-constraint violation against `field`; everything else
/// converts as usual.
pub fn unique_on(field: &'static str, message: &'static str) -> impl Fn(StoreError) -> ApiError {
    move |e| match e {
        StoreError::AlreadyExists => ApiError::field(field, message),
        other => other.into(),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(errors) => (StatusCode::BAD_REQUEST, Json(errors)).into_response(),
            ApiError::NotFound(detail) => {
                (StatusCode::NOT_FOUND, Json(json!({ "detail": detail }))).into_response()
            }
            ApiError::Integrity(detail) => {
                tracing::warn!(%detail, "integrity conflict");
                (StatusCode::CONFLICT, Json(json!({ "detail": detail }))).into_response()
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "detail": "A server error occurred." })),
                )
                    .into_response()
            }
        }
    }
}
