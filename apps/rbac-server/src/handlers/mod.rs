//! HTTP handlers, one module per resource.
//!
//! Each handler validates its body through [`crate::schema`], calls the
//! store, and re-reads whatever it needs to render the final state.

pub mod groups;
pub mod permissions;
pub mod projects;
pub mod users;

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use axum::Json;

use crate::error::ApiError;

/// Unwrap a JSON body, reporting malformed input as a 400.
pub(crate) fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => Err(ApiError::field("non_field_errors", rejection.body_text())),
    }
}

/// Numeric `{id}` path segment. Anything that is not an integer names no
/// record, so it is a 404 like any other unknown id.
pub(crate) struct EntityId(pub i64);

impl<S: Send + Sync> FromRequestParts<S> for EntityId {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<i64>::from_request_parts(parts, state).await {
            Ok(Path(id)) => Ok(EntityId(id)),
            Err(rejection) => {
                tracing::debug!(error = %rejection, "unparseable id in path");
                Err(ApiError::not_found())
            }
        }
    }
}
