//! User handlers: list, create, get, update, delete.
//!
//! Plaintext passwords are hashed here, before anything reaches the store.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use rbac_crypto::Plaintext;
use rbac_storage::{Store, User, UserId};

use super::{body, EntityId};
use crate::error::{unique_on, ApiError};
use crate::schema::{UserResponse, UserWrite};
use crate::server::RbacServer;

const USERNAME_TAKEN: &str = "A user with that username already exists.";

/// Hashing runs on the blocking pool.
pub(crate) async fn hash_credential(plain: Plaintext) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || rbac_crypto::hash_password(&plain))
        .await
        .map_err(|e| ApiError::Internal(format!("hashing task failed: {e}")))?
        .map_err(|e| ApiError::Internal(e.to_string()))
}

async fn render(store: &dyn Store, user: User) -> Result<UserResponse, ApiError> {
    let groups = store.list_user_groups(&user.id).await?;
    Ok(UserResponse::new(user, groups))
}

#[tracing::instrument(skip_all)]
pub async fn list_users(
    State(server): State<RbacServer>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = server.store.list_users().await?;
    let mut out = Vec::with_capacity(users.len());
    for user in users {
        out.push(render(server.store.as_ref(), user).await?);
    }
    Ok(Json(out))
}

#[tracing::instrument(skip_all)]
pub async fn create_user(
    State(server): State<RbacServer>,
    payload: Result<Json<UserWrite>, JsonRejection>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let (mut params, password) = body(payload)?.validate_create()?;
    params.password_hash = hash_credential(password).await?;

    let user_id = server
        .store
        .create_user(&params)
        .await
        .map_err(unique_on("username", USERNAME_TAKEN))?;
    tracing::info!(user_id = user_id.0, username = %params.username, "user created");

    let user = server.store.get_user(&user_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(render(server.store.as_ref(), user).await?),
    ))
}

#[tracing::instrument(skip_all, fields(user_id = id))]
pub async fn get_user(
    State(server): State<RbacServer>,
    EntityId(id): EntityId,
) -> Result<Json<UserResponse>, ApiError> {
    let user = server.store.get_user(&UserId(id)).await?;
    Ok(Json(render(server.store.as_ref(), user).await?))
}

#[tracing::instrument(skip_all, fields(user_id = id))]
pub async fn update_user(
    State(server): State<RbacServer>,
    EntityId(id): EntityId,
    payload: Result<Json<UserWrite>, JsonRejection>,
) -> Result<Json<UserResponse>, ApiError> {
    let user_id = UserId(id);
    let (mut params, password) = body(payload)?.validate_update()?;
    if let Some(password) = password {
        params.password_hash = Some(hash_credential(password).await?);
    }

    server
        .store
        .update_user(&user_id, &params)
        .await
        .map_err(unique_on("username", USERNAME_TAKEN))?;

    let user = server.store.get_user(&user_id).await?;
    Ok(Json(render(server.store.as_ref(), user).await?))
}

#[tracing::instrument(skip_all, fields(user_id = id))]
pub async fn delete_user(
    State(server): State<RbacServer>,
    EntityId(id): EntityId,
) -> Result<StatusCode, ApiError> {
    server.store.delete_user(&UserId(id)).await?;
    tracing::info!("user deleted");
    Ok(StatusCode::NO_CONTENT)
}
