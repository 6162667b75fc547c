//! Permission handlers. Only the controllable-action catalog is visible here.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use rbac_storage::PermissionId;

use super::{body, EntityId};
use crate::error::{unique_on, ApiError};
use crate::schema::{PermissionResponse, PermissionWrite};
use crate::server::RbacServer;

const CODENAME_TAKEN: &str = "permission with this codename already exists.";

#[tracing::instrument(skip_all)]
pub async fn list_permissions(
    State(server): State<RbacServer>,
) -> Result<Json<Vec<PermissionResponse>>, ApiError> {
    let permissions = server.store.list_permissions().await?;
    Ok(Json(
        permissions.into_iter().map(PermissionResponse::from).collect(),
    ))
}

#[tracing::instrument(skip_all)]
pub async fn create_permission(
    State(server): State<RbacServer>,
    payload: Result<Json<PermissionWrite>, JsonRejection>,
) -> Result<(StatusCode, Json<PermissionResponse>), ApiError> {
    let params = body(payload)?.validate_create()?;

    let permission_id = server
        .store
        .create_permission(&params)
        .await
        .map_err(unique_on("codename", CODENAME_TAKEN))?;
    tracing::info!(
        permission_id = permission_id.0,
        codename = %params.codename,
        "permission created"
    );

    let permission = server.store.get_permission(&permission_id).await?;
    Ok((StatusCode::CREATED, Json(permission.into())))
}

#[tracing::instrument(skip_all, fields(permission_id = id))]
pub async fn get_permission(
    State(server): State<RbacServer>,
    EntityId(id): EntityId,
) -> Result<Json<PermissionResponse>, ApiError> {
    let permission = server.store.get_permission(&PermissionId(id)).await?;
    Ok(Json(permission.into()))
}

#[tracing::instrument(skip_all, fields(permission_id = id))]
pub async fn update_permission(
    State(server): State<RbacServer>,
    EntityId(id): EntityId,
    payload: Result<Json<PermissionWrite>, JsonRejection>,
) -> Result<Json<PermissionResponse>, ApiError> {
    let permission_id = PermissionId(id);
    let params = body(payload)?.validate_update()?;

    server
        .store
        .update_permission(&permission_id, &params)
        .await
        .map_err(unique_on("codename", CODENAME_TAKEN))?;

    let permission = server.store.get_permission(&permission_id).await?;
    Ok(Json(permission.into()))
}

#[tracing::instrument(skip_all, fields(permission_id = id))]
pub async fn delete_permission(
    State(server): State<RbacServer>,
    EntityId(id): EntityId,
) -> Result<StatusCode, ApiError> {
    server.store.delete_permission(&PermissionId(id)).await?;
    tracing::info!("permission deleted");
    Ok(StatusCode::NO_CONTENT)
}
