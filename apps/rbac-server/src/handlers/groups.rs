//! Group handlers: list, create, get, update, delete.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use rbac_storage::{Group, GroupId, Store};

use super::{body, EntityId};
use crate::error::{unique_on, ApiError};
use crate::schema::{GroupResponse, GroupWrite};
use crate::server::RbacServer;

const NAME_TAKEN: &str = "group with this name already exists.";

async fn render(store: &dyn Store, group: Group) -> Result<GroupResponse, ApiError> {
    let permissions = store.list_group_permissions(&group.id).await?;
    Ok(GroupResponse::new(group, permissions))
}

#[tracing::instrument(skip_all)]
pub async fn list_groups(
    State(server): State<RbacServer>,
) -> Result<Json<Vec<GroupResponse>>, ApiError> {
    let groups = server.store.list_groups().await?;
    let mut out = Vec::with_capacity(groups.len());
    for group in groups {
        out.push(render(server.store.as_ref(), group).await?);
    }
    Ok(Json(out))
}

#[tracing::instrument(skip_all)]
pub async fn create_group(
    State(server): State<RbacServer>,
    payload: Result<Json<GroupWrite>, JsonRejection>,
) -> Result<(StatusCode, Json<GroupResponse>), ApiError> {
    let params = body(payload)?.validate_create()?;

    let group_id = server
        .store
        .create_group(&params)
        .await
        .map_err(unique_on("name", NAME_TAKEN))?;
    tracing::info!(group_id = group_id.0, name = %params.name, "group created");

    let group = server.store.get_group(&group_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(render(server.store.as_ref(), group).await?),
    ))
}

#[tracing::instrument(skip_all, fields(group_id = id))]
pub async fn get_group(
    State(server): State<RbacServer>,
    EntityId(id): EntityId,
) -> Result<Json<GroupResponse>, ApiError> {
    let group = server.store.get_group(&GroupId(id)).await?;
    Ok(Json(render(server.store.as_ref(), group).await?))
}

/// A group owned by a project cannot be renamed on its own (409).
#[tracing::instrument(skip_all, fields(group_id = id))]
pub async fn update_group(
    State(server): State<RbacServer>,
    EntityId(id): EntityId,
    payload: Result<Json<GroupWrite>, JsonRejection>,
) -> Result<Json<GroupResponse>, ApiError> {
    let group_id = GroupId(id);
    let params = body(payload)?.validate_update()?;

    server
        .store
        .update_group(&group_id, &params)
        .await
        .map_err(unique_on("name", NAME_TAKEN))?;

    let group = server.store.get_group(&group_id).await?;
    Ok(Json(render(server.store.as_ref(), group).await?))
}

/// Members and grants lose only their link rows. A group owned by a project
/// is refused with 409.
#[tracing::instrument(skip_all, fields(group_id = id))]
pub async fn delete_group(
    State(server): State<RbacServer>,
    EntityId(id): EntityId,
) -> Result<StatusCode, ApiError> {
    server.store.delete_group(&GroupId(id)).await?;
    tracing::info!("group deleted");
    Ok(StatusCode::NO_CONTENT)
}
