//! Project handlers. Creating a project also creates its same-named group.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use rbac_storage::ProjectId;

use super::{body, EntityId};
use crate::error::{unique_on, ApiError};
use crate::schema::{ProjectResponse, ProjectWrite};
use crate::server::RbacServer;

/// The project's group would collide with an existing group name.
const GROUP_NAME_TAKEN: &str = "group with this name already exists.";

#[tracing::instrument(skip_all)]
pub async fn list_projects(
    State(server): State<RbacServer>,
) -> Result<Json<Vec<ProjectResponse>>, ApiError> {
    let projects = server.store.list_projects().await?;
    Ok(Json(projects.into_iter().map(ProjectResponse::from).collect()))
}

#[tracing::instrument(skip_all)]
pub async fn create_project(
    State(server): State<RbacServer>,
    payload: Result<Json<ProjectWrite>, JsonRejection>,
) -> Result<(StatusCode, Json<ProjectResponse>), ApiError> {
    let params = body(payload)?.validate_create()?;

    let project = server
        .store
        .create_project(&params)
        .await
        .map_err(unique_on("name", GROUP_NAME_TAKEN))?;
    tracing::info!(
        project_id = project.id.0,
        group_id = project.group_id.0,
        "project created"
    );

    Ok((StatusCode::CREATED, Json(project.into())))
}

#[tracing::instrument(skip_all, fields(project_id = id))]
pub async fn get_project(
    State(server): State<RbacServer>,
    EntityId(id): EntityId,
) -> Result<Json<ProjectResponse>, ApiError> {
    let project = server.store.get_project(&ProjectId(id)).await?;
    Ok(Json(project.into()))
}

/// A rename carries over to the owned group.
#[tracing::instrument(skip_all, fields(project_id = id))]
pub async fn update_project(
    State(server): State<RbacServer>,
    EntityId(id): EntityId,
    payload: Result<Json<ProjectWrite>, JsonRejection>,
) -> Result<Json<ProjectResponse>, ApiError> {
    let project_id = ProjectId(id);
    let params = body(payload)?.validate_update()?;

    server
        .store
        .update_project(&project_id, &params)
        .await
        .map_err(unique_on("name", GROUP_NAME_TAKEN))?;

    let project = server.store.get_project(&project_id).await?;
    Ok(Json(project.into()))
}

#[tracing::instrument(skip_all, fields(project_id = id))]
pub async fn delete_project(
    State(server): State<RbacServer>,
    EntityId(id): EntityId,
) -> Result<StatusCode, ApiError> {
    server.store.delete_project(&ProjectId(id)).await?;
    tracing::info!("project and its group deleted");
    Ok(StatusCode::NO_CONTENT)
}
