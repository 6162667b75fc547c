//! Project ⇄ bootstrap group bookkeeping.
//!
//! Every project owns one group with the same name. These helpers run inside
//! the caller's transaction so the pair is created, renamed and removed
//! together.

use chrono::Utc;
use rbac_storage::{GroupId, Project, ProjectId, StoreError};
use sqlx::SqliteConnection;

use crate::error::map_db_err;

/// Insert the group first, then the project that references it.
pub(crate) async fn create_project_with_group(
    conn: &mut SqliteConnection,
    name: &str,
) -> Result<Project, StoreError> {
    let group_id = sqlx::query("INSERT INTO rbac_groups(name) VALUES(?)")
        .bind(name)
        .execute(&mut *conn)
        .await
        .map_err(map_db_err)?
        .last_insert_rowid();

    let now = Utc::now();
    let project_id = sqlx::query(
        "INSERT INTO rbac_projects(name, group_id, create_time, update_time) VALUES(?, ?, ?, ?)",
    )
    .bind(name)
    .bind(group_id)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await
    .map_err(map_db_err)?
    .last_insert_rowid();

    tracing::info!(
        project_id,
        group_id,
        name,
        "created project with bootstrap group"
    );

    Ok(Project {
        id: ProjectId(project_id),
        name: name.to_string(),
        group_id: GroupId(group_id),
        create_time: now,
        update_time: now,
    })
}

/// Touch `update_time`; rename the project and its group when `name` is given.
///
/// The project row is written first so the transaction holds the write lock
/// before it reads anything.
pub(crate) async fn update_project_and_group(
    conn: &mut SqliteConnection,
    project_id: &ProjectId,
    name: Option<&str>,
) -> Result<(), StoreError> {
    let row: Option<(i64,)> = sqlx::query_as(
        "UPDATE rbac_projects SET name = COALESCE(?, name), update_time = ?
          WHERE id = ?
         RETURNING group_id",
    )
    .bind(name)
    .bind(Utc::now())
    .bind(project_id.0)
    .fetch_optional(&mut *conn)
    .await
    .map_err(map_db_err)?;
    let (group_id,) = row.ok_or(StoreError::NotFound)?;

    if let Some(name) = name {
        sqlx::query("UPDATE rbac_groups SET name = ? WHERE id = ?")
            .bind(name)
            .bind(group_id)
            .execute(&mut *conn)
            .await
            .map_err(map_db_err)?;
    }

    Ok(())
}

/// Drop the project, then the group it owned (links cascade).
pub(crate) async fn delete_project_and_group(
    conn: &mut SqliteConnection,
    project_id: &ProjectId,
) -> Result<(), StoreError> {
    let row: Option<(i64,)> =
        sqlx::query_as("DELETE FROM rbac_projects WHERE id = ? RETURNING group_id")
            .bind(project_id.0)
            .fetch_optional(&mut *conn)
            .await
            .map_err(map_db_err)?;
    let (group_id,) = row.ok_or(StoreError::NotFound)?;

    sqlx::query("DELETE FROM rbac_groups WHERE id = ?")
        .bind(group_id)
        .execute(&mut *conn)
        .await
        .map_err(map_db_err)?;

    tracing::info!(
        project_id = project_id.0,
        group_id,
        "deleted project and its group"
    );

    Ok(())
}
