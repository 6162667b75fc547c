//! Many-to-many replacement (clear-then-set) for user groups and group
//! permissions.
//!
//! Callers pass a connection that is already inside a transaction; the
//! replacement is only visible once that transaction commits, so a failed
//! lookup or insert never leaves the owner with a cleared set.

use std::collections::BTreeSet;

use rbac_storage::{GroupId, PermissionId, StoreError, UserId, CATALOG_CATEGORY};
use sqlx::{Sqlite, SqliteConnection};

use crate::error::map_db_err;

/// SQL for one link table and the two tables it joins.
pub(crate) struct Association {
    owner_sql: &'static str,
    target_sql: &'static str,
    /// Extra bind for `target_sql` after the id (permission category).
    target_scope: Option<&'static str>,
    target_entity: &'static str,
    clear_sql: &'static str,
    insert_sql: &'static str,
}

pub(crate) const USER_GROUPS: Association = Association {
    owner_sql: "SELECT id FROM rbac_users WHERE id = ?",
    target_sql: "SELECT id FROM rbac_groups WHERE id = ?",
    target_scope: None,
    target_entity: "group",
    clear_sql: "DELETE FROM rbac_user_groups WHERE user_id = ?",
    insert_sql: "INSERT INTO rbac_user_groups(user_id, group_id) VALUES(?, ?)",
};

pub(crate) const GROUP_PERMISSIONS: Association = Association {
    owner_sql: "SELECT id FROM rbac_groups WHERE id = ?",
    target_sql: "SELECT id FROM rbac_permissions WHERE id = ? AND category = ?",
    target_scope: Some(CATALOG_CATEGORY),
    target_entity: "permission",
    clear_sql: "DELETE FROM rbac_group_permissions WHERE group_id = ?",
    insert_sql:
        "INSERT INTO rbac_group_permissions(group_id, permission_id) VALUES(?, ?)",
};

impl Association {
    /// Swap the owner's link rows for exactly the resolved target set. Any
    /// failure leaves the caller's transaction to roll the clear back.
    pub(crate) async fn replace(
        &self,
        conn: &mut SqliteConnection,
        owner: i64,
        targets: &[i64],
    ) -> Result<usize, StoreError> {
        // Clear first: a transaction that starts with a read cannot be upgraded
        // to a writer while another connection holds the write lock.
        sqlx::query(self.clear_sql)
            .bind(owner)
            .execute(&mut *conn)
            .await
            .map_err(map_db_err)?;

        let found: Option<(i64,)> = sqlx::query_as(self.owner_sql)
            .bind(owner)
            .fetch_optional(&mut *conn)
            .await
            .map_err(map_db_err)?;
        if found.is_none() {
            return Err(StoreError::NotFound);
        }

        let resolved: BTreeSet<i64> = targets.iter().copied().collect();
        for &id in &resolved {
            let mut query = sqlx::query_as::<Sqlite, (i64,)>(self.target_sql).bind(id);
            if let Some(scope) = self.target_scope {
                query = query.bind(scope);
            }
            let hit = query
                .fetch_optional(&mut *conn)
                .await
                .map_err(map_db_err)?;
            if hit.is_none() {
                return Err(StoreError::MissingReference {
                    entity: self.target_entity,
                    id,
                });
            }
        }

        for &id in &resolved {
            sqlx::query(self.insert_sql)
                .bind(owner)
                .bind(id)
                .execute(&mut *conn)
                .await
                .map_err(map_db_err)?;
        }

        tracing::debug!(
            owner,
            entity = self.target_entity,
            count = resolved.len(),
            "replaced association set"
        );

        Ok(resolved.len())
    }
}

pub(crate) async fn replace_user_groups(
    conn: &mut SqliteConnection,
    user_id: &UserId,
    group_ids: &[GroupId],
) -> Result<(), StoreError> {
    let targets: Vec<i64> = group_ids.iter().map(|g| g.0).collect();
    USER_GROUPS.replace(conn, user_id.0, &targets).await?;
    Ok(())
}

pub(crate) async fn replace_group_permissions(
    conn: &mut SqliteConnection,
    group_id: &GroupId,
    permission_ids: &[PermissionId],
) -> Result<(), StoreError> {
    let targets: Vec<i64> = permission_ids.iter().map(|p| p.0).collect();
    GROUP_PERMISSIONS.replace(conn, group_id.0, &targets).await?;
    Ok(())
}
