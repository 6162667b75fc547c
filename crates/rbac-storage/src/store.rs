//! The Store trait that backends implement.

use crate::types::*;
use crate::StoreError;

/// The storage trait the server depends on.
///
/// Lists are ordered newest first (descending id). Permission methods only
/// see rows in [`CATALOG_CATEGORY`], except `create_permission` which takes
/// the category explicitly.
///
/// Methods that touch more than one table (association replacement, project
/// bootstrap) must be atomic: either every row changes or none does.
#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    // ───────────────────────────────────── Users ──────────────────────────────────────────

    /// List all users.
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;

    /// Create a user (returns generated ID).
    /// If params.group_ids is provided, memberships are set in the same transaction.
    async fn create_user(&self, params: &CreateUserParams) -> Result<UserId, StoreError>;

    /// Get user by ID.
    async fn get_user(&self, user_id: &UserId) -> Result<User, StoreError>;

    /// Apply a partial update; group_ids, when present, replaces every membership.
    async fn update_user(
        &self,
        user_id: &UserId,
        params: &UpdateUserParams,
    ) -> Result<(), StoreError>;

    /// Delete a user and its memberships.
    async fn delete_user(&self, user_id: &UserId) -> Result<(), StoreError>;

    /// Groups the user belongs to.
    async fn list_user_groups(&self, user_id: &UserId) -> Result<Vec<Group>, StoreError>;

    /// Replace the user's memberships with exactly `group_ids`.
    async fn set_user_groups(
        &self,
        user_id: &UserId,
        group_ids: &[GroupId],
    ) -> Result<(), StoreError>;

    // ───────────────────────────────────── Groups ─────────────────────────────────────────

    /// List all groups.
    async fn list_groups(&self) -> Result<Vec<Group>, StoreError>;

    /// Create a group (returns generated ID).
    async fn create_group(&self, params: &CreateGroupParams) -> Result<GroupId, StoreError>;

    /// Get group by ID.
    async fn get_group(&self, group_id: &GroupId) -> Result<Group, StoreError>;

    /// Apply a partial update; permission_ids, when present, replaces every grant.
    async fn update_group(
        &self,
        group_id: &GroupId,
        params: &UpdateGroupParams,
    ) -> Result<(), StoreError>;

    /// Delete a group. Members and permissions survive; only the links go.
    /// Fails with Conflict while a project still owns the group.
    async fn delete_group(&self, group_id: &GroupId) -> Result<(), StoreError>;

    /// Permissions granted to the group.
    async fn list_group_permissions(
        &self,
        group_id: &GroupId,
    ) -> Result<Vec<Permission>, StoreError>;

    /// Replace the group's permissions with exactly `permission_ids`.
    async fn set_group_permissions(
        &self,
        group_id: &GroupId,
        permission_ids: &[PermissionId],
    ) -> Result<(), StoreError>;

    // ───────────────────────────────────── Permissions ────────────────────────────────────

    /// List catalog-category permissions.
    async fn list_permissions(&self) -> Result<Vec<Permission>, StoreError>;

    /// Create a permission in the given category (returns generated ID).
    async fn create_permission(
        &self,
        params: &CreatePermissionParams,
    ) -> Result<PermissionId, StoreError>;

    /// Get a catalog-category permission by ID.
    async fn get_permission(&self, permission_id: &PermissionId)
        -> Result<Permission, StoreError>;

    /// Apply a partial update to a catalog-category permission.
    async fn update_permission(
        &self,
        permission_id: &PermissionId,
        params: &UpdatePermissionParams,
    ) -> Result<(), StoreError>;

    /// Delete a catalog-category permission and its grants.
    async fn delete_permission(&self, permission_id: &PermissionId) -> Result<(), StoreError>;

    // ───────────────────────────────────── Projects ───────────────────────────────────────

    /// List all projects.
    async fn list_projects(&self) -> Result<Vec<Project>, StoreError>;

    /// Create a project together with its same-named group.
    async fn create_project(&self, params: &CreateProjectParams) -> Result<Project, StoreError>;

    /// Get a project by ID.
    async fn get_project(&self, project_id: &ProjectId) -> Result<Project, StoreError>;

    /// Apply a partial update; a rename also renames the owned group.
    async fn update_project(
        &self,
        project_id: &ProjectId,
        params: &UpdateProjectParams,
    ) -> Result<(), StoreError>;

    /// Delete a project and its owned group.
    async fn delete_project(&self, project_id: &ProjectId) -> Result<(), StoreError>;
}
