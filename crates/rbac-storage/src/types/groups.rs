//! Group (role) types.

use super::{GroupId, PermissionId};

/// Group record
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
}

/// Parameters for creating a group
#[derive(Clone, Debug)]
pub struct CreateGroupParams {
    pub name: String,
    /// Permissions to grant, applied in the same transaction as the insert
    pub permission_ids: Option<Vec<PermissionId>>,
}

/// Partial update for a group
#[derive(Clone, Debug, Default)]
pub struct UpdateGroupParams {
    pub name: Option<String>,
    /// `Some(vec![])` revokes every permission
    pub permission_ids: Option<Vec<PermissionId>>,
}
