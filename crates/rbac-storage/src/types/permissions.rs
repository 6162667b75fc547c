//! Permission types.

use super::PermissionId;

/// Permission record: one controllable action inside a category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Permission {
    pub id: PermissionId,
    /// Human readable label
    pub name: String,
    pub codename: String,
    pub category: String,
}

/// Parameters for creating a permission
#[derive(Clone, Debug)]
pub struct CreatePermissionParams {
    pub name: String,
    pub codename: String,
    pub category: String,
}

/// Partial update for a permission
#[derive(Clone, Debug, Default)]
pub struct UpdatePermissionParams {
    pub name: Option<String>,
    pub codename: Option<String>,
}
