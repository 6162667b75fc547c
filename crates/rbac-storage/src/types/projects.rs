//! Project types.

use chrono::{DateTime, Utc};

use super::{GroupId, ProjectId};

/// Project record
#[derive(Clone, Debug)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    /// Bootstrap group created with the project; same name as the project
    pub group_id: GroupId,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

/// Parameters for creating a project
#[derive(Clone, Debug)]
pub struct CreateProjectParams {
    pub name: String,
}

/// Partial update for a project
#[derive(Clone, Debug, Default)]
pub struct UpdateProjectParams {
    pub name: Option<String>,
}
