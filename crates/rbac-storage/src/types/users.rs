//! User types.

use chrono::{DateTime, Utc};

use super::{GroupId, UserId};

/// User record
#[derive(Clone, Debug)]
pub struct User {
    pub id: UserId,
    pub username: String,
    /// Argon2id PHC string; never plaintext.
    pub password_hash: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

/// Parameters for creating a user
#[derive(Clone, Debug)]
pub struct CreateUserParams {
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    /// Groups to join, applied in the same transaction as the insert
    pub group_ids: Option<Vec<GroupId>>,
}

/// Partial update for a user. `None` leaves the column unchanged.
#[derive(Clone, Debug, Default)]
pub struct UpdateUserParams {
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_active: Option<bool>,
    pub is_staff: Option<bool>,
    pub is_superuser: Option<bool>,
    pub last_login: Option<DateTime<Utc>>,
    /// `Some(vec![])` clears every membership
    pub group_ids: Option<Vec<GroupId>>,
}
