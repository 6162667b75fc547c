//! Request and response bodies plus field validation.
//!
//! Write payloads are partial: every field is optional at the serde level and
//! `validate_*` decides which ones a create requires. Association lists keep
//! the distinction between an absent/`null` field (leave unchanged) and `[]`
//! (clear).

use chrono::{DateTime, Utc};
use rbac_crypto::Plaintext;
use rbac_storage::{
    CreateGroupParams, CreatePermissionParams, CreateProjectParams, CreateUserParams, Group,
    GroupId, Permission, PermissionId, Project, UpdateGroupParams, UpdatePermissionParams,
    UpdateProjectParams, UpdateUserParams, User, CATALOG_CATEGORY,
};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, FieldErrors};

const REQUIRED: &str = "This field is required.";
const BLANK: &str = "This field may not be blank.";

pub const USERNAME_MAX: usize = 150;
pub const EMAIL_MAX: usize = 254;
pub const PERSON_NAME_MAX: usize = 150;
pub const GROUP_NAME_MAX: usize = 150;
pub const PERMISSION_NAME_MAX: usize = 255;
pub const CODENAME_MAX: usize = 100;
pub const PROJECT_NAME_MAX: usize = 128;

fn too_long(max: usize) -> String {
    format!("Ensure this field has no more than {max} characters.")
}

/// Collects per-field messages; [`Validator::finish`] turns them into a 400.
#[derive(Default)]
struct Validator {
    errors: FieldErrors,
}

impl Validator {
    fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    fn required<'a>(&mut self, field: &str, value: &'a Option<String>) -> Option<&'a str> {
        if value.is_none() {
            self.push(field, REQUIRED);
        }
        value.as_deref()
    }

    /// Non-blank text no longer than `max` characters.
    fn text(&mut self, field: &str, value: &str, max: usize) {
        if value.trim().is_empty() {
            self.push(field, BLANK);
        } else if value.chars().count() > max {
            self.push(field, too_long(max));
        }
    }

    /// Text that may be empty but is still bounded.
    fn bounded(&mut self, field: &str, value: &str, max: usize) {
        if value.chars().count() > max {
            self.push(field, too_long(max));
        }
    }

    fn finish(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self.errors))
        }
    }
}

fn is_valid_username(username: &str) -> bool {
    username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
}

/// `local@domain.tld` with no whitespace and no empty labels in the domain.
fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.rsplit_once('@') else {
        return false;
    };
    !local.is_empty()
        && !local.contains('@')
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
}

// ───────────────────────────────────── Users ──────────────────────────────────────────

/// Body of `POST /users` and `PUT|PATCH /users/{id}`. Not `Debug`: it can
/// carry a plaintext password.
#[derive(Deserialize, Default)]
#[serde(default)]
pub struct UserWrite {
    pub username: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_active: Option<bool>,
    pub is_staff: Option<bool>,
    pub is_superuser: Option<bool>,
    pub last_login: Option<DateTime<Utc>>,
    pub groups: Option<Vec<i64>>,
}

impl UserWrite {
    fn check_common(&self, v: &mut Validator) {
        if let Some(username) = &self.username {
            v.text("username", username, USERNAME_MAX);
            if !username.trim().is_empty() && !is_valid_username(username) {
                v.push(
                    "username",
                    "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
                );
            }
        }
        if let Some(password) = &self.password {
            if password.is_empty() {
                v.push("password", BLANK);
            }
        }
        if let Some(email) = &self.email {
            if email.chars().count() > EMAIL_MAX {
                v.push("email", too_long(EMAIL_MAX));
            } else if !email.is_empty() && !is_valid_email(email) {
                v.push("email", "Enter a valid email address.");
            }
        }
        if let Some(first_name) = &self.first_name {
            v.bounded("first_name", first_name, PERSON_NAME_MAX);
        }
        if let Some(last_name) = &self.last_name {
            v.bounded("last_name", last_name, PERSON_NAME_MAX);
        }
    }

    /// Validate a create payload. The returned params carry an empty
    /// `password_hash` for the caller to fill in after hashing.
    pub fn validate_create(self) -> Result<(CreateUserParams, Plaintext), ApiError> {
        let mut v = Validator::default();
        v.required("username", &self.username);
        v.required("password", &self.password);
        self.check_common(&mut v);
        v.finish()?;

        let password = Plaintext::new(self.password.unwrap_or_default());
        let params = CreateUserParams {
            username: self.username.unwrap_or_default(),
            password_hash: String::new(),
            email: self.email.unwrap_or_default(),
            first_name: self.first_name.unwrap_or_default(),
            last_name: self.last_name.unwrap_or_default(),
            is_active: self.is_active.unwrap_or(true),
            is_staff: self.is_staff.unwrap_or(false),
            is_superuser: self.is_superuser.unwrap_or(false),
            group_ids: self
                .groups
                .map(|ids| ids.into_iter().map(GroupId).collect()),
        };
        Ok((params, password))
    }

    /// Validate a partial update. A supplied password comes back separately
    /// so it can be hashed before the params reach the store.
    pub fn validate_update(self) -> Result<(UpdateUserParams, Option<Plaintext>), ApiError> {
        let mut v = Validator::default();
        self.check_common(&mut v);
        v.finish()?;

        let password = self.password.map(Plaintext::new);
        let params = UpdateUserParams {
            username: self.username,
            password_hash: None,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            is_active: self.is_active,
            is_staff: self.is_staff,
            is_superuser: self.is_superuser,
            last_login: self.last_login,
            group_ids: self
                .groups
                .map(|ids| ids.into_iter().map(GroupId).collect()),
        };
        Ok((params, password))
    }
}

/// An association entry expanded to something a person can read.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NamedRef {
    pub id: i64,
    pub name: String,
}

impl From<Group> for NamedRef {
    fn from(g: Group) -> Self {
        NamedRef {
            id: g.id.0,
            name: g.name,
        }
    }
}

impl From<Permission> for NamedRef {
    fn from(p: Permission) -> Self {
        NamedRef {
            id: p.id.0,
            name: p.name,
        }
    }
}

/// A user as returned by the API. Never carries the password.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub groups: Vec<NamedRef>,
}

impl UserResponse {
    pub fn new(user: User, groups: Vec<Group>) -> Self {
        UserResponse {
            id: user.id.0,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            is_active: user.is_active,
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
            date_joined: user.date_joined,
            last_login: user.last_login,
            groups: groups.into_iter().map(NamedRef::from).collect(),
        }
    }
}

// ───────────────────────────────────── Groups ─────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct GroupWrite {
    pub name: Option<String>,
    pub permissions: Option<Vec<i64>>,
}

impl GroupWrite {
    fn permission_ids(&self) -> Option<Vec<PermissionId>> {
        self.permissions
            .as_ref()
            .map(|ids| ids.iter().copied().map(PermissionId).collect())
    }

    pub fn validate_create(self) -> Result<CreateGroupParams, ApiError> {
        let mut v = Validator::default();
        if let Some(name) = v.required("name", &self.name) {
            v.text("name", name, GROUP_NAME_MAX);
        }
        v.finish()?;

        Ok(CreateGroupParams {
            permission_ids: self.permission_ids(),
            name: self.name.unwrap_or_default(),
        })
    }

    pub fn validate_update(self) -> Result<UpdateGroupParams, ApiError> {
        let mut v = Validator::default();
        if let Some(name) = &self.name {
            v.text("name", name, GROUP_NAME_MAX);
        }
        v.finish()?;

        Ok(UpdateGroupParams {
            permission_ids: self.permission_ids(),
            name: self.name,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct GroupResponse {
    pub id: i64,
    pub name: String,
    pub permissions: Vec<NamedRef>,
}

impl GroupResponse {
    pub fn new(group: Group, permissions: Vec<Permission>) -> Self {
        GroupResponse {
            id: group.id.0,
            name: group.name,
            permissions: permissions.into_iter().map(NamedRef::from).collect(),
        }
    }
}

// ─────────────────────────────────── Permissions ──────────────────────────────────────

/// The category is not accepted from clients; every permission created here
/// belongs to the catalog.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct PermissionWrite {
    pub name: Option<String>,
    pub codename: Option<String>,
}

impl PermissionWrite {
    fn check(&self, v: &mut Validator) {
        if let Some(name) = &self.name {
            v.text("name", name, PERMISSION_NAME_MAX);
        }
        if let Some(codename) = &self.codename {
            v.text("codename", codename, CODENAME_MAX);
        }
    }

    pub fn validate_create(self) -> Result<CreatePermissionParams, ApiError> {
        let mut v = Validator::default();
        v.required("name", &self.name);
        v.required("codename", &self.codename);
        self.check(&mut v);
        v.finish()?;

        Ok(CreatePermissionParams {
            name: self.name.unwrap_or_default(),
            codename: self.codename.unwrap_or_default(),
            category: CATALOG_CATEGORY.to_string(),
        })
    }

    pub fn validate_update(self) -> Result<UpdatePermissionParams, ApiError> {
        let mut v = Validator::default();
        self.check(&mut v);
        v.finish()?;

        Ok(UpdatePermissionParams {
            name: self.name,
            codename: self.codename,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct PermissionResponse {
    pub id: i64,
    pub name: String,
    pub codename: String,
    pub category: String,
}

impl From<Permission> for PermissionResponse {
    fn from(p: Permission) -> Self {
        PermissionResponse {
            id: p.id.0,
            name: p.name,
            codename: p.codename,
            category: p.category,
        }
    }
}

// ───────────────────────────────────── Projects ───────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ProjectWrite {
    pub name: Option<String>,
}

impl ProjectWrite {
    pub fn validate_create(self) -> Result<CreateProjectParams, ApiError> {
        let mut v = Validator::default();
        if let Some(name) = v.required("name", &self.name) {
            v.text("name", name, PROJECT_NAME_MAX);
        }
        v.finish()?;

        Ok(CreateProjectParams {
            name: self.name.unwrap_or_default(),
        })
    }

    pub fn validate_update(self) -> Result<UpdateProjectParams, ApiError> {
        let mut v = Validator::default();
        if let Some(name) = &self.name {
            v.text("name", name, PROJECT_NAME_MAX);
        }
        v.finish()?;

        Ok(UpdateProjectParams { name: self.name })
    }
}

/// `YYYY-MM-DD HH:MM:SS`, UTC.
mod plain_datetime {
    use chrono::{DateTime, Utc};
    use serde::Serializer;

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&dt.format(FORMAT))
    }
}

#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    pub id: i64,
    pub name: String,
    /// Id of the group created alongside the project.
    pub group: i64,
    #[serde(with = "plain_datetime")]
    pub create_time: DateTime<Utc>,
    #[serde(with = "plain_datetime")]
    pub update_time: DateTime<Utc>,
}

impl From<Project> for ProjectResponse {
    fn from(p: Project) -> Self {
        ProjectResponse {
            id: p.id.0,
            name: p.name,
            group: p.group_id.0,
            create_time: p.create_time,
            update_time: p.update_time,
        }
    }
}
