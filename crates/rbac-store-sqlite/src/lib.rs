mod associations;
mod bootstrap;
mod error;

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rbac_storage::{
    ControllableAction, CreateGroupParams, CreatePermissionParams, CreateProjectParams,
    CreateUserParams, Group, GroupId, Permission, PermissionId, Project, ProjectId, Store,
    StoreError, UpdateGroupParams, UpdatePermissionParams, UpdateProjectParams, UpdateUserParams,
    User, UserId, CATALOG_CATEGORY,
};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    SqlitePool,
};

use crate::error::map_db_err;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// How long a writer waits for another connection's write lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const USER_COLUMNS: &str = "id, username, password, email, first_name, last_name, \
     is_active, is_staff, is_superuser, date_joined, last_login";

pub struct SqliteStore {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    password: String,
    email: String,
    first_name: String,
    last_name: String,
    is_active: bool,
    is_staff: bool,
    is_superuser: bool,
    date_joined: DateTime<Utc>,
    last_login: Option<DateTime<Utc>>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: UserId(row.id),
            username: row.username,
            password_hash: row.password,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            is_active: row.is_active,
            is_staff: row.is_staff,
            is_superuser: row.is_superuser,
            date_joined: row.date_joined,
            last_login: row.last_login,
        }
    }
}

fn group_from_row((id, name): (i64, String)) -> Group {
    Group {
        id: GroupId(id),
        name,
    }
}

type PermissionRow = (i64, String, String, String);

fn permission_from_row((id, name, codename, category): PermissionRow) -> Permission {
    Permission {
        id: PermissionId(id),
        name,
        codename,
        category,
    }
}

type ProjectRow = (i64, String, i64, DateTime<Utc>, DateTime<Utc>);

fn project_from_row((id, name, group_id, create_time, update_time): ProjectRow) -> Project {
    Project {
        id: ProjectId(id),
        name,
        group_id: GroupId(group_id),
        create_time,
        update_time,
    }
}

impl SqliteStore {
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        // The database lives and dies with its only connection.
        let pool_options = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
        Self::connect(options, pool_options).await
    }

    /// Open (or create, with `?mode=rwc`) the database at `url`.
    pub async fn open(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let options = options
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);
        let pool_options = SqlitePoolOptions::new().max_connections(max_connections);
        Self::connect(options, pool_options).await
    }

    /// Connect, run migrations and seed the permission catalog.
    async fn connect(
        options: SqliteConnectOptions,
        pool_options: SqlitePoolOptions,
    ) -> Result<Self, StoreError> {
        let pool = pool_options
            .connect_with(options.foreign_keys(true))
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        MIGRATOR
            .run(&pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let store = Self { pool };
        store.seed_catalog().await?;
        Ok(store)
    }

    /// Insert any catalog action that is missing. Existing rows (including
    /// relabelled ones) are left alone.
    async fn seed_catalog(&self) -> Result<(), StoreError> {
        let mut inserted = 0u64;
        for action in ControllableAction::ALL {
            inserted += sqlx::query(
                "INSERT OR IGNORE INTO rbac_permissions(name, codename, category) VALUES(?, ?, ?)",
            )
            .bind(action.label())
            .bind(action.codename())
            .bind(CATALOG_CATEGORY)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?
            .rows_affected();
        }
        tracing::debug!(inserted, "permission catalog seeded");
        Ok(())
    }

    async fn ensure_user(&self, user_id: &UserId) -> Result<(), StoreError> {
        sqlx::query_as::<_, (i64,)>("SELECT id FROM rbac_users WHERE id = ?")
            .bind(user_id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)?
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn ensure_group(&self, group_id: &GroupId) -> Result<(), StoreError> {
        sqlx::query_as::<_, (i64,)>("SELECT id FROM rbac_groups WHERE id = ?")
            .bind(group_id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)?
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}

#[async_trait::async_trait]
impl Store for SqliteStore {
    // ───────────────────────────── Users ─────────────────────────────

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM rbac_users ORDER BY id DESC");
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn create_user(&self, params: &CreateUserParams) -> Result<UserId, StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_db_err)?;

        let id = sqlx::query(
            "INSERT INTO rbac_users(username, password, email, first_name, last_name,
                                    is_active, is_staff, is_superuser, date_joined)
             VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&params.username)
        .bind(&params.password_hash)
        .bind(&params.email)
        .bind(&params.first_name)
        .bind(&params.last_name)
        .bind(params.is_active)
        .bind(params.is_staff)
        .bind(params.is_superuser)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(map_db_err)?
        .last_insert_rowid();
        let user_id = UserId(id);

        if let Some(group_ids) = &params.group_ids {
            associations::replace_user_groups(&mut tx, &user_id, group_ids).await?;
        }

        tx.commit().await.map_err(map_db_err)?;
        Ok(user_id)
    }

    async fn get_user(&self, user_id: &UserId) -> Result<User, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM rbac_users WHERE id = ?");
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(user_id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)?
            .map(User::from)
            .ok_or(StoreError::NotFound)
    }

    async fn update_user(
        &self,
        user_id: &UserId,
        params: &UpdateUserParams,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_db_err)?;

        let result = sqlx::query(
            "UPDATE rbac_users SET
                 username     = COALESCE(?, username),
                 password     = COALESCE(?, password),
                 email        = COALESCE(?, email),
                 first_name   = COALESCE(?, first_name),
                 last_name    = COALESCE(?, last_name),
                 is_active    = COALESCE(?, is_active),
                 is_staff     = COALESCE(?, is_staff),
                 is_superuser = COALESCE(?, is_superuser),
                 last_login   = COALESCE(?, last_login)
             WHERE id = ?",
        )
        .bind(params.username.as_deref())
        .bind(params.password_hash.as_deref())
        .bind(params.email.as_deref())
        .bind(params.first_name.as_deref())
        .bind(params.last_name.as_deref())
        .bind(params.is_active)
        .bind(params.is_staff)
        .bind(params.is_superuser)
        .bind(params.last_login)
        .bind(user_id.0)
        .execute(&mut *tx)
        .await
        .map_err(map_db_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        if let Some(group_ids) = &params.group_ids {
            associations::replace_user_groups(&mut tx, user_id, group_ids).await?;
        }

        tx.commit().await.map_err(map_db_err)?;
        Ok(())
    }

    async fn delete_user(&self, user_id: &UserId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM rbac_users WHERE id = ?")
            .bind(user_id.0)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(())
    }

    async fn list_user_groups(&self, user_id: &UserId) -> Result<Vec<Group>, StoreError> {
        self.ensure_user(user_id).await?;

        let rows = sqlx::query_as::<_, (i64, String)>(
            "SELECT g.id, g.name
               FROM rbac_groups g
               JOIN rbac_user_groups ug ON ug.group_id = g.id
              WHERE ug.user_id = ?
              ORDER BY g.id",
        )
        .bind(user_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;

        Ok(rows.into_iter().map(group_from_row).collect())
    }

    async fn set_user_groups(
        &self,
        user_id: &UserId,
        group_ids: &[GroupId],
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_db_err)?;
        associations::replace_user_groups(&mut tx, user_id, group_ids).await?;
        tx.commit().await.map_err(map_db_err)?;
        Ok(())
    }

    // ───────────────────────────── Groups ────────────────────────────

    async fn list_groups(&self) -> Result<Vec<Group>, StoreError> {
        let rows =
            sqlx::query_as::<_, (i64, String)>("SELECT id, name FROM rbac_groups ORDER BY id DESC")
                .fetch_all(&self.pool)
                .await
                .map_err(map_db_err)?;
        Ok(rows.into_iter().map(group_from_row).collect())
    }

    async fn create_group(&self, params: &CreateGroupParams) -> Result<GroupId, StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_db_err)?;

        let id = sqlx::query("INSERT INTO rbac_groups(name) VALUES(?)")
            .bind(&params.name)
            .execute(&mut *tx)
            .await
            .map_err(map_db_err)?
            .last_insert_rowid();
        let group_id = GroupId(id);

        if let Some(permission_ids) = &params.permission_ids {
            associations::replace_group_permissions(&mut tx, &group_id, permission_ids).await?;
        }

        tx.commit().await.map_err(map_db_err)?;
        Ok(group_id)
    }

    async fn get_group(&self, group_id: &GroupId) -> Result<Group, StoreError> {
        sqlx::query_as::<_, (i64, String)>("SELECT id, name FROM rbac_groups WHERE id = ?")
            .bind(group_id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)?
            .map(group_from_row)
            .ok_or(StoreError::NotFound)
    }

    async fn update_group(
        &self,
        group_id: &GroupId,
        params: &UpdateGroupParams,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_db_err)?;

        let result = sqlx::query("UPDATE rbac_groups SET name = COALESCE(?, name) WHERE id = ?")
            .bind(params.name.as_deref())
            .bind(group_id.0)
            .execute(&mut *tx)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        // A bootstrap group is renamed only through its project.
        if let Some(name) = params.name.as_deref() {
            let owner: Option<(i64,)> = sqlx::query_as(
                "SELECT id FROM rbac_projects WHERE group_id = ? AND name <> ?",
            )
            .bind(group_id.0)
            .bind(name)
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_db_err)?;
            if let Some((project_id,)) = owner {
                return Err(StoreError::Conflict(format!(
                    "group is owned by project {project_id}; rename the project instead"
                )));
            }
        }

        if let Some(permission_ids) = &params.permission_ids {
            associations::replace_group_permissions(&mut tx, group_id, permission_ids).await?;
        }

        tx.commit().await.map_err(map_db_err)?;
        Ok(())
    }

    async fn delete_group(&self, group_id: &GroupId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM rbac_groups WHERE id = ?")
            .bind(group_id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| match map_db_err(e) {
                StoreError::Conflict(_) => {
                    StoreError::Conflict("group is owned by a project".to_string())
                }
                other => other,
            })?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(())
    }

    async fn list_group_permissions(
        &self,
        group_id: &GroupId,
    ) -> Result<Vec<Permission>, StoreError> {
        self.ensure_group(group_id).await?;

        let rows = sqlx::query_as::<_, PermissionRow>(
            "SELECT p.id, p.name, p.codename, p.category
               FROM rbac_permissions p
               JOIN rbac_group_permissions gp ON gp.permission_id = p.id
              WHERE gp.group_id = ?
              ORDER BY p.id",
        )
        .bind(group_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;

        Ok(rows.into_iter().map(permission_from_row).collect())
    }

    async fn set_group_permissions(
        &self,
        group_id: &GroupId,
        permission_ids: &[PermissionId],
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_db_err)?;
        associations::replace_group_permissions(&mut tx, group_id, permission_ids).await?;
        tx.commit().await.map_err(map_db_err)?;
        Ok(())
    }

    // ──────────────────────────── Permissions ────────────────────────

    async fn list_permissions(&self) -> Result<Vec<Permission>, StoreError> {
        let rows = sqlx::query_as::<_, PermissionRow>(
            "SELECT id, name, codename, category FROM rbac_permissions
              WHERE category = ?
              ORDER BY id DESC",
        )
        .bind(CATALOG_CATEGORY)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;

        Ok(rows.into_iter().map(permission_from_row).collect())
    }

    async fn create_permission(
        &self,
        params: &CreatePermissionParams,
    ) -> Result<PermissionId, StoreError> {
        let id = sqlx::query(
            "INSERT INTO rbac_permissions(name, codename, category) VALUES(?, ?, ?)",
        )
        .bind(&params.name)
        .bind(&params.codename)
        .bind(&params.category)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?
        .last_insert_rowid();
        Ok(PermissionId(id))
    }

    async fn get_permission(
        &self,
        permission_id: &PermissionId,
    ) -> Result<Permission, StoreError> {
        sqlx::query_as::<_, PermissionRow>(
            "SELECT id, name, codename, category FROM rbac_permissions
              WHERE id = ? AND category = ?",
        )
        .bind(permission_id.0)
        .bind(CATALOG_CATEGORY)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?
        .map(permission_from_row)
        .ok_or(StoreError::NotFound)
    }

    async fn update_permission(
        &self,
        permission_id: &PermissionId,
        params: &UpdatePermissionParams,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE rbac_permissions
                SET name = COALESCE(?, name), codename = COALESCE(?, codename)
              WHERE id = ? AND category = ?",
        )
        .bind(params.name.as_deref())
        .bind(params.codename.as_deref())
        .bind(permission_id.0)
        .bind(CATALOG_CATEGORY)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(())
    }

    async fn delete_permission(&self, permission_id: &PermissionId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM rbac_permissions WHERE id = ? AND category = ?")
            .bind(permission_id.0)
            .bind(CATALOG_CATEGORY)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(())
    }

    // ───────────────────────────── Projects ──────────────────────────

    async fn list_projects(&self) -> Result<Vec<Project>, StoreError> {
        let rows = sqlx::query_as::<_, ProjectRow>(
            "SELECT id, name, group_id, create_time, update_time
               FROM rbac_projects
              ORDER BY id DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;

        Ok(rows.into_iter().map(project_from_row).collect())
    }

    async fn create_project(&self, params: &CreateProjectParams) -> Result<Project, StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_db_err)?;
        let project = bootstrap::create_project_with_group(&mut tx, &params.name).await?;
        tx.commit().await.map_err(map_db_err)?;
        Ok(project)
    }

    async fn get_project(&self, project_id: &ProjectId) -> Result<Project, StoreError> {
        sqlx::query_as::<_, ProjectRow>(
            "SELECT id, name, group_id, create_time, update_time FROM rbac_projects WHERE id = ?",
        )
        .bind(project_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?
        .map(project_from_row)
        .ok_or(StoreError::NotFound)
    }

    async fn update_project(
        &self,
        project_id: &ProjectId,
        params: &UpdateProjectParams,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_db_err)?;
        bootstrap::update_project_and_group(&mut tx, project_id, params.name.as_deref()).await?;
        tx.commit().await.map_err(map_db_err)?;
        Ok(())
    }

    async fn delete_project(&self, project_id: &ProjectId) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_db_err)?;
        bootstrap::delete_project_and_group(&mut tx, project_id).await?;
        tx.commit().await.map_err(map_db_err)?;
        Ok(())
    }
}
