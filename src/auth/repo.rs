use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::scope::{AdminScope, Permissions, GENERAL_GROUP};

pub const ROLE_USER: &str = "user";
pub const ROLE_ADMIN: &str = "admin";

const USER_COLUMNS: &str =
    "id, name, email, password_hash, role, admin_group, permissions, created_at";

/// User record. Self-registration always produces role `user`; admins only
/// enter through the startup seeding path.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub admin_group: Option<String>,
    #[serde(skip_serializing)]
    pub permissions: Option<serde_json::Value>,
    pub created_at: OffsetDateTime,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }

    /// Scope derived from the stored group and permissions. The `general`
    /// umbrella group is unrestricted; any other admin is limited to the
    /// stored permission lists (absent permissions mean an empty scope).
    pub fn scope(&self) -> AdminScope {
        if self.admin_group.as_deref() == Some(GENERAL_GROUP) {
            return AdminScope::Unrestricted;
        }
        let permissions = self
            .permissions
            .as_ref()
            .and_then(|v| serde_json::from_value::<Permissions>(v.clone()).ok())
            .unwrap_or_default();
        AdminScope::Limited(permissions)
    }

    /// Case-insensitive email lookup.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)"
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Insert a new user. The unique index on LOWER(email) backs the
    /// duplicate check under concurrent registration.
    pub async fn create(
        db: &PgPool,
        name: &str,
        email: &str,
        password_hash: &str,
        role: &str,
        admin_group: Option<&str>,
        permissions: Option<&Permissions>,
    ) -> anyhow::Result<User> {
        let permissions_json = permissions
            .map(serde_json::to_value)
            .transpose()
            .map_err(anyhow::Error::from)?;
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (name, email, password_hash, role, admin_group, permissions)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .bind(admin_group)
        .bind(permissions_json)
        .fetch_one(db)
        .await?;
        Ok(user)
    }
}

/// True when the error is a unique-constraint violation, e.g. two
/// registrations racing on the same email.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .map(|db| db.code().as_deref() == Some("23505"))
        .unwrap_or(false)
}
