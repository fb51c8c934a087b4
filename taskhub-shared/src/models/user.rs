/// User model and database operations
///
/// Users are the system's identities: a unique username and email, an
/// Argon2id password hash, a global role, and an active flag. The auth
/// middleware always re-fetches the live row, so role changes and
/// deactivation take effect immediately regardless of what any
/// still-valid token claims.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE global_role AS ENUM ('user', 'team_admin', 'app_admin');
///
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     username VARCHAR(80) NOT NULL UNIQUE,
///     email CITEXT NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     global_role global_role NOT NULL DEFAULT 'user',
///     active BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// System-wide privilege level
///
/// `AppAdmin` bypasses all membership checks. `TeamAdmin` carries no extra
/// privilege by itself; per-team authority comes from membership roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "global_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum GlobalRole {
    /// Ordinary account
    User,

    /// May administer teams they belong to (informational tier)
    TeamAdmin,

    /// Full access to every resource and the admin surface
    AppAdmin,
}

impl GlobalRole {
    /// Role name as stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            GlobalRole::User => "user",
            GlobalRole::TeamAdmin => "team_admin",
            GlobalRole::AppAdmin => "app_admin",
        }
    }

    /// Parses a role name, e.g. from a role-update request body
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(GlobalRole::User),
            "team_admin" => Some(GlobalRole::TeamAdmin),
            "app_admin" => Some(GlobalRole::AppAdmin),
            _ => None,
        }
    }
}

/// User model representing a registered account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Unique username
    pub username: String,

    /// Email address (case-insensitive via CITEXT), unique
    pub email: String,

    /// Argon2id password hash, never plaintext
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// System-wide role
    pub global_role: GlobalRole,

    /// Deactivated users are rejected at authentication time
    pub active: bool,

    /// When the account was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Unique username
    pub username: String,

    /// Unique email address
    pub email: String,

    /// Argon2id password hash (NOT the plaintext password)
    pub password_hash: String,
}

const USER_COLUMNS: &str = "id, username, email, password_hash, global_role, active, created_at";

impl User {
    /// Creates a new user with the default `user` role
    ///
    /// # Errors
    ///
    /// Returns an error if the username or email already exists (unique
    /// constraint violation) or the database is unreachable.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, username, email, password_hash, global_role, active, created_at
            "#,
        )
        .bind(data.username)
        .bind(data.email)
        .bind(data.password_hash)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by username
    pub async fn find_by_username(pool: &PgPool, username: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by email address (case-insensitive via CITEXT)
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Updates a user's global role
    ///
    /// Returns the updated user if found, None if the user doesn't exist.
    /// Previously issued tokens keep their stale role claim; authorization
    /// reads the live value, so the change is effective immediately.
    pub async fn update_global_role(
        pool: &PgPool,
        id: Uuid,
        role: GlobalRole,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET global_role = $2
            WHERE id = $1
            RETURNING id, username, email, password_hash, global_role, active, created_at
            "#,
        )
        .bind(id)
        .bind(role)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Activates or deactivates a user
    ///
    /// Returns true if the user was found and updated.
    pub async fn set_active(pool: &PgPool, id: Uuid, active: bool) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET active = $2 WHERE id = $1")
            .bind(id)
            .bind(active)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes a user by ID
    ///
    /// Memberships and comments cascade via foreign keys. Returns true if a
    /// row was deleted.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists all users, newest first
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"
        ))
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    /// Searches users by username or email substring
    ///
    /// The term is bound as a parameter, never interpolated into the query.
    pub async fn search(pool: &PgPool, term: &str) -> Result<Vec<Self>, sqlx::Error> {
        let pattern = format!("%{}%", term);
        let users = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS} FROM users
            WHERE username ILIKE $1 OR email ILIKE $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(pattern)
        .fetch_all(pool)
        .await?;

        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_role_round_trip() {
        for role in [GlobalRole::User, GlobalRole::TeamAdmin, GlobalRole::AppAdmin] {
            assert_eq!(GlobalRole::parse(role.as_str()), Some(role));
        }
        assert_eq!(GlobalRole::parse("superuser"), None);
        assert_eq!(GlobalRole::parse(""), None);
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            global_role: GlobalRole::User,
            active: true,
            created_at: Utc::now(),
        };

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("argon2id"));
        assert!(json.contains("alice"));
    }
}
