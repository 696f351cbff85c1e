//! User model and database operations
//!
//! Users register with a unique login_id and email. Accounts are never
//! hard-deleted. Passwords are stored as Argon2id hashes, never in
//! plaintext.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE users (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     name VARCHAR(100) NOT NULL,
//!     login_id VARCHAR(50) NOT NULL UNIQUE,
//!     email VARCHAR(255) NOT NULL UNIQUE,
//!     password_hash TEXT NOT NULL,
//!     avatar_url VARCHAR(500),
//!     timezone VARCHAR(50) NOT NULL DEFAULT 'Asia/Tokyo',
//!     notification_enabled BOOLEAN NOT NULL DEFAULT TRUE,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// User account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Login identifier, unique across all users
    pub login_id: String,

    /// Email address, unique across all users
    pub email: String,

    /// Argon2id password hash
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Optional avatar URL
    pub avatar_url: Option<String>,

    /// IANA timezone name
    pub timezone: String,

    /// Whether the user wants notifications
    pub notification_enabled: bool,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub login_id: String,
    pub email: String,
    /// Argon2id password hash (NOT the plaintext password)
    pub password_hash: String,
    pub timezone: String,
    pub notification_enabled: bool,
}

/// Fields a user may change on their own profile
///
/// Absent fields are left unchanged; the merge is explicit, field by field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub timezone: Option<String>,
    pub notification_enabled: Option<bool>,
}

const USER_COLUMNS: &str = "id, name, login_id, email, password_hash, avatar_url, \
                            timezone, notification_enabled, created_at, updated_at";

impl User {
    /// Creates a new user
    ///
    /// # Errors
    ///
    /// Returns a database error on duplicate login_id or email (the unique
    /// constraints are the authoritative guard against concurrent
    /// registration races).
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (name, login_id, email, password_hash, timezone, notification_enabled)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(data.name)
        .bind(data.login_id)
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.timezone)
        .bind(data.notification_enabled)
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

    /// Finds a user by login_id (used for authentication)
    pub async fn find_by_login_id(pool: &PgPool, login_id: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE login_id = $1"
        ))
        .bind(login_id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Checks whether an email is already used by a different user
    pub async fn email_taken(
        pool: &PgPool,
        email: &str,
        exclude_user: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 AND id != $2)",
        )
        .bind(email)
        .bind(exclude_user)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    /// Applies an update to this user in memory
    ///
    /// Only provided fields change. Persist with [`User::persist`].
    pub fn apply(&mut self, update: UpdateUser) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(email) = update.email {
            self.email = email;
        }
        if let Some(avatar_url) = update.avatar_url {
            self.avatar_url = Some(avatar_url);
        }
        if let Some(timezone) = update.timezone {
            self.timezone = timezone;
        }
        if let Some(enabled) = update.notification_enabled {
            self.notification_enabled = enabled;
        }
    }

    /// Writes the mutable fields of this user back to the database
    ///
    /// Returns the stored row with its refreshed `updated_at`.
    pub async fn persist(&self, pool: &PgPool) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET name = $2, email = $3, avatar_url = $4, timezone = $5,
                notification_enabled = $6, updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(self.id)
        .bind(&self.name)
        .bind(&self.email)
        .bind(&self.avatar_url)
        .bind(&self.timezone)
        .bind(self.notification_enabled)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            name: "Test User".to_string(),
            login_id: "tester".to_string(),
            email: "test@example.com".to_string(),
            password_hash: "hash".to_string(),
            avatar_url: None,
            timezone: "Asia/Tokyo".to_string(),
            notification_enabled: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_apply_partial_update() {
        let mut user = sample_user();

        user.apply(UpdateUser {
            name: Some("Renamed".to_string()),
            notification_enabled: Some(false),
            ..Default::default()
        });

        assert_eq!(user.name, "Renamed");
        assert!(!user.notification_enabled);
        // untouched fields
        assert_eq!(user.email, "test@example.com");
        assert_eq!(user.timezone, "Asia/Tokyo");
    }

    #[test]
    fn test_apply_empty_update_is_noop() {
        let mut user = sample_user();
        let before = user.clone();

        user.apply(UpdateUser::default());

        assert_eq!(user.name, before.name);
        assert_eq!(user.email, before.email);
        assert_eq!(user.avatar_url, before.avatar_url);
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = sample_user();
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
    }
}
