//! Notification model and database operations
//!
//! Notifications are created by the API when something relevant happens to a
//! user (task assigned, comment added) and flipped to read by the user. Both
//! read operations are idempotent.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE notifications (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
//!     task_id UUID REFERENCES tasks(id) ON DELETE CASCADE,
//!     kind VARCHAR(50) NOT NULL,
//!     title VARCHAR(200) NOT NULL,
//!     message TEXT,
//!     is_read BOOLEAN NOT NULL DEFAULT FALSE,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Notification for a user
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    /// Unique notification ID
    pub id: Uuid,

    /// Recipient
    pub user_id: Uuid,

    /// Related task, if any
    pub task_id: Option<Uuid>,

    /// Notification kind, e.g. "task_assigned", "comment_added"
    pub kind: String,

    /// Short title
    pub title: String,

    /// Optional longer message
    pub message: Option<String>,

    /// Whether the user has read the notification
    pub is_read: bool,

    /// When the notification was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a notification
#[derive(Debug, Clone)]
pub struct CreateNotification {
    pub user_id: Uuid,
    pub task_id: Option<Uuid>,
    pub kind: String,
    pub title: String,
    pub message: Option<String>,
}

const NOTIFICATION_COLUMNS: &str =
    "id, user_id, task_id, kind, title, message, is_read, created_at";

impl Notification {
    /// Creates a notification
    pub async fn create(pool: &PgPool, data: CreateNotification) -> Result<Self, sqlx::Error> {
        let notification = sqlx::query_as::<_, Notification>(&format!(
            r#"
            INSERT INTO notifications (user_id, task_id, kind, title, message)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(data.user_id)
        .bind(data.task_id)
        .bind(data.kind)
        .bind(data.title)
        .bind(data.message)
        .fetch_one(pool)
        .await?;

        Ok(notification)
    }

    /// Lists a user's notifications, newest first
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: Uuid,
        unread_only: bool,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let mut sql = format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE user_id = $1"
        );
        if unread_only {
            sql.push_str(" AND is_read = FALSE");
        }
        sql.push_str(" ORDER BY created_at DESC");

        let notifications = sqlx::query_as::<_, Notification>(&sql)
            .bind(user_id)
            .fetch_all(pool)
            .await?;

        Ok(notifications)
    }

    /// Marks one notification as read, scoped to the acting user
    ///
    /// Idempotent: marking an already-read notification succeeds. Returns
    /// false only if no notification with this id belongs to the user.
    pub async fn mark_read(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Marks all of a user's unread notifications as read
    ///
    /// Only rows with `is_read = FALSE` are touched; returns how many were
    /// flipped.
    pub async fn mark_all_read(pool: &PgPool, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }
}
