//! Comment model and database operations
//!
//! Comments belong to a task and are hard-deleted. Editing a comment marks
//! it `is_edited`.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE task_comments (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
//!     user_id UUID NOT NULL REFERENCES users(id),
//!     content TEXT NOT NULL,
//!     is_edited BOOLEAN NOT NULL DEFAULT FALSE,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Task comment
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    /// Unique comment ID
    pub id: Uuid,

    /// Task the comment belongs to
    pub task_id: Uuid,

    /// Comment author
    pub user_id: Uuid,

    /// Comment body (markdown)
    pub content: String,

    /// Set once the author has edited the comment
    pub is_edited: bool,

    /// When the comment was created
    pub created_at: DateTime<Utc>,

    /// When the comment was last updated
    pub updated_at: DateTime<Utc>,
}

/// Fields that may change on a comment update
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateComment {
    pub content: Option<String>,
}

const COMMENT_COLUMNS: &str = "id, task_id, user_id, content, is_edited, created_at, updated_at";

impl Comment {
    /// Creates a comment on a task
    pub async fn create(
        pool: &PgPool,
        task_id: Uuid,
        user_id: Uuid,
        content: String,
    ) -> Result<Self, sqlx::Error> {
        let comment = sqlx::query_as::<_, Comment>(&format!(
            r#"
            INSERT INTO task_comments (task_id, user_id, content)
            VALUES ($1, $2, $3)
            RETURNING {COMMENT_COLUMNS}
            "#
        ))
        .bind(task_id)
        .bind(user_id)
        .bind(content)
        .fetch_one(pool)
        .await?;

        Ok(comment)
    }

    /// Finds a comment by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let comment = sqlx::query_as::<_, Comment>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM task_comments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(comment)
    }

    /// Lists a task's comments, oldest first
    pub async fn list_for_task(pool: &PgPool, task_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let comments = sqlx::query_as::<_, Comment>(&format!(
            r#"
            SELECT {COMMENT_COLUMNS} FROM task_comments
            WHERE task_id = $1
            ORDER BY created_at ASC
            "#
        ))
        .bind(task_id)
        .fetch_all(pool)
        .await?;

        Ok(comments)
    }

    /// Applies an update to this comment in memory
    ///
    /// Changing the content marks the comment as edited.
    pub fn apply(&mut self, update: UpdateComment) {
        if let Some(content) = update.content {
            self.content = content;
            self.is_edited = true;
        }
    }

    /// Writes the mutable fields of this comment back to the database
    pub async fn persist(&self, pool: &PgPool) -> Result<Self, sqlx::Error> {
        let comment = sqlx::query_as::<_, Comment>(&format!(
            r#"
            UPDATE task_comments
            SET content = $2, is_edited = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {COMMENT_COLUMNS}
            "#
        ))
        .bind(self.id)
        .bind(&self.content)
        .bind(self.is_edited)
        .fetch_one(pool)
        .await?;

        Ok(comment)
    }

    /// Deletes a comment (hard delete)
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM task_comments WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_marks_edited() {
        let mut comment = Comment {
            id: Uuid::new_v4(),
            task_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            content: "first draft".to_string(),
            is_edited: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        comment.apply(UpdateComment {
            content: Some("second draft".to_string()),
        });

        assert_eq!(comment.content, "second draft");
        assert!(comment.is_edited);
    }

    #[test]
    fn test_apply_without_content_is_noop() {
        let mut comment = Comment {
            id: Uuid::new_v4(),
            task_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            content: "unchanged".to_string(),
            is_edited: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        comment.apply(UpdateComment::default());

        assert_eq!(comment.content, "unchanged");
        assert!(!comment.is_edited);
    }
}
