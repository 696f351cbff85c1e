//! Tag model, task-tag assignments, and the tag delete guard
//!
//! Tags are either project-scoped or global (`project_id IS NULL`); the
//! (name, project_id) pair is unique per scope, with NULL forming its own
//! scope distinct from any project. Tags are hard-deleted, but deletion is
//! blocked while any task still references the tag.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE tags (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     name VARCHAR(50) NOT NULL,
//!     color VARCHAR(7) NOT NULL DEFAULT '#95a5a6',
//!     project_id UUID REFERENCES projects(id),
//!     created_by UUID NOT NULL REFERENCES users(id),
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! -- NULL-scope aware uniqueness
//! CREATE UNIQUE INDEX tags_name_project_idx
//!     ON tags (name, COALESCE(project_id, '00000000-0000-0000-0000-000000000000'));
//!
//! CREATE TABLE task_tags (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
//!     tag_id UUID NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     UNIQUE (task_id, tag_id)
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Error from [`Tag::delete`]
#[derive(Debug, thiserror::Error)]
pub enum TagDeleteError {
    /// The tag is still assigned to tasks and cannot be deleted
    #[error("Tag is being used by {count} task(s). Cannot delete.")]
    InUse { count: i64 },

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Tag model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tag {
    /// Unique tag ID
    pub id: Uuid,

    /// Tag name, unique within its scope
    pub name: String,

    /// Display color (hex)
    pub color: String,

    /// Owning project; None = global tag
    pub project_id: Option<Uuid>,

    /// User who created the tag
    pub created_by: Uuid,

    /// When the tag was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a tag
#[derive(Debug, Clone)]
pub struct CreateTag {
    pub name: String,
    pub color: String,
    pub project_id: Option<Uuid>,
    pub created_by: Uuid,
}

/// Fields that may change on a tag update
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTag {
    pub name: Option<String>,
    pub color: Option<String>,
}

const TAG_COLUMNS: &str = "id, name, color, project_id, created_by, created_at";

impl Tag {
    /// Creates a tag
    ///
    /// Callers pre-check scope uniqueness via [`Tag::exists_in_scope`] for a
    /// friendly message; the unique index remains the authoritative guard
    /// under concurrency.
    pub async fn create(pool: &PgPool, data: CreateTag) -> Result<Self, sqlx::Error> {
        let tag = sqlx::query_as::<_, Tag>(&format!(
            r#"
            INSERT INTO tags (name, color, project_id, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING {TAG_COLUMNS}
            "#
        ))
        .bind(data.name)
        .bind(data.color)
        .bind(data.project_id)
        .bind(data.created_by)
        .fetch_one(pool)
        .await?;

        Ok(tag)
    }

    /// Finds a tag by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let tag = sqlx::query_as::<_, Tag>(&format!(
            "SELECT {TAG_COLUMNS} FROM tags WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(tag)
    }

    /// Checks whether a tag with this name already exists in the given scope
    ///
    /// NULL project_id is the global scope, distinct from every project.
    pub async fn exists_in_scope(
        pool: &PgPool,
        name: &str,
        project_id: Option<Uuid>,
    ) -> Result<bool, sqlx::Error> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM tags
                WHERE name = $1 AND project_id IS NOT DISTINCT FROM $2
            )
            "#,
        )
        .bind(name)
        .bind(project_id)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    /// Lists tags visible within one project: its own tags plus global tags
    pub async fn list_for_project(pool: &PgPool, project_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let tags = sqlx::query_as::<_, Tag>(&format!(
            r#"
            SELECT {TAG_COLUMNS} FROM tags
            WHERE project_id = $1 OR project_id IS NULL
            ORDER BY name ASC
            "#
        ))
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        Ok(tags)
    }

    /// Lists tags across all of a user's projects plus global tags
    pub async fn list_accessible(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let tags = sqlx::query_as::<_, Tag>(&format!(
            r#"
            SELECT {TAG_COLUMNS} FROM tags
            WHERE project_id IN (SELECT project_id FROM project_members WHERE user_id = $1)
               OR project_id IS NULL
            ORDER BY name ASC
            "#
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(tags)
    }

    /// Applies an update to this tag in memory
    pub fn apply(&mut self, update: UpdateTag) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(color) = update.color {
            self.color = color;
        }
    }

    /// Writes the mutable fields of this tag back to the database
    pub async fn persist(&self, pool: &PgPool) -> Result<Self, sqlx::Error> {
        let tag = sqlx::query_as::<_, Tag>(&format!(
            r#"
            UPDATE tags
            SET name = $2, color = $3
            WHERE id = $1
            RETURNING {TAG_COLUMNS}
            "#
        ))
        .bind(self.id)
        .bind(&self.name)
        .bind(&self.color)
        .fetch_one(pool)
        .await?;

        Ok(tag)
    }

    /// Deletes a tag, refusing while any task still references it
    ///
    /// The reference count and the delete run in one transaction, so a
    /// refused delete leaves both the tag and its assignments untouched.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), TagDeleteError> {
        let mut tx = pool.begin().await?;

        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM task_tags WHERE tag_id = $1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

        if count > 0 {
            return Err(TagDeleteError::InUse { count });
        }

        sqlx::query("DELETE FROM tags WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

/// Assignment of a tag to a task
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskTag {
    /// Unique assignment ID
    pub id: Uuid,

    /// Tagged task
    pub task_id: Uuid,

    /// Assigned tag
    pub tag_id: Uuid,

    /// When the assignment was created
    pub created_at: DateTime<Utc>,
}

impl TaskTag {
    /// Assigns a tag to a task
    ///
    /// # Errors
    ///
    /// Returns an error if the pair already exists (unique constraint).
    pub async fn create(pool: &PgPool, task_id: Uuid, tag_id: Uuid) -> Result<Self, sqlx::Error> {
        let task_tag = sqlx::query_as::<_, TaskTag>(
            r#"
            INSERT INTO task_tags (task_id, tag_id)
            VALUES ($1, $2)
            RETURNING id, task_id, tag_id, created_at
            "#,
        )
        .bind(task_id)
        .bind(tag_id)
        .fetch_one(pool)
        .await?;

        Ok(task_tag)
    }

    /// Removes a tag from a task
    ///
    /// Returns false if the assignment didn't exist.
    pub async fn delete(pool: &PgPool, task_id: Uuid, tag_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM task_tags WHERE task_id = $1 AND tag_id = $2")
            .bind(task_id)
            .bind(tag_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts how many tasks reference a tag
    pub async fn count_for_tag(pool: &PgPool, tag_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM task_tags WHERE tag_id = $1")
                .bind(tag_id)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }

    /// Lists the tags assigned to a task, by name
    pub async fn list_tags_for_task(pool: &PgPool, task_id: Uuid) -> Result<Vec<Tag>, sqlx::Error> {
        let tags = sqlx::query_as::<_, Tag>(
            r#"
            SELECT t.id, t.name, t.color, t.project_id, t.created_by, t.created_at
            FROM tags t
            JOIN task_tags tt ON tt.tag_id = t.id
            WHERE tt.task_id = $1
            ORDER BY t.name ASC
            "#,
        )
        .bind(task_id)
        .fetch_all(pool)
        .await?;

        Ok(tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_update() {
        let mut tag = Tag {
            id: Uuid::new_v4(),
            name: "bug".to_string(),
            color: "#95a5a6".to_string(),
            project_id: None,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
        };

        tag.apply(UpdateTag {
            name: Some("defect".to_string()),
            color: None,
        });

        assert_eq!(tag.name, "defect");
        assert_eq!(tag.color, "#95a5a6");
    }

    #[test]
    fn test_in_use_error_message_includes_count() {
        let err = TagDeleteError::InUse { count: 3 };
        assert_eq!(err.to_string(), "Tag is being used by 3 task(s). Cannot delete.");
    }
}
