//! Project model and database operations
//!
//! Projects are soft-deleted: archiving sets `is_archived` and removes the
//! project from listings. Creation is transactional: the project row and
//! the creator's owner membership persist together or not at all.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE projects (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     name VARCHAR(200) NOT NULL,
//!     description TEXT,
//!     color VARCHAR(7) NOT NULL DEFAULT '#3498db',
//!     owner_id UUID NOT NULL REFERENCES users(id),
//!     is_archived BOOLEAN NOT NULL DEFAULT FALSE,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::membership::ProjectRole;

/// Project model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    /// Unique project ID
    pub id: Uuid,

    /// Project name
    pub name: String,

    /// Optional description
    pub description: Option<String>,

    /// Display color (hex)
    pub color: String,

    /// User who created the project
    pub owner_id: Uuid,

    /// Soft-delete flag
    pub is_archived: bool,

    /// When the project was created
    pub created_at: DateTime<Utc>,

    /// When the project was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a project
#[derive(Debug, Clone)]
pub struct CreateProject {
    pub name: String,
    pub description: Option<String>,
    pub color: String,
}

/// Fields that may change on a project update
///
/// Archiving is not part of the update surface; it has its own stricter
/// permission rule and goes through [`Project::archive`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
}

const PROJECT_COLUMNS: &str =
    "id, name, description, color, owner_id, is_archived, created_at, updated_at";

impl Project {
    /// Creates a project together with the creator's owner membership
    ///
    /// Both inserts run in a single transaction: a project without an owner
    /// membership (or the reverse) is never observable.
    pub async fn create_with_owner(
        pool: &PgPool,
        data: CreateProject,
        owner_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let project = sqlx::query_as::<_, Project>(&format!(
            r#"
            INSERT INTO projects (name, description, color, owner_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(data.name)
        .bind(data.description)
        .bind(data.color)
        .bind(owner_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO project_members (project_id, user_id, role)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(project.id)
        .bind(owner_id)
        .bind(ProjectRole::Owner)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(project)
    }

    /// Finds a project by ID (archived projects included)
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(project)
    }

    /// Lists the non-archived projects a user is a member of
    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let projects = sqlx::query_as::<_, Project>(
            r#"
            SELECT p.id, p.name, p.description, p.color, p.owner_id, p.is_archived,
                   p.created_at, p.updated_at
            FROM projects p
            JOIN project_members m ON m.project_id = p.id
            WHERE m.user_id = $1 AND p.is_archived = FALSE
            ORDER BY p.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(projects)
    }

    /// Applies an update to this project in memory
    pub fn apply(&mut self, update: UpdateProject) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = Some(description);
        }
        if let Some(color) = update.color {
            self.color = color;
        }
    }

    /// Writes the mutable fields of this project back to the database
    pub async fn persist(&self, pool: &PgPool) -> Result<Self, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(&format!(
            r#"
            UPDATE projects
            SET name = $2, description = $3, color = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(self.id)
        .bind(&self.name)
        .bind(&self.description)
        .bind(&self.color)
        .fetch_one(pool)
        .await?;

        Ok(project)
    }

    /// Archives a project (soft delete)
    ///
    /// Returns false if the project doesn't exist.
    pub async fn archive(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE projects SET is_archived = TRUE, updated_at = NOW() WHERE id = $1",
        )
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
    fn test_apply_update() {
        let mut project = Project {
            id: Uuid::new_v4(),
            name: "Alpha".to_string(),
            description: None,
            color: "#3498db".to_string(),
            owner_id: Uuid::new_v4(),
            is_archived: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        project.apply(UpdateProject {
            name: Some("Beta".to_string()),
            description: Some("renamed".to_string()),
            color: None,
        });

        assert_eq!(project.name, "Beta");
        assert_eq!(project.description.as_deref(), Some("renamed"));
        assert_eq!(project.color, "#3498db");
        assert!(!project.is_archived);
    }
}
