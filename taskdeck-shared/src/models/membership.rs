//! Project membership model and role definitions
//!
//! Users join projects through `project_members` rows carrying a role. The
//! role hierarchy is flat for permission purposes: owner and admin can
//! manage, member and viewer cannot; archiving a project is owner-only.
//!
//! # Schema
//!
//! ```sql
//! CREATE TYPE project_role AS ENUM ('owner', 'admin', 'member', 'viewer');
//!
//! CREATE TABLE project_members (
//!     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
//!     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
//!     role project_role NOT NULL DEFAULT 'member',
//!     joined_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     PRIMARY KEY (project_id, user_id)
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Role of a user within a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "project_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProjectRole {
    /// Project creator: everything, including archiving the project
    Owner,

    /// Can update the project and manage members
    Admin,

    /// Can work with tasks, comments, and attachments
    Member,

    /// Read access through membership; no elevated permissions
    Viewer,
}

impl ProjectRole {
    /// Converts role to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectRole::Owner => "owner",
            ProjectRole::Admin => "admin",
            ProjectRole::Member => "member",
            ProjectRole::Viewer => "viewer",
        }
    }

    /// Can update project settings and add members (owner or admin)
    pub fn can_manage_project(&self) -> bool {
        matches!(self, ProjectRole::Owner | ProjectRole::Admin)
    }

    /// Can archive the project (owner only)
    pub fn can_archive_project(&self) -> bool {
        matches!(self, ProjectRole::Owner)
    }

    /// Can act on resources created by others: archive any task, delete any
    /// comment or attachment, edit project-scoped tags (owner or admin)
    pub fn can_moderate(&self) -> bool {
        matches!(self, ProjectRole::Owner | ProjectRole::Admin)
    }

    /// Checks if this role meets the required role
    ///
    /// Hierarchy: Owner > Admin > Member > Viewer
    pub fn has_permission(&self, required: &ProjectRole) -> bool {
        self.permission_level() >= required.permission_level()
    }

    fn permission_level(&self) -> u8 {
        match self {
            ProjectRole::Owner => 4,
            ProjectRole::Admin => 3,
            ProjectRole::Member => 2,
            ProjectRole::Viewer => 1,
        }
    }
}

/// Membership row linking a user to a project with a role
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectMember {
    /// Project ID
    pub project_id: Uuid,

    /// User ID
    pub user_id: Uuid,

    /// Role within the project
    pub role: ProjectRole,

    /// When the membership was created
    pub joined_at: DateTime<Utc>,
}

/// Input for adding a member to a project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProjectMember {
    /// Project ID
    pub project_id: Uuid,

    /// User ID
    pub user_id: Uuid,

    /// Role to assign (defaults to Member)
    #[serde(default = "default_role")]
    pub role: ProjectRole,
}

fn default_role() -> ProjectRole {
    ProjectRole::Member
}

impl ProjectMember {
    /// Adds a user to a project
    ///
    /// # Errors
    ///
    /// Returns an error if the membership already exists (unique constraint)
    /// or the project/user doesn't exist (foreign key violation).
    pub async fn create(pool: &PgPool, data: CreateProjectMember) -> Result<Self, sqlx::Error> {
        let member = sqlx::query_as::<_, ProjectMember>(
            r#"
            INSERT INTO project_members (project_id, user_id, role)
            VALUES ($1, $2, $3)
            RETURNING project_id, user_id, role, joined_at
            "#,
        )
        .bind(data.project_id)
        .bind(data.user_id)
        .bind(data.role)
        .fetch_one(pool)
        .await?;

        Ok(member)
    }

    /// Finds a specific membership by project and user
    pub async fn find(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let member = sqlx::query_as::<_, ProjectMember>(
            r#"
            SELECT project_id, user_id, role, joined_at
            FROM project_members
            WHERE project_id = $1 AND user_id = $2
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(member)
    }

    /// Checks if a user is a member of a project (any role)
    pub async fn has_access(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM project_members
                WHERE project_id = $1 AND user_id = $2
            )
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    /// Gets a user's role in a project, None if not a member
    pub async fn get_role(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<ProjectRole>, sqlx::Error> {
        let role: Option<ProjectRole> = sqlx::query_scalar(
            r#"
            SELECT role FROM project_members
            WHERE project_id = $1 AND user_id = $2
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(role)
    }

    /// Lists all members of a project, oldest first
    pub async fn list_by_project(pool: &PgPool, project_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let members = sqlx::query_as::<_, ProjectMember>(
            r#"
            SELECT project_id, user_id, role, joined_at
            FROM project_members
            WHERE project_id = $1
            ORDER BY joined_at ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        Ok(members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_as_str() {
        assert_eq!(ProjectRole::Owner.as_str(), "owner");
        assert_eq!(ProjectRole::Admin.as_str(), "admin");
        assert_eq!(ProjectRole::Member.as_str(), "member");
        assert_eq!(ProjectRole::Viewer.as_str(), "viewer");
    }

    #[test]
    fn test_role_permissions() {
        assert!(ProjectRole::Owner.can_manage_project());
        assert!(ProjectRole::Owner.can_archive_project());
        assert!(ProjectRole::Owner.can_moderate());

        assert!(ProjectRole::Admin.can_manage_project());
        assert!(!ProjectRole::Admin.can_archive_project());
        assert!(ProjectRole::Admin.can_moderate());

        assert!(!ProjectRole::Member.can_manage_project());
        assert!(!ProjectRole::Member.can_archive_project());
        assert!(!ProjectRole::Member.can_moderate());

        assert!(!ProjectRole::Viewer.can_manage_project());
        assert!(!ProjectRole::Viewer.can_archive_project());
        assert!(!ProjectRole::Viewer.can_moderate());
    }

    #[test]
    fn test_role_hierarchy() {
        assert!(ProjectRole::Owner.has_permission(&ProjectRole::Admin));
        assert!(ProjectRole::Admin.has_permission(&ProjectRole::Member));
        assert!(ProjectRole::Member.has_permission(&ProjectRole::Viewer));
        assert!(!ProjectRole::Viewer.has_permission(&ProjectRole::Member));
        assert!(!ProjectRole::Admin.has_permission(&ProjectRole::Owner));
        assert!(ProjectRole::Member.has_permission(&ProjectRole::Member));
    }

    #[test]
    fn test_create_membership_default_role() {
        assert_eq!(default_role(), ProjectRole::Member);
    }

    // Database-backed membership tests live in the API integration suite.
}
