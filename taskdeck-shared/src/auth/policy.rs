//! Access policy engine
//!
//! Every permission rule in the system lives here. Each check answers one
//! question (may this actor perform this action on this resource) and
//! returns `Ok(())` or a typed [`PolicyError`] carrying a stable reason
//! code. Checks never mutate anything; membership rows are loaded through
//! the pool passed in by the caller.
//!
//! # Rules
//!
//! | Action                    | Rule                                          |
//! |---------------------------|-----------------------------------------------|
//! | Project read/list         | any membership                                |
//! | Project update            | owner or admin                                |
//! | Project archive           | owner only                                    |
//! | Member add                | owner or admin; target not already a member   |
//! | Task create/read/update   | any membership in the task's project          |
//! | Task archive              | creator, or owner/admin                       |
//! | Comment create/read       | any membership via the task                   |
//! | Comment update            | author only                                   |
//! | Comment/attachment delete | author, or owner/admin                        |
//! | Tag update/delete         | scoped: creator or owner/admin; global: creator only |
//! | Task assignee             | assignee must be a member of the project      |
//!
//! # Example
//!
//! ```no_run
//! use taskdeck_shared::auth::policy::{self, PolicyError};
//! use taskdeck_shared::models::membership::ProjectRole;
//! use sqlx::PgPool;
//! use uuid::Uuid;
//!
//! # async fn example(pool: PgPool, project_id: Uuid, user_id: Uuid) -> Result<(), PolicyError> {
//! // Any member may read the project
//! policy::require_member(&pool, project_id, user_id).await?;
//!
//! // Updating it takes owner or admin
//! policy::require_role(&pool, project_id, user_id, ProjectRole::Admin).await?;
//! # Ok(())
//! # }
//! ```

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::membership::{ProjectMember, ProjectRole};
use crate::models::tag::Tag;
use crate::models::task::Task;

/// A policy denial (or the database error that prevented the decision)
///
/// Every variant maps to a stable reason code via [`PolicyError::reason`].
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    /// Actor has no membership in the project
    #[error("No access to project {0}")]
    NotProjectMember(Uuid),

    /// Actor's role is below what the action requires
    #[error("Insufficient permissions: requires {required:?}, has {actual:?}")]
    InsufficientRole {
        required: ProjectRole,
        actual: ProjectRole,
    },

    /// Action is restricted to the resource author
    #[error("Only the author may perform this action")]
    NotAuthor,

    /// Action on a global tag is restricted to its creator
    #[error("Only the tag creator may perform this action")]
    NotTagCreator,

    /// Task assignee is not a member of the task's project
    #[error("Assignee {0} is not a member of this project")]
    AssigneeNotMember(Uuid),

    /// Target user is already a member of the project
    #[error("User is already a member of this project")]
    AlreadyMember(Uuid),

    /// Database error while evaluating the policy
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl PolicyError {
    /// Stable reason code for logs and API clients
    pub fn reason(&self) -> &'static str {
        match self {
            PolicyError::NotProjectMember(_) => "not_project_member",
            PolicyError::InsufficientRole { .. } => "insufficient_role",
            PolicyError::NotAuthor => "not_author",
            PolicyError::NotTagCreator => "not_tag_creator",
            PolicyError::AssigneeNotMember(_) => "assignee_not_member",
            PolicyError::AlreadyMember(_) => "already_member",
            PolicyError::Database(_) => "database_error",
        }
    }
}

/// Requires any membership in the project
///
/// Grants project read/list, task create/read/update, and comment
/// create/read.
pub async fn require_member(
    pool: &PgPool,
    project_id: Uuid,
    user_id: Uuid,
) -> Result<(), PolicyError> {
    if !ProjectMember::has_access(pool, project_id, user_id).await? {
        return Err(PolicyError::NotProjectMember(project_id));
    }

    Ok(())
}

/// Requires a role at or above `required` in the project
pub async fn require_role(
    pool: &PgPool,
    project_id: Uuid,
    user_id: Uuid,
    required: ProjectRole,
) -> Result<(), PolicyError> {
    let actual = ProjectMember::get_role(pool, project_id, user_id)
        .await?
        .ok_or(PolicyError::NotProjectMember(project_id))?;

    if !actual.has_permission(&required) {
        return Err(PolicyError::InsufficientRole { required, actual });
    }

    Ok(())
}

/// Project update: owner or admin
pub async fn require_project_manage(
    pool: &PgPool,
    project_id: Uuid,
    user_id: Uuid,
) -> Result<(), PolicyError> {
    require_role(pool, project_id, user_id, ProjectRole::Admin).await
}

/// Project archive: owner only (stricter than update)
pub async fn require_project_archive(
    pool: &PgPool,
    project_id: Uuid,
    user_id: Uuid,
) -> Result<(), PolicyError> {
    require_role(pool, project_id, user_id, ProjectRole::Owner).await
}

/// Member add: actor must be owner or admin, target not already a member
///
/// Target-user existence is a NotFound concern and stays with the caller.
pub async fn require_member_add(
    pool: &PgPool,
    project_id: Uuid,
    actor_id: Uuid,
    target_id: Uuid,
) -> Result<(), PolicyError> {
    require_role(pool, project_id, actor_id, ProjectRole::Admin).await?;

    if ProjectMember::find(pool, project_id, target_id).await?.is_some() {
        return Err(PolicyError::AlreadyMember(target_id));
    }

    Ok(())
}

/// Task archive: the task's creator, or owner/admin of its project
pub async fn require_task_archive(
    pool: &PgPool,
    task: &Task,
    user_id: Uuid,
) -> Result<(), PolicyError> {
    let role = ProjectMember::get_role(pool, task.project_id, user_id)
        .await?
        .ok_or(PolicyError::NotProjectMember(task.project_id))?;

    if task.creator_id == user_id || role.can_moderate() {
        return Ok(());
    }

    Err(PolicyError::InsufficientRole {
        required: ProjectRole::Admin,
        actual: role,
    })
}

/// Comment update: strictly the author, no admin override
pub fn require_author(author_id: Uuid, user_id: Uuid) -> Result<(), PolicyError> {
    if author_id != user_id {
        return Err(PolicyError::NotAuthor);
    }

    Ok(())
}

/// Comment or attachment delete: the author, or owner/admin of the project
pub async fn require_author_or_moderator(
    pool: &PgPool,
    project_id: Uuid,
    author_id: Uuid,
    user_id: Uuid,
) -> Result<(), PolicyError> {
    let role = ProjectMember::get_role(pool, project_id, user_id)
        .await?
        .ok_or(PolicyError::NotProjectMember(project_id))?;

    if author_id == user_id || role.can_moderate() {
        return Ok(());
    }

    Err(PolicyError::InsufficientRole {
        required: ProjectRole::Admin,
        actual: role,
    })
}

/// Tag update/delete
///
/// Project-scoped tags: the creator, or owner/admin of that project. Global
/// tags have no project to check a role against, so only the creator may
/// touch them.
pub async fn require_tag_modify(
    pool: &PgPool,
    tag: &Tag,
    user_id: Uuid,
) -> Result<(), PolicyError> {
    if tag.created_by == user_id {
        return Ok(());
    }

    match tag.project_id {
        Some(project_id) => require_role(pool, project_id, user_id, ProjectRole::Admin).await,
        None => Err(PolicyError::NotTagCreator),
    }
}

/// Task assignment: the assignee must be a member of the task's project
pub async fn require_assignable(
    pool: &PgPool,
    project_id: Uuid,
    assignee_id: Uuid,
) -> Result<(), PolicyError> {
    if !ProjectMember::has_access(pool, project_id, assignee_id).await? {
        return Err(PolicyError::AssigneeNotMember(assignee_id));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_author() {
        let author = Uuid::new_v4();

        assert!(require_author(author, author).is_ok());
        assert!(matches!(
            require_author(author, Uuid::new_v4()),
            Err(PolicyError::NotAuthor)
        ));
    }

    #[test]
    fn test_reason_codes_are_stable() {
        let project = Uuid::new_v4();

        assert_eq!(
            PolicyError::NotProjectMember(project).reason(),
            "not_project_member"
        );
        assert_eq!(
            PolicyError::InsufficientRole {
                required: ProjectRole::Admin,
                actual: ProjectRole::Member,
            }
            .reason(),
            "insufficient_role"
        );
        assert_eq!(PolicyError::NotAuthor.reason(), "not_author");
        assert_eq!(PolicyError::NotTagCreator.reason(), "not_tag_creator");
        assert_eq!(
            PolicyError::AssigneeNotMember(project).reason(),
            "assignee_not_member"
        );
        assert_eq!(PolicyError::AlreadyMember(project).reason(), "already_member");
    }

    #[test]
    fn test_error_messages() {
        let err = PolicyError::InsufficientRole {
            required: ProjectRole::Owner,
            actual: ProjectRole::Admin,
        };
        assert!(err.to_string().contains("Owner"));

        let err = PolicyError::AlreadyMember(Uuid::new_v4());
        assert_eq!(err.to_string(), "User is already a member of this project");
    }

    // Role-loading checks are exercised against a real database in the API
    // integration suite; the pure hierarchy lives in models::membership.
}
