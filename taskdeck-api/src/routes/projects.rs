//! Project endpoints
//!
//! # Endpoints
//!
//! - `POST /api/v1/projects` - create project (creator becomes owner)
//! - `GET /api/v1/projects` - list the caller's projects
//! - `GET /api/v1/projects/:id` - project details (members only)
//! - `PUT /api/v1/projects/:id` - update (owner/admin)
//! - `DELETE /api/v1/projects/:id` - archive (owner only)
//! - `POST /api/v1/projects/:id/members` - add member (owner/admin)
//! - `GET /api/v1/projects/:id/members` - list members

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use taskdeck_shared::auth::{middleware::AuthContext, policy};
use taskdeck_shared::models::membership::{CreateProjectMember, ProjectMember, ProjectRole};
use taskdeck_shared::models::project::{CreateProject, Project, UpdateProject};
use taskdeck_shared::models::user::User;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::MessageResponse,
};

fn default_color() -> String {
    "#3498db".to_string()
}

/// Create project request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,

    pub description: Option<String>,

    #[serde(default = "default_color")]
    #[validate(length(max = 7, message = "Color must be a hex value"))]
    pub color: String,
}

/// Update project request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProjectRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: Option<String>,

    pub description: Option<String>,

    #[validate(length(max = 7, message = "Color must be a hex value"))]
    pub color: Option<String>,
}

fn default_member_role() -> ProjectRole {
    ProjectRole::Member
}

/// Add member request
#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    /// User to add
    pub user_id: Uuid,

    /// Role to assign (defaults to member)
    #[serde(default = "default_member_role")]
    pub role: ProjectRole,
}

async fn find_project(state: &AppState, id: Uuid) -> ApiResult<Project> {
    Project::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))
}

/// Create a project
///
/// The project row and the creator's owner membership are inserted in one
/// transaction.
pub async fn create_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateProjectRequest>,
) -> ApiResult<Json<Project>> {
    req.validate()?;

    let project = Project::create_with_owner(
        &state.db,
        CreateProject {
            name: req.name,
            description: req.description,
            color: req.color,
        },
        auth.user_id,
    )
    .await?;

    tracing::info!(project_id = %project.id, owner_id = %auth.user_id, "Project created");

    Ok(Json(project))
}

/// List the caller's non-archived projects
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Project>>> {
    let projects = Project::list_for_user(&state.db, auth.user_id).await?;
    Ok(Json(projects))
}

/// Project details, members only
pub async fn get_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Project>> {
    let project = find_project(&state, id).await?;
    policy::require_member(&state.db, project.id, auth.user_id).await?;

    Ok(Json(project))
}

/// Update a project (owner or admin)
pub async fn update_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProjectRequest>,
) -> ApiResult<Json<Project>> {
    req.validate()?;

    let mut project = find_project(&state, id).await?;
    policy::require_project_manage(&state.db, project.id, auth.user_id).await?;

    project.apply(UpdateProject {
        name: req.name,
        description: req.description,
        color: req.color,
    });

    let project = project.persist(&state.db).await?;

    Ok(Json(project))
}

/// Archive a project (owner only, stricter than update)
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    let project = find_project(&state, id).await?;
    policy::require_project_archive(&state.db, project.id, auth.user_id).await?;

    Project::archive(&state.db, project.id).await?;

    tracing::info!(project_id = %project.id, "Project archived");

    Ok(Json(MessageResponse::new("Project archived successfully")))
}

/// Add a member to a project (owner or admin)
///
/// # Errors
///
/// - `404 Not Found`: project or target user missing
/// - `409 Conflict`: target is already a member
/// - `400 Bad Request`: attempt to add a second owner
pub async fn add_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<AddMemberRequest>,
) -> ApiResult<Json<ProjectMember>> {
    let project = find_project(&state, id).await?;

    // The owner role is assigned once, at project creation
    if req.role == ProjectRole::Owner {
        return Err(ApiError::BadRequest(
            "A project has exactly one owner".to_string(),
        ));
    }

    policy::require_member_add(&state.db, project.id, auth.user_id, req.user_id).await?;

    if User::find_by_id(&state.db, req.user_id).await?.is_none() {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    let member = ProjectMember::create(
        &state.db,
        CreateProjectMember {
            project_id: project.id,
            user_id: req.user_id,
            role: req.role,
        },
    )
    .await?;

    Ok(Json(member))
}

/// List a project's members
pub async fn list_members(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<ProjectMember>>> {
    policy::require_member(&state.db, id, auth.user_id).await?;

    let members = ProjectMember::list_by_project(&state.db, id).await?;
    Ok(Json(members))
}
