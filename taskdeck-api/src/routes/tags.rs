//! Tag and notification endpoints
//!
//! Notification routes live under /tags, mirroring how the router was
//! originally laid out.
//!
//! # Endpoints
//!
//! - `POST /api/v1/tags` - create tag (project-scoped or global)
//! - `GET /api/v1/tags` - list accessible tags
//! - `PUT /api/v1/tags/:id` - update (creator, or owner/admin for scoped tags)
//! - `DELETE /api/v1/tags/:id` - delete, blocked while in use
//! - `GET /api/v1/tags/notifications` - the caller's notifications
//! - `PUT /api/v1/tags/notifications/:id/read` - mark one read
//! - `PUT /api/v1/tags/notifications/read-all` - mark all read

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use taskdeck_shared::auth::{middleware::AuthContext, policy};
use taskdeck_shared::models::notification::Notification;
use taskdeck_shared::models::tag::{CreateTag, Tag, UpdateTag};

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::MessageResponse,
};

fn default_tag_color() -> String {
    "#95a5a6".to_string()
}

/// Create tag request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTagRequest {
    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    pub name: String,

    #[serde(default = "default_tag_color")]
    #[validate(length(max = 7, message = "Color must be a hex value"))]
    pub color: String,

    /// Owning project; omit for a global tag
    pub project_id: Option<Uuid>,
}

/// Update tag request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTagRequest {
    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 7, message = "Color must be a hex value"))]
    pub color: Option<String>,
}

/// Tag listing query
#[derive(Debug, Deserialize)]
pub struct ListTagsQuery {
    pub project_id: Option<Uuid>,
}

/// Notification listing query
#[derive(Debug, Deserialize)]
pub struct ListNotificationsQuery {
    #[serde(default)]
    pub unread_only: bool,
}

/// Bulk-read response
#[derive(Debug, Serialize)]
pub struct MarkAllReadResponse {
    /// How many notifications were flipped to read
    pub updated: u64,
}

/// Create a tag
///
/// Project-scoped tags require membership in that project. Name uniqueness
/// is per scope; the global scope (no project) is distinct from every
/// project.
pub async fn create_tag(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateTagRequest>,
) -> ApiResult<Json<Tag>> {
    req.validate()?;

    if let Some(project_id) = req.project_id {
        policy::require_member(&state.db, project_id, auth.user_id).await?;
    }

    if Tag::exists_in_scope(&state.db, &req.name, req.project_id).await? {
        return Err(ApiError::Conflict(
            "Tag with this name already exists in this project".to_string(),
        ));
    }

    let tag = Tag::create(
        &state.db,
        CreateTag {
            name: req.name,
            color: req.color,
            project_id: req.project_id,
            created_by: auth.user_id,
        },
    )
    .await?;

    Ok(Json(tag))
}

/// List tags visible to the caller
///
/// With `project_id`: that project's tags plus global tags (membership
/// checked). Without: tags of every accessible project plus global tags.
pub async fn list_tags(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListTagsQuery>,
) -> ApiResult<Json<Vec<Tag>>> {
    let tags = match query.project_id {
        Some(project_id) => {
            policy::require_member(&state.db, project_id, auth.user_id).await?;
            Tag::list_for_project(&state.db, project_id).await?
        }
        None => Tag::list_accessible(&state.db, auth.user_id).await?,
    };

    Ok(Json(tags))
}

/// Update a tag
///
/// Scoped tags: creator or owner/admin of the project. Global tags:
/// creator only.
pub async fn update_tag(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTagRequest>,
) -> ApiResult<Json<Tag>> {
    req.validate()?;

    let mut tag = Tag::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Tag not found".to_string()))?;

    policy::require_tag_modify(&state.db, &tag, auth.user_id).await?;

    tag.apply(UpdateTag {
        name: req.name,
        color: req.color,
    });

    // A renamed tag may collide within its scope; the unique index answers
    let tag = tag.persist(&state.db).await?;

    Ok(Json(tag))
}

/// Delete a tag
///
/// Same permission rule as update. Fails with 409 while any task still
/// references the tag, leaving tag and assignments untouched.
pub async fn delete_tag(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    let tag = Tag::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Tag not found".to_string()))?;

    policy::require_tag_modify(&state.db, &tag, auth.user_id).await?;

    Tag::delete(&state.db, tag.id).await?;

    Ok(Json(MessageResponse::new("Tag deleted successfully")))
}

/// The caller's notifications, newest first
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListNotificationsQuery>,
) -> ApiResult<Json<Vec<Notification>>> {
    let notifications =
        Notification::list_for_user(&state.db, auth.user_id, query.unread_only).await?;
    Ok(Json(notifications))
}

/// Mark one notification as read (idempotent)
pub async fn mark_notification_read(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    let found = Notification::mark_read(&state.db, id, auth.user_id).await?;
    if !found {
        return Err(ApiError::NotFound("Notification not found".to_string()));
    }

    Ok(Json(MessageResponse::new("Notification marked as read")))
}

/// Mark all of the caller's unread notifications as read (idempotent)
pub async fn mark_all_notifications_read(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<MarkAllReadResponse>> {
    let updated = Notification::mark_all_read(&state.db, auth.user_id).await?;

    Ok(Json(MarkAllReadResponse { updated }))
}
