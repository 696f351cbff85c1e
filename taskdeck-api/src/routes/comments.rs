//! Comment and attachment endpoints
//!
//! # Endpoints
//!
//! - `POST /api/v1/comments` - comment on a task
//! - `GET /api/v1/comments/task/:task_id` - a task's comments
//! - `PUT /api/v1/comments/:id` - edit (author only)
//! - `DELETE /api/v1/comments/:id` - delete (author or owner/admin)
//! - `POST /api/v1/comments/task/:task_id/attachments` - upload (multipart, 10 MiB cap)
//! - `GET /api/v1/comments/task/:task_id/attachments` - list attachments
//! - `GET /api/v1/comments/attachments/:id` - download
//! - `DELETE /api/v1/comments/attachments/:id` - delete (uploader or owner/admin)

use axum::{
    extract::{Multipart, Path, State},
    http::{header, HeaderMap, HeaderValue},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use taskdeck_shared::auth::{middleware::AuthContext, policy};
use taskdeck_shared::models::attachment::{
    storage_key_for, Attachment, CreateAttachment, MAX_ATTACHMENT_BYTES,
};
use taskdeck_shared::models::comment::{Comment, UpdateComment};
use taskdeck_shared::models::notification::{CreateNotification, Notification};
use taskdeck_shared::models::task::Task;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::MessageResponse,
};

/// Create comment request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    pub task_id: Uuid,

    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,
}

/// Update comment request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCommentRequest {
    #[validate(length(min = 1, message = "Content is required"))]
    pub content: Option<String>,
}

/// Loads a task and checks the caller may access it through membership
async fn check_task_access(state: &AppState, task_id: Uuid, user_id: Uuid) -> ApiResult<Task> {
    let task = Task::find_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    policy::require_member(&state.db, task.project_id, user_id).await?;

    Ok(task)
}

/// Notifies the task's assignee and creator about a new comment
///
/// The commenter is never notified about their own comment.
async fn notify_comment(state: &AppState, task: &Task, commenter_id: Uuid) -> ApiResult<()> {
    let mut recipients: Vec<Uuid> = Vec::new();
    if let Some(assignee_id) = task.assignee_id {
        recipients.push(assignee_id);
    }
    recipients.push(task.creator_id);
    recipients.sort();
    recipients.dedup();

    for user_id in recipients.into_iter().filter(|id| *id != commenter_id) {
        Notification::create(
            &state.db,
            CreateNotification {
                user_id,
                task_id: Some(task.id),
                kind: "comment_added".to_string(),
                title: format!("New comment on: {}", task.title),
                message: None,
            },
        )
        .await?;
    }

    Ok(())
}

/// Comment on a task
pub async fn create_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateCommentRequest>,
) -> ApiResult<Json<Comment>> {
    req.validate()?;

    let task = check_task_access(&state, req.task_id, auth.user_id).await?;

    let comment = Comment::create(&state.db, task.id, auth.user_id, req.content).await?;

    notify_comment(&state, &task, auth.user_id).await?;

    Ok(Json(comment))
}

/// A task's comments, oldest first
pub async fn list_comments(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Comment>>> {
    check_task_access(&state, task_id, auth.user_id).await?;

    let comments = Comment::list_for_task(&state.db, task_id).await?;
    Ok(Json(comments))
}

/// Edit a comment
///
/// Strictly the author; there is no admin override for editing.
pub async fn update_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCommentRequest>,
) -> ApiResult<Json<Comment>> {
    req.validate()?;

    let mut comment = Comment::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Comment not found".to_string()))?;

    policy::require_author(comment.user_id, auth.user_id)?;
    check_task_access(&state, comment.task_id, auth.user_id).await?;

    comment.apply(UpdateComment {
        content: req.content,
    });

    let comment = comment.persist(&state.db).await?;

    Ok(Json(comment))
}

/// Delete a comment (author, or owner/admin of the project)
pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    let comment = Comment::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Comment not found".to_string()))?;

    let task = Task::find_by_id(&state.db, comment.task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    policy::require_author_or_moderator(&state.db, task.project_id, comment.user_id, auth.user_id)
        .await?;

    Comment::delete(&state.db, comment.id).await?;

    Ok(Json(MessageResponse::new("Comment deleted successfully")))
}

/// Upload an attachment (multipart "file" field)
///
/// The size cap is checked before anything reaches storage; the blob is
/// written first and the metadata row second, so a failed write leaves no
/// dangling metadata.
pub async fn upload_attachment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
    mut multipart: Multipart,
) -> ApiResult<Json<Attachment>> {
    let task = check_task_access(&state, task_id, auth.user_id).await?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let original_filename = field
            .file_name()
            .map(str::to_string)
            .unwrap_or_else(|| "upload.bin".to_string());
        let mime_type = field.content_type().map(str::to_string);

        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?;

        if data.len() > MAX_ATTACHMENT_BYTES {
            return Err(ApiError::PayloadTooLarge(
                "File size too large. Maximum size is 10MB.".to_string(),
            ));
        }

        let storage_key = storage_key_for(&original_filename);
        state.storage.put(&storage_key, &data).await?;

        let attachment = Attachment::create(
            &state.db,
            CreateAttachment {
                task_id: task.id,
                user_id: auth.user_id,
                storage_key,
                original_filename,
                file_size: data.len() as i64,
                mime_type,
            },
        )
        .await?;

        return Ok(Json(attachment));
    }

    Err(ApiError::BadRequest(
        "Multipart field 'file' is required".to_string(),
    ))
}

/// A task's attachments, oldest first
pub async fn list_attachments(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Attachment>>> {
    check_task_access(&state, task_id, auth.user_id).await?;

    let attachments = Attachment::list_for_task(&state.db, task_id).await?;
    Ok(Json(attachments))
}

/// Download an attachment's bytes
pub async fn download_attachment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<(HeaderMap, Vec<u8>)> {
    let attachment = Attachment::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Attachment not found".to_string()))?;

    check_task_access(&state, attachment.task_id, auth.user_id).await?;

    let data = state
        .storage
        .get(&attachment.storage_key)
        .await?
        .ok_or_else(|| ApiError::NotFound("Attachment data not found".to_string()))?;

    let mut headers = HeaderMap::new();
    let content_type = attachment
        .mime_type
        .as_deref()
        .unwrap_or("application/octet-stream");
    if let Ok(value) = HeaderValue::from_str(content_type) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    let disposition = format!(
        "attachment; filename=\"{}\"",
        attachment.original_filename.replace('"', "_")
    );
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    Ok((headers, data))
}

/// Delete an attachment (uploader, or owner/admin of the project)
///
/// The blob is removed first; a blob that is already gone counts as
/// removed. The metadata row goes last.
pub async fn delete_attachment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    let attachment = Attachment::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Attachment not found".to_string()))?;

    let task = Task::find_by_id(&state.db, attachment.task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    policy::require_author_or_moderator(
        &state.db,
        task.project_id,
        attachment.user_id,
        auth.user_id,
    )
    .await?;

    state.storage.delete(&attachment.storage_key).await?;
    Attachment::delete(&state.db, attachment.id).await?;

    Ok(Json(MessageResponse::new("Attachment deleted successfully")))
}
