//! Task endpoints
//!
//! # Endpoints
//!
//! - `POST /api/v1/tasks` - create task
//! - `GET /api/v1/tasks` - list with filters, scoped to accessible projects
//! - `GET /api/v1/tasks/calendar` - tasks overlapping a date window
//! - `GET /api/v1/tasks/:id` - task details (archived included)
//! - `PUT /api/v1/tasks/:id` - update (any member)
//! - `DELETE /api/v1/tasks/:id` - archive (creator or owner/admin)
//! - `GET /api/v1/tasks/:id/subtasks` - children of a task
//! - `POST/GET /api/v1/tasks/:id/tags`, `DELETE /api/v1/tasks/:id/tags/:tag_id`

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use taskdeck_shared::auth::{middleware::AuthContext, policy};
use taskdeck_shared::models::notification::{CreateNotification, Notification};
use taskdeck_shared::models::tag::{Tag, TaskTag};
use taskdeck_shared::models::task::{
    CreateTask, Task, TaskFilter, TaskPriority, TaskStatus, UpdateTask,
};

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::MessageResponse,
};

fn default_status() -> TaskStatus {
    TaskStatus::Todo
}

fn default_priority() -> TaskPriority {
    TaskPriority::Medium
}

/// Create task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 500, message = "Title must be 1-500 characters"))]
    pub title: String,

    pub description: Option<String>,

    pub project_id: Uuid,

    pub parent_task_id: Option<Uuid>,

    pub assignee_id: Option<Uuid>,

    #[serde(default = "default_status")]
    pub status: TaskStatus,

    #[serde(default = "default_priority")]
    pub priority: TaskPriority,

    pub start_date: Option<DateTime<Utc>>,

    pub due_date: Option<DateTime<Utc>>,

    pub estimated_hours: Option<f64>,

    pub position: Option<i32>,
}

/// Calendar window query
#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

/// Tag assignment request
#[derive(Debug, Deserialize)]
pub struct AttachTagRequest {
    pub tag_id: Uuid,
}

async fn find_task(state: &AppState, id: Uuid) -> ApiResult<Task> {
    Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))
}

/// Notifies a user that a task was assigned to them
///
/// Self-assignment produces no notification.
async fn notify_assignment(
    state: &AppState,
    task: &Task,
    assignee_id: Uuid,
    actor_id: Uuid,
) -> ApiResult<()> {
    if assignee_id == actor_id {
        return Ok(());
    }

    Notification::create(
        &state.db,
        CreateNotification {
            user_id: assignee_id,
            task_id: Some(task.id),
            kind: "task_assigned".to_string(),
            title: format!("Task assigned: {}", task.title),
            message: None,
        },
    )
    .await?;

    Ok(())
}

/// Create a task
///
/// Checks, in order: the caller is a member of the project; the parent task
/// (if any) exists in the same project; the assignee (if any) is a member
/// of the project.
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<Json<Task>> {
    req.validate()?;

    policy::require_member(&state.db, req.project_id, auth.user_id).await?;

    if let Some(parent_id) = req.parent_task_id {
        let parent = Task::find_by_id(&state.db, parent_id).await?;
        match parent {
            Some(p) if p.project_id == req.project_id => {}
            _ => {
                return Err(ApiError::BadRequest(
                    "Parent task not found or not in the same project".to_string(),
                ))
            }
        }
    }

    if let Some(assignee_id) = req.assignee_id {
        policy::require_assignable(&state.db, req.project_id, assignee_id).await?;
    }

    let task = Task::create(
        &state.db,
        CreateTask {
            title: req.title,
            description: req.description,
            project_id: req.project_id,
            parent_task_id: req.parent_task_id,
            assignee_id: req.assignee_id,
            creator_id: auth.user_id,
            status: req.status,
            priority: req.priority,
            start_date: req.start_date,
            due_date: req.due_date,
            estimated_hours: req.estimated_hours,
            position: req.position,
        },
    )
    .await?;

    if let Some(assignee_id) = task.assignee_id {
        notify_assignment(&state, &task, assignee_id, auth.user_id).await?;
    }

    Ok(Json(task))
}

/// List tasks visible to the caller
///
/// With a `project_id` filter that project's access is checked; without
/// one, the listing covers every project the caller belongs to. Archived
/// tasks never appear.
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(filter): Query<TaskFilter>,
) -> ApiResult<Json<Vec<Task>>> {
    if let Some(project_id) = filter.project_id {
        policy::require_member(&state.db, project_id, auth.user_id).await?;
    }

    let tasks = Task::list(&state.db, auth.user_id, &filter).await?;
    Ok(Json(tasks))
}

/// Tasks overlapping the requested [start_date, end_date] window
pub async fn list_calendar(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<CalendarQuery>,
) -> ApiResult<Json<Vec<Task>>> {
    let tasks =
        Task::list_calendar(&state.db, auth.user_id, query.start_date, query.end_date).await?;
    Ok(Json(tasks))
}

/// Task details
///
/// Archived tasks are still reachable by id even though listings exclude
/// them.
pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    let task = find_task(&state, id).await?;
    policy::require_member(&state.db, task.project_id, auth.user_id).await?;

    Ok(Json(task))
}

/// Update a task (any member of its project)
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 500, message = "Title must be 1-500 characters"))]
    pub title: Option<String>,

    pub description: Option<String>,

    pub assignee_id: Option<Uuid>,

    pub status: Option<TaskStatus>,

    pub priority: Option<TaskPriority>,

    pub start_date: Option<DateTime<Utc>>,

    pub due_date: Option<DateTime<Utc>>,

    pub estimated_hours: Option<f64>,

    pub actual_hours: Option<f64>,

    pub position: Option<i32>,
}

/// Update a task
///
/// A new assignee must be a member of the project. The status transition
/// maintains the completed_at invariant (see `Task::apply`).
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    req.validate()?;

    let mut task = find_task(&state, id).await?;
    policy::require_member(&state.db, task.project_id, auth.user_id).await?;

    if let Some(assignee_id) = req.assignee_id {
        policy::require_assignable(&state.db, task.project_id, assignee_id).await?;
    }

    let previous_assignee = task.assignee_id;

    task.apply(
        UpdateTask {
            title: req.title,
            description: req.description,
            assignee_id: req.assignee_id,
            status: req.status,
            priority: req.priority,
            start_date: req.start_date,
            due_date: req.due_date,
            estimated_hours: req.estimated_hours,
            actual_hours: req.actual_hours,
            position: req.position,
        },
        Utc::now(),
    );

    let task = task.persist(&state.db).await?;

    if let Some(assignee_id) = task.assignee_id {
        if previous_assignee != Some(assignee_id) {
            notify_assignment(&state, &task, assignee_id, auth.user_id).await?;
        }
    }

    Ok(Json(task))
}

/// Archive a task (creator, or owner/admin of the project)
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    let task = find_task(&state, id).await?;
    policy::require_task_archive(&state.db, &task, auth.user_id).await?;

    Task::archive(&state.db, task.id).await?;

    Ok(Json(MessageResponse::new("Task archived successfully")))
}

/// Non-archived subtasks of a task
pub async fn list_subtasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<Task>>> {
    let parent = find_task(&state, id).await?;
    policy::require_member(&state.db, parent.project_id, auth.user_id).await?;

    let subtasks = Task::list_subtasks(&state.db, parent.id).await?;
    Ok(Json(subtasks))
}

/// Assign a tag to a task
///
/// The tag must be global or belong to the task's project.
pub async fn attach_tag(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<AttachTagRequest>,
) -> ApiResult<Json<TaskTag>> {
    let task = find_task(&state, id).await?;
    policy::require_member(&state.db, task.project_id, auth.user_id).await?;

    let tag = Tag::find_by_id(&state.db, req.tag_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Tag not found".to_string()))?;

    if let Some(tag_project) = tag.project_id {
        if tag_project != task.project_id {
            return Err(ApiError::BadRequest(
                "Tag belongs to a different project".to_string(),
            ));
        }
    }

    let task_tag = TaskTag::create(&state.db, task.id, tag.id).await?;
    Ok(Json(task_tag))
}

/// Tags assigned to a task
pub async fn list_task_tags(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<Tag>>> {
    let task = find_task(&state, id).await?;
    policy::require_member(&state.db, task.project_id, auth.user_id).await?;

    let tags = TaskTag::list_tags_for_task(&state.db, task.id).await?;
    Ok(Json(tags))
}

/// Remove a tag from a task
pub async fn detach_tag(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((id, tag_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<MessageResponse>> {
    let task = find_task(&state, id).await?;
    policy::require_member(&state.db, task.project_id, auth.user_id).await?;

    let removed = TaskTag::delete(&state.db, task.id, tag_id).await?;
    if !removed {
        return Err(ApiError::NotFound(
            "Tag is not assigned to this task".to_string(),
        ));
    }

    Ok(Json(MessageResponse::new("Tag removed from task")))
}
