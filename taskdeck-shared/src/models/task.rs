//! Task model and database operations
//!
//! Tasks belong to a project (fixed at creation) and may form a subtask
//! hierarchy via `parent_task_id`, which must reference a task in the same
//! project. Children are never stored as back-references; subtask listings
//! recompute them through the indexed parent column.
//!
//! The one temporal rule lives in [`Task::apply`]: `completed_at` is
//! non-null exactly when status is `done`, maintained on every status
//! transition.
//!
//! # Schema
//!
//! ```sql
//! CREATE TYPE task_status AS ENUM ('todo', 'in_progress', 'review', 'done', 'cancelled');
//! CREATE TYPE task_priority AS ENUM ('low', 'medium', 'high', 'urgent');
//!
//! CREATE TABLE tasks (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     title VARCHAR(500) NOT NULL,
//!     description TEXT,
//!     project_id UUID NOT NULL REFERENCES projects(id),
//!     parent_task_id UUID REFERENCES tasks(id),
//!     assignee_id UUID REFERENCES users(id),
//!     creator_id UUID NOT NULL REFERENCES users(id),
//!     status task_status NOT NULL DEFAULT 'todo',
//!     priority task_priority NOT NULL DEFAULT 'medium',
//!     start_date TIMESTAMPTZ,
//!     due_date TIMESTAMPTZ,
//!     completed_at TIMESTAMPTZ,
//!     estimated_hours DOUBLE PRECISION,
//!     actual_hours DOUBLE PRECISION,
//!     position INTEGER,
//!     is_archived BOOLEAN NOT NULL DEFAULT FALSE,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Task workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Review,
    Done,
    Cancelled,
}

impl TaskStatus {
    /// Converts status to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Review => "review",
            TaskStatus::Done => "done",
            TaskStatus::Cancelled => "cancelled",
        }
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Urgent,
}

/// Task model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Task title
    pub title: String,

    /// Optional description (markdown)
    pub description: Option<String>,

    /// Owning project; never changes after creation
    pub project_id: Uuid,

    /// Parent task for subtasks; same project as this task
    pub parent_task_id: Option<Uuid>,

    /// Assigned user; must be a member of the project
    pub assignee_id: Option<Uuid>,

    /// User who created the task
    pub creator_id: Uuid,

    /// Workflow status
    pub status: TaskStatus,

    /// Priority
    pub priority: TaskPriority,

    /// Scheduled start
    pub start_date: Option<DateTime<Utc>>,

    /// Due date
    pub due_date: Option<DateTime<Utc>>,

    /// Set exactly while status == done
    pub completed_at: Option<DateTime<Utc>>,

    /// Estimated effort in hours
    pub estimated_hours: Option<f64>,

    /// Actual effort in hours
    pub actual_hours: Option<f64>,

    /// Manual ordering hint within a list
    pub position: Option<i32>,

    /// Soft-delete flag; archived tasks are excluded from listings
    pub is_archived: bool,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub project_id: Uuid,
    pub parent_task_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
    pub creator_id: Uuid,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub start_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub estimated_hours: Option<f64>,
    pub position: Option<i32>,
}

/// Fields that may change on a task update
///
/// Absent fields are left unchanged. `project_id` is deliberately not here;
/// archiving goes through [`Task::archive`] with its own permission rule.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTask {
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

/// Filters for task listings
///
/// `project_id` narrows to one project (access checked by the caller);
/// without it the listing is restricted to the actor's accessible projects.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskFilter {
    pub project_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub parent_task_id: Option<Uuid>,
}

const TASK_COLUMNS: &str = "id, title, description, project_id, parent_task_id, assignee_id, \
                            creator_id, status, priority, start_date, due_date, completed_at, \
                            estimated_hours, actual_hours, position, is_archived, created_at, \
                            updated_at";

impl Task {
    /// Creates a task
    ///
    /// Access, parent-task, and assignee checks happen in the policy layer
    /// before this is called. `completed_at` is set when a task is created
    /// directly in `done` status so the invariant holds from the start.
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let completed_at = if data.status == TaskStatus::Done {
            Some(Utc::now())
        } else {
            None
        };

        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (title, description, project_id, parent_task_id, assignee_id,
                               creator_id, status, priority, start_date, due_date, completed_at,
                               estimated_hours, position)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(data.title)
        .bind(data.description)
        .bind(data.project_id)
        .bind(data.parent_task_id)
        .bind(data.assignee_id)
        .bind(data.creator_id)
        .bind(data.status)
        .bind(data.priority)
        .bind(data.start_date)
        .bind(data.due_date)
        .bind(completed_at)
        .bind(data.estimated_hours)
        .bind(data.position)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID (archived tasks included)
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Applies an update to this task in memory
    ///
    /// Handles the completed_at lifecycle: a transition into `done` stamps
    /// `now`, a transition out of `done` clears the timestamp even when
    /// other fields change in the same update, and updates that keep the
    /// status leave it untouched.
    pub fn apply(&mut self, update: UpdateTask, now: DateTime<Utc>) {
        if let Some(new_status) = update.status {
            if new_status == TaskStatus::Done && self.status != TaskStatus::Done {
                self.completed_at = Some(now);
            } else if new_status != TaskStatus::Done && self.status == TaskStatus::Done {
                self.completed_at = None;
            }
            self.status = new_status;
        }

        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(description) = update.description {
            self.description = Some(description);
        }
        if let Some(assignee_id) = update.assignee_id {
            self.assignee_id = Some(assignee_id);
        }
        if let Some(priority) = update.priority {
            self.priority = priority;
        }
        if let Some(start_date) = update.start_date {
            self.start_date = Some(start_date);
        }
        if let Some(due_date) = update.due_date {
            self.due_date = Some(due_date);
        }
        if let Some(estimated_hours) = update.estimated_hours {
            self.estimated_hours = Some(estimated_hours);
        }
        if let Some(actual_hours) = update.actual_hours {
            self.actual_hours = Some(actual_hours);
        }
        if let Some(position) = update.position {
            self.position = Some(position);
        }
    }

    /// Writes the mutable fields of this task back to the database
    pub async fn persist(&self, pool: &PgPool) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET title = $2, description = $3, assignee_id = $4, status = $5, priority = $6,
                start_date = $7, due_date = $8, completed_at = $9, estimated_hours = $10,
                actual_hours = $11, position = $12, updated_at = NOW()
            WHERE id = $1
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(self.id)
        .bind(&self.title)
        .bind(&self.description)
        .bind(self.assignee_id)
        .bind(self.status)
        .bind(self.priority)
        .bind(self.start_date)
        .bind(self.due_date)
        .bind(self.completed_at)
        .bind(self.estimated_hours)
        .bind(self.actual_hours)
        .bind(self.position)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Archives a task (soft delete)
    pub async fn archive(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE tasks SET is_archived = TRUE, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .execute(pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists non-archived tasks visible to a user, newest first
    ///
    /// With `filter.project_id` the listing is scoped to that project (the
    /// caller has already checked access); otherwise it is restricted to
    /// every project the user is a member of.
    pub async fn list(
        pool: &PgPool,
        user_id: Uuid,
        filter: &TaskFilter,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let mut sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE is_archived = FALSE");
        let mut n = 0;

        if filter.project_id.is_some() {
            n += 1;
            sql.push_str(&format!(" AND project_id = ${}", n));
        } else {
            n += 1;
            sql.push_str(&format!(
                " AND project_id IN (SELECT project_id FROM project_members WHERE user_id = ${})",
                n
            ));
        }
        if filter.assignee_id.is_some() {
            n += 1;
            sql.push_str(&format!(" AND assignee_id = ${}", n));
        }
        if filter.status.is_some() {
            n += 1;
            sql.push_str(&format!(" AND status = ${}", n));
        }
        if filter.priority.is_some() {
            n += 1;
            sql.push_str(&format!(" AND priority = ${}", n));
        }
        if filter.parent_task_id.is_some() {
            n += 1;
            sql.push_str(&format!(" AND parent_task_id = ${}", n));
        }

        sql.push_str(" ORDER BY created_at DESC");

        let mut q = sqlx::query_as::<_, Task>(&sql);

        if let Some(project_id) = filter.project_id {
            q = q.bind(project_id);
        } else {
            q = q.bind(user_id);
        }
        if let Some(assignee_id) = filter.assignee_id {
            q = q.bind(assignee_id);
        }
        if let Some(status) = filter.status {
            q = q.bind(status);
        }
        if let Some(priority) = filter.priority {
            q = q.bind(priority);
        }
        if let Some(parent_task_id) = filter.parent_task_id {
            q = q.bind(parent_task_id);
        }

        q.fetch_all(pool).await
    }

    /// Lists the non-archived subtasks of a parent task
    ///
    /// Ordered by position, then creation time.
    pub async fn list_subtasks(pool: &PgPool, parent_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {TASK_COLUMNS} FROM tasks
            WHERE parent_task_id = $1 AND is_archived = FALSE
            ORDER BY position ASC NULLS LAST, created_at ASC
            "#
        ))
        .bind(parent_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Lists non-archived tasks whose [start_date, due_date] interval
    /// overlaps the requested window (inclusive boundaries)
    ///
    /// A task overlaps if its start falls inside the window, its due date
    /// falls inside, or it spans the whole window. Scoped to the user's
    /// accessible projects.
    pub async fn list_calendar(
        pool: &PgPool,
        user_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {TASK_COLUMNS} FROM tasks
            WHERE project_id IN (SELECT project_id FROM project_members WHERE user_id = $1)
              AND is_archived = FALSE
              AND (
                    (start_date >= $2 AND start_date <= $3)
                 OR (due_date >= $2 AND due_date <= $3)
                 OR (start_date <= $2 AND due_date >= $3)
              )
            ORDER BY start_date ASC NULLS LAST, due_date ASC NULLS LAST
            "#
        ))
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_task(status: TaskStatus) -> Task {
        Task {
            id: Uuid::new_v4(),
            title: "Sample".to_string(),
            description: None,
            project_id: Uuid::new_v4(),
            parent_task_id: None,
            assignee_id: None,
            creator_id: Uuid::new_v4(),
            status,
            priority: TaskPriority::Medium,
            start_date: None,
            due_date: None,
            completed_at: if status == TaskStatus::Done {
                Some(Utc::now())
            } else {
                None
            },
            estimated_hours: None,
            actual_hours: None,
            position: None,
            is_archived: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn status_update(status: TaskStatus) -> UpdateTask {
        UpdateTask {
            status: Some(status),
            ..Default::default()
        }
    }

    /// status == done iff completed_at is set, across every transition
    fn assert_invariant(task: &Task) {
        assert_eq!(
            task.status == TaskStatus::Done,
            task.completed_at.is_some(),
            "completed_at must be set exactly while status is done"
        );
    }

    #[test]
    fn test_transition_to_done_sets_completed_at() {
        let mut task = sample_task(TaskStatus::Todo);
        let now = Utc::now();

        task.apply(status_update(TaskStatus::Done), now);

        assert_eq!(task.status, TaskStatus::Done);
        assert_eq!(task.completed_at, Some(now));
        assert_invariant(&task);
    }

    #[test]
    fn test_transition_out_of_done_clears_completed_at() {
        let mut task = sample_task(TaskStatus::Done);

        task.apply(status_update(TaskStatus::Todo), Utc::now());

        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.completed_at, None);
        assert_invariant(&task);
    }

    #[test]
    fn test_done_to_done_keeps_original_timestamp() {
        let mut task = sample_task(TaskStatus::Done);
        let original = task.completed_at;

        task.apply(status_update(TaskStatus::Done), Utc::now());

        assert_eq!(task.completed_at, original);
        assert_invariant(&task);
    }

    #[test]
    fn test_out_of_done_clears_even_with_other_field_changes() {
        let mut task = sample_task(TaskStatus::Done);

        task.apply(
            UpdateTask {
                status: Some(TaskStatus::InProgress),
                title: Some("Reopened".to_string()),
                priority: Some(TaskPriority::High),
                ..Default::default()
            },
            Utc::now(),
        );

        assert_eq!(task.title, "Reopened");
        assert_eq!(task.priority, TaskPriority::High);
        assert_eq!(task.completed_at, None);
        assert_invariant(&task);
    }

    #[test]
    fn test_update_without_status_leaves_completed_at_untouched() {
        let mut task = sample_task(TaskStatus::Done);
        let original = task.completed_at;

        task.apply(
            UpdateTask {
                title: Some("Retitled".to_string()),
                ..Default::default()
            },
            Utc::now(),
        );

        assert_eq!(task.status, TaskStatus::Done);
        assert_eq!(task.completed_at, original);
        assert_invariant(&task);
    }

    #[test]
    fn test_invariant_holds_across_transition_chain() {
        let mut task = sample_task(TaskStatus::Todo);
        let transitions = [
            TaskStatus::InProgress,
            TaskStatus::Review,
            TaskStatus::Done,
            TaskStatus::InProgress,
            TaskStatus::Done,
            TaskStatus::Cancelled,
        ];

        for status in transitions {
            task.apply(status_update(status), Utc::now());
            assert_invariant(&task);
        }
    }

    #[test]
    fn test_status_as_str() {
        assert_eq!(TaskStatus::Todo.as_str(), "todo");
        assert_eq!(TaskStatus::InProgress.as_str(), "in_progress");
        assert_eq!(TaskStatus::Done.as_str(), "done");
    }
}
