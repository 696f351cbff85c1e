//! Database models for TaskDeck
//!
//! This module contains all database models and their CRUD operations.
//! Every operation takes an explicit `&PgPool`; models hold no connection
//! state of their own.
//!
//! # Models
//!
//! - `user`: user accounts
//! - `project`: projects (soft-deleted via archive)
//! - `membership`: project membership with roles
//! - `task`: tasks with subtask hierarchy and status lifecycle
//! - `tag`: tags (project-scoped or global) and task-tag assignments
//! - `comment`: task comments
//! - `attachment`: task attachments (metadata; blobs live in storage)
//! - `notification`: per-user notifications

pub mod attachment;
pub mod comment;
pub mod membership;
pub mod notification;
pub mod project;
pub mod tag;
pub mod task;
pub mod user;
