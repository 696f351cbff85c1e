//! API route handlers
//!
//! Organized by resource:
//!
//! - `health`: health check endpoint
//! - `auth`: registration and login
//! - `users`: profile endpoints
//! - `projects`: projects and membership management
//! - `tasks`: tasks, subtasks, calendar, tag assignments
//! - `comments`: comments and attachments
//! - `tags`: tags and notification endpoints

use serde::Serialize;

pub mod auth;
pub mod comments;
pub mod health;
pub mod projects;
pub mod tags;
pub mod tasks;
pub mod users;

/// Plain message response used by archive/delete endpoints
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Human-readable outcome
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
