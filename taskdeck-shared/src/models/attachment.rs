//! Attachment metadata model
//!
//! Attachment rows hold metadata only; the bytes live in a
//! [`crate::storage::BlobStore`] under a generated storage key. The key is
//! derived from a fresh UUID plus the upload's extension, never from the
//! user-supplied filename, which is kept separately for display.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE task_attachments (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
//!     user_id UUID NOT NULL REFERENCES users(id),
//!     storage_key VARCHAR(255) NOT NULL,
//!     original_filename VARCHAR(255) NOT NULL,
//!     file_size BIGINT NOT NULL,
//!     mime_type VARCHAR(100),
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Maximum allowed attachment size: 10 MiB
///
/// Checked before any storage write; oversized uploads are rejected at the
/// API boundary with 413.
pub const MAX_ATTACHMENT_BYTES: usize = 10 * 1024 * 1024;

/// Attachment metadata
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Attachment {
    /// Unique attachment ID
    pub id: Uuid,

    /// Task the file is attached to
    pub task_id: Uuid,

    /// User who uploaded the file
    pub user_id: Uuid,

    /// Key of the blob in storage
    pub storage_key: String,

    /// Filename as uploaded, for display only
    pub original_filename: String,

    /// Size in bytes
    pub file_size: i64,

    /// MIME type as reported by the client
    pub mime_type: Option<String>,

    /// When the attachment was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating an attachment record
#[derive(Debug, Clone)]
pub struct CreateAttachment {
    pub task_id: Uuid,
    pub user_id: Uuid,
    pub storage_key: String,
    pub original_filename: String,
    pub file_size: i64,
    pub mime_type: Option<String>,
}

const ATTACHMENT_COLUMNS: &str =
    "id, task_id, user_id, storage_key, original_filename, file_size, mime_type, created_at";

/// Builds a collision-resistant storage key for an upload
///
/// A fresh UUID plus the original extension. The original filename never
/// reaches storage.
pub fn storage_key_for(original_filename: &str) -> String {
    let ext = std::path::Path::new(original_filename)
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    format!("{}{}", Uuid::new_v4(), ext)
}

impl Attachment {
    /// Creates an attachment record
    ///
    /// The blob must already be in storage; metadata is written last so a
    /// failed upload leaves no dangling row.
    pub async fn create(pool: &PgPool, data: CreateAttachment) -> Result<Self, sqlx::Error> {
        let attachment = sqlx::query_as::<_, Attachment>(&format!(
            r#"
            INSERT INTO task_attachments (task_id, user_id, storage_key, original_filename,
                                          file_size, mime_type)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {ATTACHMENT_COLUMNS}
            "#
        ))
        .bind(data.task_id)
        .bind(data.user_id)
        .bind(data.storage_key)
        .bind(data.original_filename)
        .bind(data.file_size)
        .bind(data.mime_type)
        .fetch_one(pool)
        .await?;

        Ok(attachment)
    }

    /// Finds an attachment by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let attachment = sqlx::query_as::<_, Attachment>(&format!(
            "SELECT {ATTACHMENT_COLUMNS} FROM task_attachments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(attachment)
    }

    /// Lists a task's attachments, oldest first
    pub async fn list_for_task(pool: &PgPool, task_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let attachments = sqlx::query_as::<_, Attachment>(&format!(
            r#"
            SELECT {ATTACHMENT_COLUMNS} FROM task_attachments
            WHERE task_id = $1
            ORDER BY created_at ASC
            "#
        ))
        .bind(task_id)
        .fetch_all(pool)
        .await?;

        Ok(attachments)
    }

    /// Deletes an attachment record
    ///
    /// The caller removes the blob first (idempotently); see the comments
    /// routes for the full delete sequence.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM task_attachments WHERE id = $1")
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
    fn test_storage_key_keeps_extension() {
        let key = storage_key_for("report.pdf");
        assert!(key.ends_with(".pdf"));
        // uuid (36 chars) + ".pdf"
        assert_eq!(key.len(), 40);
    }

    #[test]
    fn test_storage_key_without_extension() {
        let key = storage_key_for("README");
        assert_eq!(key.len(), 36);
        assert!(!key.contains('.'));
    }

    #[test]
    fn test_storage_key_independent_of_filename() {
        let a = storage_key_for("same.txt");
        let b = storage_key_for("same.txt");
        assert_ne!(a, b);
    }

    #[test]
    fn test_max_attachment_size_is_10_mib() {
        assert_eq!(MAX_ATTACHMENT_BYTES, 10 * 1024 * 1024);
    }
}
