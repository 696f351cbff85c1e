//! Error handling for the API server
//!
//! This module provides a unified error type that maps to HTTP responses.
//! All handlers return `Result<T, ApiError>` which converts into the right
//! status code:
//!
//! | Variant          | Status | Notes                                    |
//! |------------------|--------|------------------------------------------|
//! | BadRequest       | 400    | malformed input, cross-project parent    |
//! | Unauthorized     | 401    | carries a `WWW-Authenticate` challenge   |
//! | Forbidden        | 403    | policy denial, stable reason code        |
//! | NotFound         | 404    | missing entity id                        |
//! | Conflict         | 409    | uniqueness violation, tag in use         |
//! | PayloadTooLarge  | 413    | attachment over the 10 MiB cap           |
//! | ValidationError  | 422    | per-field details                        |
//! | InternalError    | 500    | detail logged, not exposed               |

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use taskdeck_shared::auth::{
    jwt::JwtError, middleware::AuthError, password::PasswordError, policy::PolicyError,
};
use taskdeck_shared::models::tag::TagDeleteError;
use taskdeck_shared::storage::StorageError;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403) - generic, message only
    Forbidden(String),

    /// Forbidden (403) - policy denial carrying its stable reason code
    PolicyDenied(PolicyError),

    /// Not found (404)
    NotFound(String),

    /// Conflict (409) - duplicates, tag in use
    Conflict(String),

    /// Payload too large (413)
    PayloadTooLarge(String),

    /// Unprocessable entity (422) - validation errors
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500)
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Stable error code (e.g., "not_found", "insufficient_role")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::PolicyDenied(err) => write!(f, "Forbidden: {}", err),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::PayloadTooLarge(msg) => write!(f, "Payload too large: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request".to_string(), msg, None),
            ApiError::Unauthorized(msg) => {
                // 401 carries a challenge header per RFC 6750
                let body = Json(ErrorResponse {
                    error: "unauthorized".to_string(),
                    message: msg,
                    details: None,
                });
                let mut response = (StatusCode::UNAUTHORIZED, body).into_response();
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, header::HeaderValue::from_static("Bearer"));
                return response;
            }
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden".to_string(), msg, None),
            ApiError::PolicyDenied(err) => (
                StatusCode::FORBIDDEN,
                err.reason().to_string(),
                err.to_string(),
                None,
            ),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found".to_string(), msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict".to_string(), msg, None),
            ApiError::PayloadTooLarge(msg) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "payload_too_large".to_string(),
                msg,
                None,
            ),
            ApiError::ValidationError(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error".to_string(),
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error".to_string(),
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code,
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Convert sqlx errors to API errors
///
/// Unique-constraint violations become 409 with a message derived from the
/// constraint name; the store-level constraint is the authoritative guard
/// against write races.
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                if let Some(constraint) = db_err.constraint() {
                    if constraint.contains("login_id") {
                        return ApiError::Conflict("Login ID already exists".to_string());
                    }
                    if constraint.contains("email") {
                        return ApiError::Conflict("Email already exists".to_string());
                    }
                    if constraint.contains("tags_name_project") {
                        return ApiError::Conflict(
                            "Tag with this name already exists in this scope".to_string(),
                        );
                    }
                    if constraint.contains("task_tags") {
                        return ApiError::Conflict(
                            "Tag is already assigned to this task".to_string(),
                        );
                    }
                    if constraint.contains("project_members") {
                        return ApiError::Conflict(
                            "User is already a member of this project".to_string(),
                        );
                    }
                    return ApiError::Conflict(format!("Constraint violation: {}", constraint));
                }

                ApiError::InternalError(format!("Database error: {}", db_err))
            }
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

/// Convert policy denials to API errors
///
/// "Already a member" is a conflict, not a permission problem; database
/// failures inside a check are internal. Everything else is 403 with the
/// policy's stable reason code.
impl From<PolicyError> for ApiError {
    fn from(err: PolicyError) -> Self {
        match err {
            PolicyError::AlreadyMember(_) => {
                ApiError::Conflict("User is already a member of this project".to_string())
            }
            PolicyError::Database(e) => ApiError::from(e),
            other => ApiError::PolicyDenied(other),
        }
    }
}

/// Convert auth middleware errors to API errors
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredentials => {
                ApiError::Unauthorized("Missing authorization header".to_string())
            }
            AuthError::InvalidFormat(msg) => ApiError::BadRequest(msg),
            AuthError::InvalidToken(msg) => ApiError::Unauthorized(msg),
        }
    }
}

/// Convert JWT errors to API errors
impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            JwtError::InvalidIssuer => ApiError::Unauthorized("Invalid token issuer".to_string()),
            _ => ApiError::Unauthorized(format!("Invalid token: {}", err)),
        }
    }
}

/// Convert password errors to API errors
impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

/// Convert tag delete failures to API errors
impl From<TagDeleteError> for ApiError {
    fn from(err: TagDeleteError) -> Self {
        match err {
            TagDeleteError::InUse { .. } => ApiError::Conflict(err.to_string()),
            TagDeleteError::Database(e) => ApiError::from(e),
        }
    }
}

/// Convert storage errors to API errors
impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        ApiError::InternalError(format!("Storage operation failed: {}", err))
    }
}

/// Convert validator failures to 422 with per-field details
impl From<validator::ValidationErrors> for ApiError {
    fn from(e: validator::ValidationErrors) -> Self {
        let errors: Vec<ValidationErrorDetail> = e
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();

        ApiError::ValidationError(errors)
    }
}
