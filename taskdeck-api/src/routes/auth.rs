//! Authentication endpoints
//!
//! # Endpoints
//!
//! - `POST /api/v1/auth/register` - register a new user
//! - `POST /api/v1/auth/login` - login and receive an access token

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use taskdeck_shared::auth::{jwt, password};
use taskdeck_shared::models::user::{CreateUser, User};

use crate::{app::AppState, error::ApiResult};

fn default_timezone() -> String {
    "Asia/Tokyo".to_string()
}

fn default_notification_enabled() -> bool {
    true
}

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    /// Login identifier
    #[validate(length(min = 1, max = 50, message = "Login ID must be 1-50 characters"))]
    pub login_id: String,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    /// IANA timezone name
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Whether to receive notifications
    #[serde(default = "default_notification_enabled")]
    pub notification_enabled: bool,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Login identifier
    #[validate(length(min = 1, message = "Login ID is required"))]
    pub login_id: String,

    /// Password
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Bearer access token
    pub access_token: String,

    /// Always "bearer"
    pub token_type: String,
}

/// Register a new user
///
/// # Errors
///
/// - `409 Conflict`: login_id or email already exists
/// - `422 Unprocessable Entity`: validation failed
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Json<User>> {
    req.validate()?;

    let password_hash = password::hash_password(&req.password)?;

    // No pre-check: the unique constraints on login_id and email decide
    // concurrent duplicate registrations, surfacing as 409.
    let user = User::create(
        &state.db,
        CreateUser {
            name: req.name,
            login_id: req.login_id,
            email: req.email,
            password_hash,
            timezone: req.timezone,
            notification_enabled: req.notification_enabled,
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok(Json(user))
}

/// Login and receive an access token
///
/// # Errors
///
/// - `401 Unauthorized`: unknown login_id or wrong password (the response
///   carries a `WWW-Authenticate: Bearer` challenge)
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    req.validate()?;

    let user = User::find_by_login_id(&state.db, &req.login_id)
        .await?
        .ok_or_else(|| {
            crate::error::ApiError::Unauthorized("Incorrect login_id or password".to_string())
        })?;

    let valid = password::verify_password(&req.password, &user.password_hash)?;
    if !valid {
        return Err(crate::error::ApiError::Unauthorized(
            "Incorrect login_id or password".to_string(),
        ));
    }

    let claims = jwt::Claims::new(user.id);
    let access_token = jwt::create_token(&claims, state.jwt_secret())?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}
