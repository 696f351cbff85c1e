//! User profile endpoints
//!
//! # Endpoints
//!
//! - `GET /api/v1/users/me` - current user
//! - `PUT /api/v1/users/me` - update current user
//! - `GET /api/v1/users/:id` - look up a user

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use taskdeck_shared::auth::middleware::AuthContext;
use taskdeck_shared::models::user::{UpdateUser, User};

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};

/// Update request for the current user's profile
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateMeRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(max = 500, message = "Avatar URL too long"))]
    pub avatar_url: Option<String>,

    pub timezone: Option<String>,

    pub notification_enabled: Option<bool>,
}

async fn load_current_user(state: &AppState, auth: &AuthContext) -> ApiResult<User> {
    User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Could not validate credentials".to_string()))
}

/// Current user's profile
pub async fn get_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<User>> {
    let user = load_current_user(&state, &auth).await?;
    Ok(Json(user))
}

/// Update the current user's profile
///
/// # Errors
///
/// - `409 Conflict`: new email already belongs to another user
pub async fn update_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<UpdateMeRequest>,
) -> ApiResult<Json<User>> {
    req.validate()?;

    let mut user = load_current_user(&state, &auth).await?;

    if let Some(ref email) = req.email {
        if User::email_taken(&state.db, email, user.id).await? {
            return Err(ApiError::Conflict("Email already exists".to_string()));
        }
    }

    user.apply(UpdateUser {
        name: req.name,
        email: req.email,
        avatar_url: req.avatar_url,
        timezone: req.timezone,
        notification_enabled: req.notification_enabled,
    });

    let user = user.persist(&state.db).await?;

    Ok(Json(user))
}

/// Look up a user by id
pub async fn get_user(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<User>> {
    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}
