//! Application state and router builder
//!
//! Defines the shared application state and builds the Axum router with all
//! routes and middleware.
//!
//! # Routes
//!
//! ```text
//! /
//! ├── /health                      # Health check (public)
//! └── /api/v1/
//!     ├── /auth/                   # register, login (public)
//!     ├── /users/                  # profile endpoints
//!     ├── /projects/               # projects and members
//!     ├── /tasks/                  # tasks, subtasks, calendar, tags
//!     ├── /comments/               # comments and attachments
//!     └── /tags/                   # tags and notifications
//! ```
//!
//! Everything under /api/v1 except /auth requires a bearer token; the
//! middleware validates it and injects an `AuthContext` into request
//! extensions.

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Request},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use taskdeck_shared::auth::{
    jwt,
    middleware::{AuthContext, AuthError},
};
use taskdeck_shared::models::attachment::MAX_ATTACHMENT_BYTES;
use taskdeck_shared::storage::BlobStore;

use crate::config::Config;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Attachment blob store
    pub storage: Arc<dyn BlobStore>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config, storage: Arc<dyn BlobStore>) -> Self {
        Self {
            db,
            config: Arc::new(config),
            storage,
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Auth routes (public, no auth required)
    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login));

    let users_routes = Router::new()
        .route("/me", get(routes::users::get_me).put(routes::users::update_me))
        .route("/:id", get(routes::users::get_user));

    let projects_routes = Router::new()
        .route(
            "/",
            post(routes::projects::create_project).get(routes::projects::list_projects),
        )
        .route(
            "/:id",
            get(routes::projects::get_project)
                .put(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        )
        .route(
            "/:id/members",
            post(routes::projects::add_member).get(routes::projects::list_members),
        );

    let tasks_routes = Router::new()
        .route(
            "/",
            post(routes::tasks::create_task).get(routes::tasks::list_tasks),
        )
        .route("/calendar", get(routes::tasks::list_calendar))
        .route(
            "/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route("/:id/subtasks", get(routes::tasks::list_subtasks))
        .route(
            "/:id/tags",
            post(routes::tasks::attach_tag).get(routes::tasks::list_task_tags),
        )
        .route("/:id/tags/:tag_id", axum::routing::delete(routes::tasks::detach_tag));

    // Attachment uploads go through multipart; raise the body cap just above
    // the attachment limit so our own 413 check decides, not the framework.
    let comments_routes = Router::new()
        .route("/", post(routes::comments::create_comment))
        .route("/task/:task_id", get(routes::comments::list_comments))
        .route(
            "/:id",
            put(routes::comments::update_comment).delete(routes::comments::delete_comment),
        )
        .route(
            "/task/:task_id/attachments",
            post(routes::comments::upload_attachment).get(routes::comments::list_attachments),
        )
        .route(
            "/attachments/:id",
            get(routes::comments::download_attachment)
                .delete(routes::comments::delete_attachment),
        )
        .layer(DefaultBodyLimit::max(MAX_ATTACHMENT_BYTES + 64 * 1024));

    let tags_routes = Router::new()
        .route(
            "/",
            post(routes::tags::create_tag).get(routes::tags::list_tags),
        )
        .route("/notifications", get(routes::tags::list_notifications))
        .route("/notifications/read-all", put(routes::tags::mark_all_notifications_read))
        .route("/notifications/:id/read", put(routes::tags::mark_notification_read))
        .route(
            "/:id",
            put(routes::tags::update_tag).delete(routes::tags::delete_tag),
        );

    // Everything except /auth requires a valid bearer token
    let protected = Router::new()
        .nest("/users", users_routes)
        .nest("/projects", projects_routes)
        .nest("/tasks", tasks_routes)
        .nest("/comments", comments_routes)
        .nest("/tags", tags_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let v1_routes = Router::new().nest("/auth", auth_routes).merge(protected);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/api/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::security::security_headers,
        ))
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Extracts and validates the bearer token from the Authorization header,
/// then injects an [`AuthContext`] into request extensions.
async fn jwt_auth_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?;

    let claims = jwt::validate_token(token, state.jwt_secret())
        .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

    req.extensions_mut().insert(AuthContext::from_jwt(claims.sub));

    Ok(next.run(req).await)
}
