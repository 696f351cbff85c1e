//! Common test utilities for integration tests
//!
//! Provides shared infrastructure:
//! - test database setup (pool + migrations)
//! - test user creation and JWT tokens
//! - request/response helpers for driving the router

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use sqlx::PgPool;
use tower::Service as _;
use uuid::Uuid;

use taskdeck_api::app::{build_router, AppState};
use taskdeck_api::config::Config;
use taskdeck_shared::auth::jwt::{create_token, Claims};
use taskdeck_shared::models::user::{CreateUser, User};
use taskdeck_shared::storage::MemoryBlobStore;

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    pub config: Config,
    pub storage: Arc<MemoryBlobStore>,
    pub user: User,
    pub jwt_token: String,
}

impl TestContext {
    /// Creates a new test context with a fresh primary user
    ///
    /// Requires `DATABASE_URL` and `JWT_SECRET` in the environment (or a
    /// .env file). Attachments go to an in-memory blob store.
    pub async fn new() -> anyhow::Result<Self> {
        let config = Config::from_env()?;

        let db = PgPool::connect(&config.database.url).await?;

        // Path relative to the taskdeck-api manifest
        sqlx::migrate!("../migrations").run(&db).await?;

        let storage = Arc::new(MemoryBlobStore::new());

        let state = AppState::new(db.clone(), config.clone(), storage.clone());
        let app = build_router(state);

        let mut ctx = TestContext {
            db,
            app,
            config,
            storage,
            // placeholder, replaced right below
            user: User {
                id: Uuid::nil(),
                name: String::new(),
                login_id: String::new(),
                email: String::new(),
                password_hash: String::new(),
                avatar_url: None,
                timezone: String::new(),
                notification_enabled: true,
                created_at: chrono::Utc::now(),
                updated_at: chrono::Utc::now(),
            },
            jwt_token: String::new(),
        };

        let (user, token) = ctx.create_user("Primary User").await?;
        ctx.user = user;
        ctx.jwt_token = token;

        Ok(ctx)
    }

    /// Creates an additional user directly in the database with a token
    pub async fn create_user(&self, name: &str) -> anyhow::Result<(User, String)> {
        let suffix = Uuid::new_v4();

        let user = User::create(
            &self.db,
            CreateUser {
                name: name.to_string(),
                login_id: format!("user-{}", suffix),
                email: format!("{}@example.com", suffix),
                password_hash: "$argon2id$unused-in-tests".to_string(),
                timezone: "Asia/Tokyo".to_string(),
                notification_enabled: true,
            },
        )
        .await?;

        let claims = Claims::new(user.id);
        let token = create_token(&claims, &self.config.jwt.secret)?;

        Ok((user, token))
    }

    /// Returns authorization header value for the primary user
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.jwt_token)
    }

    /// Sends a JSON request as the given token holder
    ///
    /// Returns status and parsed body (Null for empty bodies).
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if !token.is_empty() {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, value)
    }

    /// Creates a project via the API and returns its id
    pub async fn create_project(&self, token: &str, name: &str) -> Uuid {
        let (status, body) = self
            .request(
                "POST",
                "/api/v1/projects",
                token,
                Some(serde_json::json!({ "name": name })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "project creation failed: {}", body);

        body["id"].as_str().unwrap().parse().unwrap()
    }

    /// Creates a task via the API and returns its id
    pub async fn create_task(&self, token: &str, project_id: Uuid, title: &str) -> Uuid {
        let (status, body) = self
            .request(
                "POST",
                "/api/v1/tasks",
                token,
                Some(serde_json::json!({
                    "title": title,
                    "project_id": project_id,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "task creation failed: {}", body);

        body["id"].as_str().unwrap().parse().unwrap()
    }

    /// Removes data created under this context's primary user
    ///
    /// Tasks and tags don't cascade from projects, so they go first;
    /// comments, attachments, and tag assignments cascade from tasks.
    /// Users are left behind on purpose (accounts are never hard-deleted).
    pub async fn cleanup(&self) -> anyhow::Result<()> {
        sqlx::query(
            "DELETE FROM tasks WHERE project_id IN (SELECT id FROM projects WHERE owner_id = $1)",
        )
        .bind(self.user.id)
        .execute(&self.db)
        .await?;

        sqlx::query(
            "DELETE FROM tags WHERE created_by = $1 \
             OR project_id IN (SELECT id FROM projects WHERE owner_id = $1)",
        )
        .bind(self.user.id)
        .execute(&self.db)
        .await?;

        sqlx::query("DELETE FROM notifications WHERE user_id = $1")
            .bind(self.user.id)
            .execute(&self.db)
            .await?;

        sqlx::query("DELETE FROM projects WHERE owner_id = $1")
            .bind(self.user.id)
            .execute(&self.db)
            .await?;

        Ok(())
    }
}
