//! Database migration runner
//!
//! Migrations live in the `migrations/` directory at the workspace root and
//! are embedded into the binary via `sqlx::migrate!`. Each migration is a
//! plain SQL file named `{version}_{name}.sql`.
//!
//! # Example
//!
//! ```no_run
//! use taskdeck_shared::db::pool::{create_pool, DatabaseConfig};
//! use taskdeck_shared::db::migrations::run_migrations;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = create_pool(DatabaseConfig::default()).await?;
//! run_migrations(&pool).await?;
//! # Ok(())
//! # }
//! ```

use sqlx::postgres::PgPool;
use tracing::{info, warn};

/// Runs all pending database migrations
///
/// Migrations are applied in version order; already-applied migrations are
/// skipped. A failed migration is rolled back and the error returned.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Running database migrations");

    match sqlx::migrate!("../migrations").run(pool).await {
        Ok(()) => {
            info!("Database migrations up to date");
            Ok(())
        }
        Err(e) => {
            warn!("Migration failed: {}", e);
            Err(e)
        }
    }
}
