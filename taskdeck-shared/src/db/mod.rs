//! Database layer
//!
//! Connection pool management and migration runner built on sqlx.
//!
//! - `pool`: PostgreSQL connection pool with health check
//! - `migrations`: embedded sqlx migrations

pub mod migrations;
pub mod pool;

pub use migrations::run_migrations;
pub use pool::{create_pool, DatabaseConfig};
