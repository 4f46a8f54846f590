//! Postgres persistence for task and video processing state.
//!
//! This crate provides:
//! - Connection pool setup
//! - The [`CompletionTracker`] seam and its Postgres implementation

pub mod config;
pub mod error;
pub mod tracker;

pub use config::DbConfig;
pub use error::{TrackerError, TrackerResult};
pub use tracker::{CompletionTracker, PgCompletionTracker};

use sqlx::postgres::PgPoolOptions;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool.
pub async fn create_pool(config: &DbConfig) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url())
        .await
}
