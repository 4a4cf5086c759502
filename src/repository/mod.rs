//! Data access layer

pub mod assignment;
pub mod memory;

pub use assignment::{AssignmentRepository, MySqlAssignmentRepository};
pub use memory::MemoryAssignmentRepository;

use crate::config::DatabaseConfig;
use crate::error::Result;
use sqlx::mysql::MySqlPoolOptions;
use sqlx::MySqlPool;

/// Build the MySQL connection pool from configuration.
pub async fn connect_pool(config: &DatabaseConfig) -> Result<MySqlPool> {
    let pool = MySqlPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect(&config.url)
        .await?;
    Ok(pool)
}
