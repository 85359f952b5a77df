//! CLI command implementations.

pub mod migrate;
pub mod users;

use comfycart_storefront::config::{ConfigError, get_database_url};
use sqlx::PgPool;

/// Connect to the storefront database named by `STOREFRONT_DATABASE_URL`.
async fn connect() -> Result<PgPool, CommandError> {
    dotenvy::dotenv().ok();
    let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;

    tracing::info!("Connecting to storefront database...");
    Ok(comfycart_storefront::db::create_pool(&database_url).await?)
}

/// Errors that can occur while running a command.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Repository error: {0}")]
    Repository(#[from] comfycart_storefront::db::RepositoryError),
}
