use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use tracing::info;

use crate::auth::password::PasswordError;
use crate::config::DatabaseConfig;
use crate::filter::FilterError;

/// Errors from the data-access layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Duplicate(String),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Pool construction and process-level database chores
pub struct DatabaseManager;

impl DatabaseManager {
    fn options(config: &DatabaseConfig) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
    }

    /// Connects eagerly so a bad DATABASE_URL fails at startup
    pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        if config.url.is_empty() {
            return Err(DatabaseError::ConfigMissing("DATABASE_URL"));
        }
        let pool = Self::options(config).connect(&config.url).await?;
        info!("PostgreSQL connection pool established");
        Ok(pool)
    }

    /// Pool that opens connections on first use
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        if config.url.is_empty() {
            return Err(DatabaseError::ConfigMissing("DATABASE_URL"));
        }
        Ok(Self::options(config).connect_lazy(&config.url)?)
    }

    pub async fn run_migrations(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(|e| DatabaseError::MigrationError(e.to_string()))?;
        info!("Database migrations applied");
        Ok(())
    }

    pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_url_is_reported_as_missing() {
        let config = DatabaseConfig {
            url: String::new(),
            max_connections: 1,
            connection_timeout: 1,
            run_migrations: false,
            enable_query_logging: false,
        };
        assert!(matches!(
            DatabaseManager::connect_lazy(&config),
            Err(DatabaseError::ConfigMissing("DATABASE_URL"))
        ));
    }
}
