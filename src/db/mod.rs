//! PostGIS pool, schema migrations and the readiness check

use serde::Serialize;
use sqlx::migrate::MigrateError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

use crate::config::Config;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Cannot reach database: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("Schema migration failed: {0}")]
    Migrate(#[from] MigrateError),

    /// The server answers but spatial queries would fail
    #[error("PostGIS is not available: {0}")]
    PostgisMissing(#[source] sqlx::Error),
}

/// What the readiness check learned about the database
#[derive(Debug, Clone, Serialize)]
pub struct DbStatus {
    pub postgis_version: String,
}

/// Connect the pool. Acquire waits are bounded so handlers fail fast when
/// every connection is busy.
pub async fn create_pool(config: &Config) -> Result<PgPool, DbError> {
    tracing::info!(
        url = %config.database_url_masked(),
        max_connections = config.db_max_connections,
        "Connecting to database"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(600))
        .connect(&config.database_url)
        .await
        .map_err(DbError::Connect)?;

    Ok(pool)
}

/// Apply `migrations/`, which also installs the postgis extension
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    sqlx::migrate!("./migrations").run(pool).await?;

    let status = check_health(pool).await?;
    tracing::info!(postgis = %status.postgis_version, "Schema up to date");

    Ok(())
}

/// Readiness check: the database answers and has PostGIS loaded
pub async fn check_health(pool: &PgPool) -> Result<DbStatus, DbError> {
    let postgis_version = sqlx::query_scalar::<_, String>("SELECT postgis_lib_version()")
        .fetch_one(pool)
        .await
        .map_err(classify_health_error)?;

    Ok(DbStatus { postgis_version })
}

/// A missing function means the extension is absent; anything else is
/// treated as a connectivity problem.
fn classify_health_error(err: sqlx::Error) -> DbError {
    let undefined_function = err
        .as_database_error()
        .and_then(|e| e.code())
        .is_some_and(|code| code == "42883");

    if undefined_function {
        DbError::PostgisMissing(err)
    } else {
        DbError::Connect(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_errors_are_connectivity_failures() {
        let err = classify_health_error(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, DbError::Connect(_)));
        assert!(err.to_string().starts_with("Cannot reach database"));
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_health_check_reports_postgis_version() {
        let url = std::env::var("TEST_DATABASE_URL")
            .unwrap_or_else(|_| "postgresql://localhost/bikeshare_test".to_string());
        let pool = PgPool::connect(&url).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let status = check_health(&pool).await.unwrap();
        assert!(!status.postgis_version.is_empty());
    }
}
