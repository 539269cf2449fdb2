//! PostgreSQL pool and schema migrations.

use std::time::Duration;

use sqlx::migrate::Migrator;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use tracing::info;

use kydohub_core::config::database::DatabaseConfig;
use kydohub_core::config::redact_url;
use kydohub_core::error::{AppError, ErrorKind};

/// Schema shipped with the binary.
static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// Name reported in `pg_stat_activity`.
const APPLICATION_NAME: &str = "kydohub";

/// Shared PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct DatabasePool {
    pool: PgPool,
}

impl DatabasePool {
    /// Open a pool sized and timed by `config`.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        let options: PgConnectOptions = config.url.parse().map_err(|e| {
            AppError::with_source(ErrorKind::Configuration, "Invalid database.url", e)
        })?;
        let options = options.application_name(APPLICATION_NAME);

        info!(
            target_db = %redact_url(&config.url),
            max = config.max_connections,
            min = config.min_connections,
            "Opening PostgreSQL pool"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections.min(config.max_connections))
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
            .test_before_acquire(true)
            .connect_with(options)
            .await
            .map_err(|e| database_error("Could not reach PostgreSQL", e))?;

        Ok(Self { pool })
    }

    /// Apply every pending migration.
    pub async fn migrate(&self) -> Result<(), AppError> {
        let known = MIGRATOR.iter().count();
        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| database_error("Schema migration failed", e))?;
        info!(migrations = known, "Schema up to date");
        Ok(())
    }

    /// The sqlx pool repositories run against.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Round trip to the server.
    pub async fn health_check(&self) -> Result<bool, AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| true)
            .map_err(|e| database_error("PostgreSQL health check failed", e))
    }

    /// Drain and close every connection.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("PostgreSQL pool closed");
    }
}

fn database_error(
    message: &str,
    source: impl std::error::Error + Send + Sync + 'static,
) -> AppError {
    AppError::with_source(ErrorKind::Database, format!("{message}: {source}"), source)
}
