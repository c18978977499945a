use sqlx::{postgres::PgPoolOptions, PgPool};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

/// Upper bound for any single statement against the store.
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(3);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Unique constraint guarding `users.email`.
pub const USERS_EMAIL_KEY: &str = "users_email_key";

/// Errors from the data layer. The first three are domain outcomes that
/// handlers translate into specific responses; everything else is opaque.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("record not found")]
    NotFound,

    #[error("edit conflict")]
    EditConflict,

    #[error("duplicate email")]
    DuplicateEmail,

    #[error("user has no password hash")]
    MissingPasswordHash,

    #[error("query exceeded {0:?}")]
    Timeout(Duration),

    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Map a write error, turning the users email constraint into
    /// `DuplicateEmail`.
    pub fn from_write(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.constraint() == Some(USERS_EMAIL_KEY) {
                return DatabaseError::DuplicateEmail;
            }
        }
        DatabaseError::Sqlx(err)
    }
}

/// Run a store future under `QUERY_TIMEOUT`.
pub async fn with_timeout<T, F>(fut: F) -> Result<T, DatabaseError>
where
    F: Future<Output = Result<T, DatabaseError>>,
{
    tokio::time::timeout(QUERY_TIMEOUT, fut)
        .await
        .map_err(|_| DatabaseError::Timeout(QUERY_TIMEOUT))?
}

/// Builds and checks the shared connection pool.
pub struct DatabaseManager;

impl DatabaseManager {
    /// Open the pool and ping it once.
    pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        if config.dsn.is_empty() {
            return Err(DatabaseError::ConfigMissing("DATABASE_URL"));
        }

        let pool = PgPoolOptions::new()
            .max_connections(config.max_open_conns)
            .idle_timeout(config.max_idle_time)
            .acquire_timeout(CONNECT_TIMEOUT)
            .connect(&config.dsn)
            .await?;

        Self::health_check(&pool).await?;

        info!("Database connection pool established: {}", Self::redacted(&config.dsn)?);
        Ok(pool)
    }

    /// Pool that connects on first use. Used where no query is expected to
    /// run (or the caller tolerates the connection error surfacing later).
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_open_conns)
            .idle_timeout(config.max_idle_time)
            .acquire_timeout(CONNECT_TIMEOUT)
            .connect_lazy(&config.dsn)?;
        Ok(pool)
    }

    pub async fn migrate(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations").run(pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
        tokio::time::timeout(CONNECT_TIMEOUT, sqlx::query("SELECT 1").execute(pool))
            .await
            .map_err(|_| DatabaseError::Timeout(CONNECT_TIMEOUT))??;
        Ok(())
    }

    /// DSN with the password removed, for logging.
    fn redacted(dsn: &str) -> Result<String, DatabaseError> {
        let mut url = url::Url::parse(dsn).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        if url.password().is_some() {
            url.set_password(Some("xxxxx"))
                .map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        }
        Ok(url.into())
    }
}
