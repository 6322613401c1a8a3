/// Database connection pool management
///
/// Builds a SQLite pool with sqlx. The database file (and its parent
/// directory) is created on first connect, so a fresh checkout starts
/// with an empty but usable database.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Database used when `DATABASE_URL` is not set
pub const DEFAULT_DATABASE_URL: &str = "sqlite://instance/attendance.db";

/// Configuration for the database connection pool
///
/// All timeouts are specified in seconds for ease of configuration from environment variables.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// SQLite connection URL (e.g., "sqlite://instance/attendance.db" or "sqlite::memory:")
    pub url: String,

    /// Maximum number of connections in the pool
    ///
    /// In-memory databases must use 1: every connection gets its own database.
    pub max_connections: u32,

    /// Minimum number of idle connections to maintain
    pub min_connections: u32,

    /// Timeout for acquiring a connection from the pool (seconds)
    pub connect_timeout_seconds: u64,

    /// How long a connection can remain idle before being closed (seconds)
    ///
    /// None = connections never closed due to idle time
    pub idle_timeout_seconds: Option<u64>,

    /// Maximum lifetime of a connection before forced recycling (seconds)
    pub max_lifetime_seconds: Option<u64>,

    /// How long a write waits for another connection's lock (seconds)
    pub busy_timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout_seconds: 30,
            idle_timeout_seconds: Some(600),
            max_lifetime_seconds: Some(1800),
            busy_timeout_seconds: 5,
        }
    }
}

impl DatabaseConfig {
    /// Configuration for a private in-memory database
    ///
    /// Keeps exactly one connection alive for the lifetime of the pool,
    /// since dropping it would drop the database with it.
    pub fn in_memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            connect_timeout_seconds: 5,
            idle_timeout_seconds: None,
            max_lifetime_seconds: None,
            busy_timeout_seconds: 5,
        }
    }
}

/// Creates and initializes a SQLite connection pool
///
/// This function:
/// 1. Creates the parent directory of a file-backed database
/// 2. Opens the pool in WAL mode with `create_if_missing`, foreign keys
///    and a busy timeout, so concurrent writers queue instead of failing
/// 3. Performs a health check
///
/// # Errors
///
/// Returns an error if the URL is invalid, the file cannot be created,
/// or the health check fails.
pub async fn create_pool(config: DatabaseConfig) -> Result<SqlitePool, sqlx::Error> {
    info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        connect_timeout_seconds = config.connect_timeout_seconds,
        "Creating database connection pool"
    );

    if let Some(dir) = database_dir(&config.url) {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            debug!(dir = %dir.display(), "Creating database directory");
            std::fs::create_dir_all(dir).map_err(sqlx::Error::Io)?;
        }
    }

    let connect_options = SqliteConnectOptions::from_str(&config.url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(config.busy_timeout_seconds));

    let mut pool_options = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
        .idle_timeout(config.idle_timeout_seconds.map(Duration::from_secs))
        .max_lifetime(config.max_lifetime_seconds.map(Duration::from_secs));

    if config.max_connections == 1 {
        pool_options = pool_options.test_before_acquire(false);
    }

    let pool = pool_options.connect_with(connect_options).await?;

    health_check(&pool).await?;

    info!("Database connection pool created successfully");
    Ok(pool)
}

/// Directory holding a file-backed SQLite database, if the URL names one
fn database_dir(url: &str) -> Option<&Path> {
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))?;

    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() || path.starts_with(":memory:") {
        return None;
    }

    Path::new(path).parent()
}

/// Performs a health check on the database connection
///
/// # Errors
///
/// Returns an error if the health check query fails
pub async fn health_check(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    debug!("Performing database health check");

    let result: (i32,) = sqlx::query_as("SELECT 1").fetch_one(pool).await?;

    if result.0 == 1 {
        debug!("Database health check passed");
        Ok(())
    } else {
        warn!("Database health check returned unexpected value: {}", result.0);
        Err(sqlx::Error::Protocol(
            "Health check returned unexpected value".into(),
        ))
    }
}

/// Gracefully closes the connection pool
pub async fn close_pool(pool: SqlitePool) {
    info!("Closing database connection pool");
    pool.close().await;
    info!("Database connection pool closed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_config_default() {
        let config = DatabaseConfig::default();
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.min_connections, 1);
        assert_eq!(config.connect_timeout_seconds, 30);
        assert_eq!(config.idle_timeout_seconds, Some(600));
        assert_eq!(config.max_lifetime_seconds, Some(1800));
        assert_eq!(config.busy_timeout_seconds, 5);
    }

    #[test]
    fn test_in_memory_config_keeps_single_connection() {
        let config = DatabaseConfig::in_memory();
        assert_eq!(config.max_connections, 1);
        assert_eq!(config.idle_timeout_seconds, None);
        assert_eq!(config.max_lifetime_seconds, None);
    }

    #[test]
    fn test_database_dir() {
        assert_eq!(
            database_dir("sqlite://instance/attendance.db"),
            Some(Path::new("instance"))
        );
        assert_eq!(
            database_dir("sqlite:data/app.db?mode=rwc"),
            Some(Path::new("data"))
        );
        assert_eq!(database_dir("sqlite::memory:"), None);
        assert_eq!(database_dir("postgres://localhost/db"), None);
    }

    #[tokio::test]
    async fn test_in_memory_pool_health_check() {
        let pool = create_pool(DatabaseConfig::in_memory()).await.unwrap();
        assert!(health_check(&pool).await.is_ok());
        close_pool(pool).await;
    }
}
