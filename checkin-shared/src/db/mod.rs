/// Database layer for Easy CheckIn
///
/// # Modules
///
/// - `pool`: SQLite connection pool management with health checks
/// - `migrations`: Schema migrations, applied on startup
///
/// Models live in the `models` module at crate root level.
///
/// # Example
///
/// ```no_run
/// use checkin_shared::db::{migrations::run_migrations, pool::{create_pool, DatabaseConfig}};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig {
///         url: "sqlite://instance/attendance.db".to_string(),
///         ..Default::default()
///     };
///
///     let pool = create_pool(config).await?;
///     run_migrations(&pool).await?;
///     Ok(())
/// }
/// ```

pub mod migrations;
pub mod pool;
