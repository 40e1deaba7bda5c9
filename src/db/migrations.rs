use sqlx::{Pool, Sqlite};
use tracing::info;

/// Run all pending database migrations
///
/// The jobs table migration uses `CREATE TABLE IF NOT EXISTS`, so databases
/// created before migrations were tracked are adopted as they are.
pub async fn run_migrations(pool: &Pool<Sqlite>) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Running database migrations...");

    // sqlx::migrate!() macro embeds migrations at compile time
    // from the migrations/ directory
    sqlx::migrate!("./migrations").run(pool).await?;

    info!("Database migrations completed successfully");
    Ok(())
}
