use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Error, Pool, Sqlite};

/// Open the SQLite jobs database
///
/// # Parameters
/// - `database_url`: SQLite connection string
///   Format: sqlite://PATH/TO/jobs.db
///
/// # Returns
/// A pool holding a single connection. The tracker assumes one writer at a
/// time, and every operation borrows the connection only for its own duration.
/// The database file is created when missing.
pub async fn get_connection(database_url: &str) -> Result<Pool<Sqlite>, Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
}
