use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;

/// Open a pooled connection to the relational store.
///
/// The pool is deliberately small; every handler issues at most a handful of
/// short parameterized statements per request.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> anyhow::Result<DatabaseConnection> {
    let mut opts = ConnectOptions::new(database_url);
    opts.max_connections(10)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(5))
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(300))
        .sqlx_logging(false);

    let db = Database::connect(opts).await?;
    Ok(db)
}
