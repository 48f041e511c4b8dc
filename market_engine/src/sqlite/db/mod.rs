//! # SQLite database methods
//!
//! "Low-level" SQLite interactions. Each is a free function taking a `&mut SqliteConnection`, so callers can run it
//! on a pooled connection or inside a transaction (pass `&mut tx`) without any other changes.
//!
//! Timestamps are supplied by the caller rather than `CURRENT_TIMESTAMP`, so that every row written in one transaction
//! carries the same instant and sub-second ordering is preserved.
use std::{env, str::FromStr, time::Duration};

use log::*;
use sqlx::{
    migrate::MigrateError,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Error as SqlxError,
    SqlitePool,
};

pub mod commissions;
pub mod notifications;
pub mod orders;
pub mod payment_proofs;

const SQLITE_DB_URL: &str = "sqlite://data/marketplace.db";
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub fn db_url() -> String {
    let result = env::var("MKT_DATABASE_URL").unwrap_or_else(|_| {
        info!("🗃️ MKT_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("🗃️ Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true).busy_timeout(BUSY_TIMEOUT);
    let pool = SqlitePoolOptions::new().max_connections(max_connections.max(1)).connect_with(options).await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), MigrateError> {
    sqlx::migrate!("./src/sqlite/migrations").run(pool).await?;
    debug!("🗃️ Migrations complete");
    Ok(())
}
