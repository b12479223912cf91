use ferret_db::Database;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

/// Opens a fresh in-memory SQLite database with all migrations applied.
///
/// Each in-memory connection is its own database, so the pool is capped at a
/// single connection.
pub async fn setup_test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory SQLite");

    Database::from_pool(pool.clone())
        .migrate()
        .await
        .expect("Failed to run migrations");

    pool
}
