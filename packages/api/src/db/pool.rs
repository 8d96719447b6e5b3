//! Connection pool construction and migrations.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Opens a pool for `database_url`. The caller owns the pool and injects it.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Applies the migrations under `packages/api/migrations`.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
