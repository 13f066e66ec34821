use cohort_core::{AppError, AppResult};
use sqlx::PgPool;
use sqlx::migrate::Migrator;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Applies the access-control schema migrations to `pool`.
pub async fn run_migrations(pool: &PgPool) -> AppResult<()> {
    MIGRATOR
        .run(pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))
}
