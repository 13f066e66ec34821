use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

/// Connects to `DATABASE_URL` and applies migrations, or returns `None`
/// when the variable is unset so database tests are skipped.
pub(crate) async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = crate::run_migrations(&pool).await {
        panic!("failed to run migrations for postgres access tests: {error}");
    }

    Some(pool)
}

/// Returns an id unique to this test run.
pub(crate) fn unique_id(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}

pub(crate) async fn insert_profile(pool: &PgPool, id: &str, profile_type: &str, status: &str) {
    let insert = sqlx::query(
        r#"
            INSERT INTO user_profiles (id, profile_type, status, family_name, given_names)
            VALUES ($1, $2, $3, 'Doe', ARRAY['Jane', 'Q'])
            "#,
    )
    .bind(id)
    .bind(profile_type)
    .bind(status)
    .execute(pool)
    .await;

    assert!(insert.is_ok());
}
