use async_trait::async_trait;

use cohort_application::OrganizationDefaultsRepository;
use cohort_core::{AppError, AppResult};
use cohort_domain::OrganizationLevelDefault;

use sqlx::{FromRow, PgPool};

use crate::postgres_decode::decode_value;

/// PostgreSQL-backed repository for organization-level access defaults.
#[derive(Clone)]
pub struct PostgresOrganizationDefaultsRepository {
    pool: PgPool,
}

impl PostgresOrganizationDefaultsRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct OrganizationDefaultRow {
    resource_type: String,
    access_type: String,
}

#[async_trait]
impl OrganizationDefaultsRepository for PostgresOrganizationDefaultsRepository {
    async fn find_default(
        &self,
        resource_type: &str,
    ) -> AppResult<Option<OrganizationLevelDefault>> {
        let row = sqlx::query_as::<_, OrganizationDefaultRow>(
            r#"
            SELECT resource_type, access_type
            FROM organization_level_defaults
            WHERE resource_type = $1
            "#,
        )
        .bind(resource_type)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to load organization default for '{resource_type}': {error}"
            ))
        })?;

        row.map(|row| {
            Ok(OrganizationLevelDefault {
                access: decode_value(&row.access_type, "organization access type")?,
                resource_type: row.resource_type,
            })
        })
        .transpose()
    }
}

#[cfg(test)]
mod tests {
    use cohort_application::OrganizationDefaultsRepository;
    use cohort_domain::OrganizationAccess;

    use crate::postgres_test_support::{test_pool, unique_id};

    use super::PostgresOrganizationDefaultsRepository;

    #[tokio::test]
    async fn find_default_returns_none_for_unconfigured_type() {
        let Some(pool) = test_pool().await else {
            return;
        };
        let repository = PostgresOrganizationDefaultsRepository::new(pool.clone());

        let resource_type = unique_id("Questionnaire");
        let insert = sqlx::query(
            r#"
                INSERT INTO organization_level_defaults (resource_type, access_type)
                VALUES ($1, 'public-read-only')
                "#,
        )
        .bind(&resource_type)
        .execute(&pool)
        .await;
        assert!(insert.is_ok());

        let configured = repository.find_default(&resource_type).await;
        assert!(matches!(
            configured,
            Ok(Some(ref default)) if default.access == OrganizationAccess::PublicReadOnly
        ));

        let missing = repository.find_default(&unique_id("Unconfigured")).await;
        assert!(matches!(missing, Ok(None)));
    }
}
