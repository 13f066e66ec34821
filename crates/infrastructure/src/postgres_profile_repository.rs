use async_trait::async_trait;

use cohort_application::{ProfileRepository, ResearchSubjectRepository};
use cohort_core::{AppError, AppResult};
use cohort_domain::{HumanName, Profile, ResearchSubject, ResearchSubjectCriteria};

use sqlx::{FromRow, PgPool};

use crate::postgres_decode::{decode_optional_reference, decode_reference, decode_value};

mod research_subjects;


/// PostgreSQL-backed repository for user profiles and research subjects.
#[derive(Clone)]
pub struct PostgresProfileRepository {
    pool: PgPool,
}

impl PostgresProfileRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ProfileRow {
    id: String,
    profile_type: String,
    status: String,
    family_name: Option<String>,
    given_names: Vec<String>,
    is_deleted: bool,
}

impl ProfileRow {
    fn into_profile(self) -> AppResult<Profile> {
        Ok(Profile {
            profile_type: decode_value(&self.profile_type, "profile type")?,
            status: decode_value(&self.status, "profile status")?,
            name: HumanName {
                family: self.family_name,
                given: self.given_names,
            },
            is_deleted: self.is_deleted,
            id: self.id,
        })
    }
}

#[async_trait]
impl ProfileRepository for PostgresProfileRepository {
    async fn list_active_profiles(&self, profile_ids: &[String]) -> AppResult<Vec<Profile>> {
        let rows = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT id, profile_type, status, family_name, given_names, is_deleted
            FROM user_profiles
            WHERE id = ANY($1)
              AND status = 'active'
              AND is_deleted = FALSE
            ORDER BY id
            "#,
        )
        .bind(profile_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load user profiles: {error}")))?;

        rows.into_iter().map(ProfileRow::into_profile).collect()
    }
}

#[async_trait]
impl ResearchSubjectRepository for PostgresProfileRepository {
    async fn list_research_subjects(
        &self,
        subject_ids: &[String],
        criteria: Option<&ResearchSubjectCriteria>,
    ) -> AppResult<Vec<ResearchSubject>> {
        self.list_research_subjects_impl(subject_ids, criteria)
            .await
    }
}
