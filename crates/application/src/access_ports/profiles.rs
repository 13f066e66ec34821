use async_trait::async_trait;

use cohort_core::AppResult;
use cohort_domain::{Profile, ResearchSubject, ResearchSubjectCriteria};

/// Repository port for profile lookups.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Lists profiles among `profile_ids` that are active and not deleted.
    async fn list_active_profiles(&self, profile_ids: &[String]) -> AppResult<Vec<Profile>>;
}

/// Repository port for research subject lookups.
#[async_trait]
pub trait ResearchSubjectRepository: Send + Sync {
    /// Lists non-deleted research subjects among `subject_ids`, excluding
    /// those rejected by `criteria`.
    async fn list_research_subjects(
        &self,
        subject_ids: &[String],
        criteria: Option<&ResearchSubjectCriteria>,
    ) -> AppResult<Vec<ResearchSubject>>;
}
