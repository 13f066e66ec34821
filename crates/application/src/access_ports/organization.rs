use async_trait::async_trait;

use cohort_core::AppResult;
use cohort_domain::OrganizationLevelDefault;

/// Repository port for organization-level access defaults.
#[async_trait]
pub trait OrganizationDefaultsRepository: Send + Sync {
    /// Finds the default configured for a resource type.
    async fn find_default(
        &self,
        resource_type: &str,
    ) -> AppResult<Option<OrganizationLevelDefault>>;
}
