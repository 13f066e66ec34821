use async_trait::async_trait;
use chrono::{DateTime, Utc};

use cohort_core::AppResult;
use cohort_domain::{CareTeam, Policy, PolicyAssignment, Reference, ResourceAction};

/// Repository port for policy documents.
#[async_trait]
pub trait PolicyRepository: Send + Sync {
    /// Lists active, non-deleted allow policies among `policy_ids` that
    /// permit every action in `actions`, either exactly or through the
    /// action's resource wildcard.
    async fn list_allow_policies(
        &self,
        policy_ids: &[String],
        actions: &[ResourceAction],
    ) -> AppResult<Vec<Policy>>;
}

/// Repository port for policy assignments.
#[async_trait]
pub trait PolicyAssignmentRepository: Send + Sync {
    /// Lists non-deleted assignments for `principal` scoped to any of
    /// `resource_scopes`.
    async fn list_assignments(
        &self,
        principal: &Reference,
        resource_scopes: &[Reference],
    ) -> AppResult<Vec<PolicyAssignment>>;
}

/// Repository port for care team rosters.
#[async_trait]
pub trait CareTeamRepository: Send + Sync {
    /// Lists non-deleted care teams serving any of `scope` (by study or
    /// site) whose team-level period has not ended at `now`.
    async fn list_current_care_teams(
        &self,
        scope: &[Reference],
        now: DateTime<Utc>,
    ) -> AppResult<Vec<CareTeam>>;
}
