use std::sync::Arc;

use chrono::{DateTime, Utc};
use cohort_core::AppResult;
use cohort_domain::{
    CareTeam, Policy, PolicyAssignment, Reference, ReferenceKind, ResourceAction,
    dedupe_references,
};

use crate::access_ports::{CareTeamRepository, PolicyAssignmentRepository, PolicyRepository};

/// Policy, assignment and care team lookups backing policy-based access.
#[derive(Clone)]
pub struct PolicyStore {
    policies: Arc<dyn PolicyRepository>,
    assignments: Arc<dyn PolicyAssignmentRepository>,
    care_teams: Arc<dyn CareTeamRepository>,
}

impl PolicyStore {
    /// Creates a store from its three repositories.
    #[must_use]
    pub fn new(
        policies: Arc<dyn PolicyRepository>,
        assignments: Arc<dyn PolicyAssignmentRepository>,
        care_teams: Arc<dyn CareTeamRepository>,
    ) -> Self {
        Self {
            policies,
            assignments,
            care_teams,
        }
    }

    /// Returns the active allow policies among `policy_references` that
    /// permit every action in `actions`.
    pub async fn find_policies(
        &self,
        policy_references: &[Reference],
        actions: &[ResourceAction],
    ) -> AppResult<Vec<Policy>> {
        let policy_ids: Vec<String> = dedupe_references(policy_references)
            .iter()
            .filter(|reference| reference.kind() == &ReferenceKind::Policy)
            .map(|reference| reference.id().to_owned())
            .collect();
        if policy_ids.is_empty() {
            return Ok(Vec::new());
        }

        self.policies
            .list_allow_policies(&policy_ids, actions)
            .await
    }

    /// Returns the assignments granted to `principal` within any of
    /// `resource_scopes`.
    pub async fn find_assignments(
        &self,
        principal: &Reference,
        resource_scopes: &[Reference],
    ) -> AppResult<Vec<PolicyAssignment>> {
        if resource_scopes.is_empty() {
            return Ok(Vec::new());
        }

        self.assignments
            .list_assignments(principal, resource_scopes)
            .await
    }

    /// Returns the current care teams serving `scope` on which `member` is
    /// an active participant.
    ///
    /// The team-level period is checked by the repository query and the
    /// participant-level period here; both must be open at `now`.
    pub async fn find_care_teams(
        &self,
        member: &Reference,
        scope: &[Reference],
        now: DateTime<Utc>,
    ) -> AppResult<Vec<CareTeam>> {
        if scope.is_empty() {
            return Ok(Vec::new());
        }

        let teams = self.care_teams.list_current_care_teams(scope, now).await?;
        Ok(teams
            .into_iter()
            .filter(|team| team.has_current_member(member, now))
            .collect())
    }
}
