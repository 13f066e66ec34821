use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::Utc;
use cohort_core::{AppError, AppResult};
use cohort_domain::{
    CareTeam, Policy, PolicyAssignment, Reference, ResourceAction, dedupe_references,
};
use futures::future::try_join_all;
use tracing::debug;

use crate::PolicyStore;
use crate::access_ports::ResearchSubjectRepository;

/// Resources each surviving policy was granted for, keyed by policy id.
type PolicyGrants = BTreeMap<String, BTreeSet<Reference>>;

/// Outcome of a resource-scoped policy request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceScopedGrant {
    /// Policies that grant the requested actions.
    pub granted_policies: Vec<Policy>,
    /// Requested resources covered by a granted policy and a care team.
    pub granted_resources: Vec<Reference>,
    /// Caller-supplied token echoed back unchanged.
    pub request_token: Option<String>,
}

impl ResourceScopedGrant {
    fn empty(request_token: Option<String>) -> Self {
        Self {
            request_token,
            ..Self::default()
        }
    }

    /// Returns whether nothing was granted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.granted_policies.is_empty()
    }
}

/// Resolves principal → assignment → policy → resource scope chains, gated
/// by active care team membership.
#[derive(Clone)]
pub struct PolicyManager {
    store: PolicyStore,
    research_subjects: Arc<dyn ResearchSubjectRepository>,
}

impl PolicyManager {
    /// Creates a policy manager.
    #[must_use]
    pub fn new(store: PolicyStore, research_subjects: Arc<dyn ResearchSubjectRepository>) -> Self {
        Self {
            store,
            research_subjects,
        }
    }

    /// Determines which of `scoped_resources` the requester may act on with
    /// every action in `actions`.
    ///
    /// A policy grant only survives when the requester is also a current
    /// member of a care team serving the same study or site.
    pub async fn request_resource_scoped_access(
        &self,
        requester: &Reference,
        scoped_resources: &[Reference],
        actions: &[ResourceAction],
        request_token: Option<String>,
    ) -> AppResult<ResourceScopedGrant> {
        if scoped_resources.is_empty() || actions.is_empty() {
            return Ok(ResourceScopedGrant::empty(request_token));
        }

        let assignments = self
            .store
            .find_assignments(requester, scoped_resources)
            .await?;
        let policy_references: Vec<Reference> = assignments
            .iter()
            .map(|assignment| assignment.policy.clone())
            .collect();

        let policies = self
            .store
            .find_policies(&policy_references, actions)
            .await?;
        if policies.is_empty() {
            debug!(requester = %requester, "no assigned policy permits the requested actions");
            return Ok(ResourceScopedGrant::empty(request_token));
        }

        let grants = grant_policies(&assignments, &policies);
        let policy_granted: Vec<Reference> = grants.values().flatten().cloned().collect();
        if policy_granted.is_empty() {
            return Ok(ResourceScopedGrant::empty(request_token));
        }

        let now = Utc::now();
        let care_teams = self
            .store
            .find_care_teams(requester, &dedupe_references(&policy_granted), now)
            .await?;
        if care_teams.is_empty() {
            debug!(
                requester = %requester,
                "policy grant vetoed: requester is on no current care team for the granted scope"
            );
            return Ok(ResourceScopedGrant::empty(request_token));
        }

        let gated = gate_by_care_teams(grants, &care_team_scope(&care_teams));
        let granted_policies: Vec<Policy> = policies
            .into_iter()
            .filter(|policy| gated.contains_key(&policy.id))
            .collect();
        let granted_resources: Vec<Reference> = dedupe_references(scoped_resources)
            .into_iter()
            .filter(|resource| gated.values().any(|resources| resources.contains(resource)))
            .collect();

        Ok(ResourceScopedGrant {
            granted_policies,
            granted_resources,
            request_token,
        })
    }

    /// Resolves each research subject to its study and site and requests
    /// resource-scoped access for each one concurrently.
    ///
    /// Only subjects with at least one granted policy appear in the result.
    pub async fn request_subject_scoped_access(
        &self,
        requester: &Reference,
        subject_references: &[Reference],
        actions: &[ResourceAction],
    ) -> AppResult<BTreeMap<Reference, Vec<Policy>>> {
        let subject_ids: Vec<String> = dedupe_references(subject_references)
            .iter()
            .filter(|reference| reference.is_research_subject())
            .map(|reference| reference.id().to_owned())
            .collect();
        if subject_ids.is_empty() {
            return Ok(BTreeMap::new());
        }

        let subjects = self
            .research_subjects
            .list_research_subjects(&subject_ids, None)
            .await?;
        if subjects.is_empty() {
            return Ok(BTreeMap::new());
        }

        let grants = try_join_all(subjects.iter().map(|subject| async move {
            let grant = self
                .request_resource_scoped_access(
                    requester,
                    &subject.resource_scope(),
                    actions,
                    None,
                )
                .await?;
            Ok::<_, AppError>((subject.reference()?, grant.granted_policies))
        }))
        .await?;

        Ok(grants
            .into_iter()
            .filter(|(_, policies)| !policies.is_empty())
            .collect())
    }
}

/// Maps each policy that passed the action filter to the scopes it was
/// assigned for.
fn grant_policies(assignments: &[PolicyAssignment], policies: &[Policy]) -> PolicyGrants {
    assignments
        .iter()
        .filter(|assignment| {
            policies
                .iter()
                .any(|policy| policy.id == assignment.policy.id())
        })
        .fold(PolicyGrants::new(), |mut grants, assignment| {
            grants
                .entry(assignment.policy.id().to_owned())
                .or_default()
                .insert(assignment.resource_scope.clone());
            grants
        })
}

/// Study and site references served by the given care teams.
fn care_team_scope(care_teams: &[CareTeam]) -> BTreeSet<Reference> {
    care_teams
        .iter()
        .flat_map(CareTeam::scoped_references)
        .collect()
}

/// Keeps only the granted scopes a care team also serves and drops policies
/// left without any scope.
fn gate_by_care_teams(grants: PolicyGrants, care_team_scope: &BTreeSet<Reference>) -> PolicyGrants {
    grants
        .into_iter()
        .filter_map(|(policy_id, resources)| {
            let kept: BTreeSet<Reference> = resources
                .intersection(care_team_scope)
                .cloned()
                .collect();
            (!kept.is_empty()).then_some((policy_id, kept))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use cohort_domain::{Policy, PolicyAssignment, PolicyEffect, PolicyStatus, Reference};

    use super::{gate_by_care_teams, grant_policies};

    fn reference(value: &str) -> Reference {
        Reference::parse(value).unwrap_or_else(|_| unreachable!())
    }

    fn assignment(policy: &str, scope: &str) -> PolicyAssignment {
        PolicyAssignment {
            id: format!("pa-{policy}-{scope}"),
            principal: reference("UserProfile/prac-1"),
            resource_scope: reference(scope),
            policy: reference(policy),
            is_deleted: false,
        }
    }

    fn policy(id: &str) -> Policy {
        Policy {
            id: id.to_owned(),
            name: None,
            status: PolicyStatus::Active,
            effect: PolicyEffect::Allow,
            actions: Vec::new(),
            is_deleted: false,
        }
    }

    #[test]
    fn grant_policies_keeps_every_scope_of_a_policy() {
        let grants = grant_policies(
            &[
                assignment("Policy/p-1", "Study/s-1"),
                assignment("Policy/p-1", "Study/s-2"),
                assignment("Policy/p-2", "Study/s-3"),
            ],
            &[policy("p-1")],
        );

        assert_eq!(grants.len(), 1);
        assert_eq!(grants.get("p-1").map(BTreeSet::len), Some(2));
    }

    #[test]
    fn gate_drops_policies_without_a_care_team_scope() {
        let grants = grant_policies(
            &[
                assignment("Policy/p-1", "Study/s-1"),
                assignment("Policy/p-2", "Study/s-2"),
            ],
            &[policy("p-1"), policy("p-2")],
        );
        let scope = BTreeSet::from([reference("Study/s-1")]);

        let gated = gate_by_care_teams(grants, &scope);
        assert!(gated.contains_key("p-1"));
        assert!(!gated.contains_key("p-2"));
    }
}
