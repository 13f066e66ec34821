use std::collections::{BTreeMap, BTreeSet};

use cohort_domain::{
    AuthorizationVerdict, ConnectionStatus, ConnectionType, ResearchSubjectCriteria,
    ResourceAction, dedupe_references,
};
use tracing::info;

use super::*;

/// Returns the requested references that resolve to the requester: the
/// requester's own profile and any of its research subject enrollments.
#[must_use]
pub fn requester_owned_references(
    requester: &Reference,
    subject_to_profile_map: &BTreeMap<Reference, Vec<Reference>>,
) -> Vec<Reference> {
    subject_to_profile_map
        .get(requester)
        .cloned()
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BatchMode {
    /// Policy and connection checks cover whatever ownership did not.
    Exhaustive,
    /// Ownership of any reference ends the check.
    OwnerFirst,
}

impl AuthorizationService {
    /// Authorizes a read over a batch of profile and research subject
    /// references.
    ///
    /// Unless a bypass applies the verdict is partial: the caller must
    /// restrict the request to [`AuthorizationVerdict::grant`].
    pub async fn authorize_multiple_connections_based(
        &self,
        requester: &Reference,
        requestees: &[Reference],
        resource_type: &str,
        access_type: AccessType,
        resource_actions: &[ResourceAction],
    ) -> AppResult<AuthorizationVerdict> {
        self.authorize_batch(
            requester,
            requestees,
            resource_type,
            access_type,
            resource_actions,
            BatchMode::Exhaustive,
        )
        .await
    }

    /// Like [`AuthorizationService::authorize_multiple_connections_based`],
    /// but returns with only the owned references as soon as the requester
    /// owns at least one of them, skipping policy and connection checks for
    /// the rest of the batch.
    pub async fn authorize_multiple_owner_based(
        &self,
        requester: &Reference,
        requestees: &[Reference],
        resource_type: &str,
        access_type: AccessType,
        resource_actions: &[ResourceAction],
    ) -> AppResult<AuthorizationVerdict> {
        self.authorize_batch(
            requester,
            requestees,
            resource_type,
            access_type,
            resource_actions,
            BatchMode::OwnerFirst,
        )
        .await
    }

    async fn authorize_batch(
        &self,
        requester: &Reference,
        requestees: &[Reference],
        resource_type: &str,
        access_type: AccessType,
        resource_actions: &[ResourceAction],
        mode: BatchMode,
    ) -> AppResult<AuthorizationVerdict> {
        let requester_summary = self.requester_summary(requester).await?;
        let requested = dedupe_references(requestees);
        let is_self = matches!(requested.as_slice(), [only] if only == requester);
        if self
            .bypass(
                requester,
                requester_summary.profile_type,
                is_self,
                resource_type,
                access_type,
            )
            .await?
            .is_some()
        {
            return Ok(AuthorizationVerdict::full());
        }

        let criteria = ResearchSubjectCriteria::for_access(access_type);
        let subject_to_profile_map = self
            .profiles
            .validate_profiles(&requested, criteria.as_ref())
            .await?;
        let owned = requester_owned_references(requester, &subject_to_profile_map);

        if mode == BatchMode::OwnerFirst && !owned.is_empty() {
            info!(
                requester = %requester,
                requested = requested.len(),
                owned = owned.len(),
                "batch authorized by ownership"
            );
            return Ok(AuthorizationVerdict {
                authorized_requestees: owned,
                subject_to_profile_map,
                ..AuthorizationVerdict::default()
            });
        }

        let resolved: BTreeSet<&Reference> = subject_to_profile_map.values().flatten().collect();
        let pending_subjects: Vec<Reference> = requested
            .iter()
            .filter(|reference| {
                reference.is_research_subject()
                    && resolved.contains(reference)
                    && !owned.contains(reference)
            })
            .cloned()
            .collect();
        let policy_granted: Vec<Reference> =
            if resource_actions.is_empty() || pending_subjects.is_empty() {
                Vec::new()
            } else {
                self.policy_manager
                    .request_subject_scoped_access(requester, &pending_subjects, resource_actions)
                    .await?
                    .into_keys()
                    .collect()
            };

        let covered: BTreeSet<&Reference> = owned.iter().chain(&policy_granted).collect();
        let uncovered_profiles: Vec<Reference> = subject_to_profile_map
            .iter()
            .filter(|(profile, originals)| {
                *profile != requester
                    && !originals.iter().all(|original| covered.contains(original))
            })
            .map(|(profile, _)| profile.clone())
            .collect();

        let authorized_connections = if uncovered_profiles.is_empty() {
            Vec::new()
        } else {
            self.connections
                .connections(
                    &uncovered_profiles,
                    requester,
                    &ConnectionType::SHARING,
                    &[ConnectionStatus::Active],
                )
                .await?
        };

        info!(
            requester = %requester,
            requested = requested.len(),
            owned = owned.len(),
            policy_granted = policy_granted.len(),
            connection_granted = authorized_connections.len(),
            "batch authorization verdict"
        );

        Ok(AuthorizationVerdict {
            full_auth_granted: false,
            authorized_connections,
            authorized_requestees: dedupe_references(&[owned, policy_granted].concat()),
            authorized_resource_scopes: Vec::new(),
            subject_to_profile_map,
        })
    }
}
