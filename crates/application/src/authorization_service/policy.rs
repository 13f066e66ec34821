use std::collections::BTreeMap;

use cohort_domain::{AuthorizationVerdict, ResourceAction, dedupe_references};
use tracing::info;

use super::*;

impl AuthorizationService {
    /// Authorizes `resource_actions` over a set of resource scopes using
    /// policy assignments alone.
    ///
    /// The verdict lists the scopes that were granted; `full_auth_granted`
    /// is only set when a bypass applied. The public-resource bypass is only
    /// considered when both `resource_type` and `access_type` are given.
    pub async fn authorize_policy_based(
        &self,
        requester: &Reference,
        resource_actions: &[ResourceAction],
        resource_scope: &[Reference],
        resource_type: Option<&str>,
        access_type: Option<AccessType>,
    ) -> AppResult<AuthorizationVerdict> {
        let requester_summary = self.requester_summary(requester).await?;
        let bypassed = match (resource_type, access_type) {
            (Some(resource_type), Some(access_type)) => self
                .bypass(
                    requester,
                    requester_summary.profile_type,
                    false,
                    resource_type,
                    access_type,
                )
                .await?
                .is_some(),
            _ => requester_summary.profile_type == ProfileType::System,
        };
        if bypassed {
            return Ok(AuthorizationVerdict::full());
        }

        let grant = self
            .policy_manager
            .request_resource_scoped_access(requester, resource_scope, resource_actions, None)
            .await?;

        Ok(AuthorizationVerdict {
            authorized_resource_scopes: grant.granted_resources,
            ..AuthorizationVerdict::default()
        })
    }

    /// Authorizes a request that names resource scopes, research subjects or
    /// both, failing with `Forbidden` unless every requested scope and every
    /// requested subject is covered.
    ///
    /// Scopes are checked with [`AuthorizationService::authorize_policy_based`]
    /// and subjects with [`AuthorizationService::authorize_multiple_owner_based`].
    pub async fn authorize_policy_manager_based(
        &self,
        requester: &Reference,
        resource_type: &str,
        access_type: AccessType,
        resource_scope_map: Option<&BTreeMap<String, Vec<Reference>>>,
        subject_references: Option<&[Reference]>,
        resource_actions: &[ResourceAction],
    ) -> AppResult<AuthorizationVerdict> {
        let scopes: Vec<Reference> = resource_scope_map
            .map(|map| dedupe_references(&map.values().flatten().cloned().collect::<Vec<_>>()))
            .unwrap_or_default();
        let subjects: Vec<Reference> = subject_references
            .map(dedupe_references)
            .unwrap_or_default();
        if scopes.is_empty() && subjects.is_empty() {
            return Err(denied(requester, "no resource scopes or subjects to authorize"));
        }

        let requester_summary = self.requester_summary(requester).await?;
        if self
            .bypass(
                requester,
                requester_summary.profile_type,
                false,
                resource_type,
                access_type,
            )
            .await?
            .is_some()
        {
            return Ok(AuthorizationVerdict::full());
        }

        let mut verdict = AuthorizationVerdict::default();

        if !scopes.is_empty() {
            let scoped = self
                .authorize_policy_based(requester, resource_actions, &scopes, None, None)
                .await?;
            if !scoped.grant().covers(&scopes) {
                return Err(denied(requester, "policy grants do not cover every resource scope"));
            }
            verdict.authorized_resource_scopes = scoped.authorized_resource_scopes;
        }

        if !subjects.is_empty() {
            let subject_verdict = self
                .authorize_multiple_owner_based(
                    requester,
                    &subjects,
                    resource_type,
                    access_type,
                    resource_actions,
                )
                .await?;
            if !subject_verdict.grant().covers(&subjects) {
                return Err(denied(requester, "subject grants do not cover every subject"));
            }
            verdict.authorized_requestees = subject_verdict.authorized_requestees;
            verdict.authorized_connections = subject_verdict.authorized_connections;
            verdict.subject_to_profile_map = subject_verdict.subject_to_profile_map;
        }

        info!(
            requester = %requester,
            scopes = scopes.len(),
            subjects = subjects.len(),
            "policy manager authorization granted"
        );
        verdict.full_auth_granted = true;
        Ok(verdict)
    }
}
