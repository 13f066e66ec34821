use cohort_domain::{
    Connection, ConnectionStatus, ConnectionType, ResearchSubjectCriteria, ResourceAction,
};

use crate::reference_resolver::resolve_alias;

use super::*;

/// Information-source profile types allowed to write for someone else.
const CARE_SOURCE_TYPES: [ProfileType; 2] = [ProfileType::Practitioner, ProfileType::CarePartner];

/// Sharing rules additionally let patients act through friend connections.
const SHARING_SOURCE_TYPES: [ProfileType; 3] = [
    ProfileType::Practitioner,
    ProfileType::CarePartner,
    ProfileType::Patient,
];

/// A single-owner write-time authorization request under sharing rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    /// Profile issuing the request.
    pub requester: Reference,
    /// Profile recorded as the source of the data.
    pub information_source: Reference,
    /// Profile (or research subject) the data is about.
    pub owner: Reference,
    /// Resource type being written.
    pub resource_type: String,
    /// Kind of access.
    pub access_type: AccessType,
    /// Declared owner profile type, checked when present.
    pub owner_type: Option<ProfileType>,
    /// Actions checked against assigned policies for research subject owners.
    pub resource_actions: Vec<ResourceAction>,
}

/// A single-requestee read-time authorization request under sharing rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionAccessRequest {
    /// Profile issuing the request.
    pub requester: Reference,
    /// Profile (or research subject) whose data is requested.
    pub requestee: Reference,
    /// Resource type being read.
    pub resource_type: String,
    /// Kind of access.
    pub access_type: AccessType,
    /// Declared requestee profile type, checked when present.
    pub requestee_type: Option<ProfileType>,
    /// Actions checked against assigned policies for research subject requestees.
    pub resource_actions: Vec<ResourceAction>,
}

impl AuthorizationService {
    /// Authorizes a write of `owner`'s data submitted by `information_source`.
    ///
    /// Returns the connections that justified access, or an empty list when
    /// a bypass applied. Denials are `Forbidden` errors.
    pub async fn authorize_request(
        &self,
        requester: &Reference,
        information_source: &Reference,
        owner: &Reference,
        resource_type: &str,
        access_type: AccessType,
        owner_type: Option<ProfileType>,
    ) -> AppResult<Vec<Connection>> {
        let criteria = ResearchSubjectCriteria::for_access(access_type);
        let aliases = self
            .resolver
            .research_subject_profiles(owner, Some(information_source), criteria.as_ref())
            .await?;
        let owner_profile = resolve_alias(&aliases, owner);
        let source_profile = resolve_alias(&aliases, information_source);

        let requester_summary = self.requester_summary(requester).await?;
        if owner_type.is_some() {
            let owner_summary = self.profile_summary(&owner_profile).await?;
            ensure_profile_type(requester, &owner_summary, owner_type)?;
        }

        let is_self = requester == &source_profile && source_profile == owner_profile;
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
            return Ok(Vec::new());
        }

        if requester != &source_profile {
            return Err(denied(
                requester,
                "information source differs from the requester",
            ));
        }

        let profiles = self
            .profiles
            .user_profiles(&[source_profile.clone(), owner_profile.clone()])
            .await?;
        let source_type = profiles
            .get(&source_profile)
            .map(|summary| summary.profile_type);
        if !source_type.is_some_and(|profile_type| CARE_SOURCE_TYPES.contains(&profile_type)) {
            return Err(denied(
                requester,
                "information source profile type cannot act for another profile",
            ));
        }

        self.require_connection(
            requester,
            &owner_profile,
            &source_profile,
            &ConnectionType::CARE,
        )
        .await
    }

    /// Authorizes a write under sharing rules.
    ///
    /// Every reference is validated up front, even when a bypass applies.
    /// A research subject owner is checked against assigned policies before
    /// falling back to a partner, delegate or friend connection.
    pub async fn authorize_request_sharing_rules(
        &self,
        request: &AuthorizationRequest,
    ) -> AppResult<Vec<Connection>> {
        let requester = &request.requester;
        let criteria = ResearchSubjectCriteria::for_access(request.access_type);
        let aliases = self
            .resolver
            .research_subject_profiles(
                &request.owner,
                Some(&request.information_source),
                criteria.as_ref(),
            )
            .await?;
        let owner_profile = resolve_alias(&aliases, &request.owner);
        let source_profile = resolve_alias(&aliases, &request.information_source);

        let profiles = self
            .profiles
            .user_profiles(&[
                requester.clone(),
                source_profile.clone(),
                owner_profile.clone(),
            ])
            .await?;
        let summary_of = |profile: &Reference| {
            profiles
                .get(profile)
                .cloned()
                .ok_or_else(|| denied(requester, "profile could not be resolved"))
        };
        let requester_summary = summary_of(requester)?;
        ensure_profile_type(requester, &summary_of(&owner_profile)?, request.owner_type)?;

        let is_self = requester == &source_profile && source_profile == owner_profile;
        if self
            .bypass(
                requester,
                requester_summary.profile_type,
                is_self,
                &request.resource_type,
                request.access_type,
            )
            .await?
            .is_some()
        {
            return Ok(Vec::new());
        }

        if requester != &source_profile {
            return Err(denied(
                requester,
                "information source differs from the requester",
            ));
        }
        if !SHARING_SOURCE_TYPES.contains(&summary_of(&source_profile)?.profile_type) {
            return Err(denied(
                requester,
                "information source profile type cannot act for another profile",
            ));
        }

        if self
            .research_subject_policy_granted(requester, &request.owner, &request.resource_actions)
            .await?
        {
            return Ok(Vec::new());
        }

        self.require_connection(
            requester,
            &owner_profile,
            &source_profile,
            &ConnectionType::SHARING,
        )
        .await
    }

    /// Authorizes a read of `requestee`'s data by `requester`.
    pub async fn authorize_connection_based(
        &self,
        requester: &Reference,
        requestee: &Reference,
        resource_type: &str,
        access_type: AccessType,
        requestee_type: Option<ProfileType>,
    ) -> AppResult<Vec<Connection>> {
        let criteria = ResearchSubjectCriteria::for_access(access_type);
        let aliases = self
            .resolver
            .research_subject_profiles(requestee, None, criteria.as_ref())
            .await?;
        let requestee_profile = resolve_alias(&aliases, requestee);

        let requester_summary = self.requester_summary(requester).await?;
        if requestee_type.is_some() {
            let requestee_summary = self.profile_summary(&requestee_profile).await?;
            ensure_profile_type(requester, &requestee_summary, requestee_type)?;
        }

        if self
            .bypass(
                requester,
                requester_summary.profile_type,
                requester == &requestee_profile,
                resource_type,
                access_type,
            )
            .await?
            .is_some()
        {
            return Ok(Vec::new());
        }

        if !CARE_SOURCE_TYPES.contains(&requester_summary.profile_type) {
            return Err(denied(
                requester,
                "requester profile type cannot access another profile",
            ));
        }
        self.profile_summary(&requestee_profile).await?;

        self.require_connection(
            requester,
            &requestee_profile,
            requester,
            &ConnectionType::CARE,
        )
        .await
    }

    /// Authorizes a read under sharing rules.
    pub async fn authorize_connection_based_sharing_rules(
        &self,
        request: &ConnectionAccessRequest,
    ) -> AppResult<Vec<Connection>> {
        let requester = &request.requester;
        let criteria = ResearchSubjectCriteria::for_access(request.access_type);
        let aliases = self
            .resolver
            .research_subject_profiles(&request.requestee, None, criteria.as_ref())
            .await?;
        let requestee_profile = resolve_alias(&aliases, &request.requestee);

        let profiles = self
            .profiles
            .user_profiles(&[requester.clone(), requestee_profile.clone()])
            .await?;
        let summary_of = |profile: &Reference| {
            profiles
                .get(profile)
                .cloned()
                .ok_or_else(|| denied(requester, "profile could not be resolved"))
        };
        let requester_summary = summary_of(requester)?;
        ensure_profile_type(
            requester,
            &summary_of(&requestee_profile)?,
            request.requestee_type,
        )?;

        if self
            .bypass(
                requester,
                requester_summary.profile_type,
                requester == &requestee_profile,
                &request.resource_type,
                request.access_type,
            )
            .await?
            .is_some()
        {
            return Ok(Vec::new());
        }

        if !SHARING_SOURCE_TYPES.contains(&requester_summary.profile_type) {
            return Err(denied(
                requester,
                "requester profile type cannot access another profile",
            ));
        }

        if self
            .research_subject_policy_granted(
                requester,
                &request.requestee,
                &request.resource_actions,
            )
            .await?
        {
            return Ok(Vec::new());
        }

        self.require_connection(
            requester,
            &requestee_profile,
            requester,
            &ConnectionType::SHARING,
        )
        .await
    }

    /// Returns whether an assigned policy grants `actions` on a research
    /// subject. Profiles and empty action lists are never policy-granted.
    async fn research_subject_policy_granted(
        &self,
        requester: &Reference,
        subject: &Reference,
        actions: &[ResourceAction],
    ) -> AppResult<bool> {
        if !subject.is_research_subject() || actions.is_empty() {
            return Ok(false);
        }

        let granted = self
            .policy_manager
            .request_subject_scoped_access(requester, std::slice::from_ref(subject), actions)
            .await?;
        if granted.contains_key(subject) {
            debug!(
                requester = %requester,
                subject = %subject,
                "research subject granted by policy"
            );
            return Ok(true);
        }

        Ok(false)
    }

    /// Requires an active connection granting `to` access to `from`'s data.
    async fn require_connection(
        &self,
        requester: &Reference,
        from: &Reference,
        to: &Reference,
        types: &[ConnectionType],
    ) -> AppResult<Vec<Connection>> {
        let connections = self
            .connections
            .has_connection(from, to, types, &[ConnectionStatus::Active])
            .await?;
        if connections.is_empty() {
            return Err(denied(requester, "no active connection to the owner"));
        }

        Ok(connections)
    }
}
