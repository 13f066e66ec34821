use std::sync::Arc;

use cohort_core::{AccessType, AppError, AppResult};
use cohort_domain::{OwnershipRegistry, ProfileSummary, ProfileType, Reference};
use tracing::{debug, warn};

use crate::access_ports::{
    CareTeamRepository, ConnectionRepository, OrganizationDefaultsRepository,
    PolicyAssignmentRepository, PolicyRepository, ProfileRepository, ResearchSubjectRepository,
};
use crate::{ConnectionStore, PolicyManager, PolicyStore, ProfileDirectory, ReferenceResolver};

mod access_level;
mod batch;
mod payload;
mod policy;
mod single_owner;


pub use batch::requester_owned_references;
pub use single_owner::{AuthorizationRequest, ConnectionAccessRequest};

/// Store ports the authorization service reads from.
#[derive(Clone)]
pub struct AccessPorts {
    /// Profile lookups.
    pub profiles: Arc<dyn ProfileRepository>,
    /// Research subject lookups.
    pub research_subjects: Arc<dyn ResearchSubjectRepository>,
    /// Connection lookups.
    pub connections: Arc<dyn ConnectionRepository>,
    /// Policy lookups.
    pub policies: Arc<dyn PolicyRepository>,
    /// Policy assignment lookups.
    pub policy_assignments: Arc<dyn PolicyAssignmentRepository>,
    /// Care team lookups.
    pub care_teams: Arc<dyn CareTeamRepository>,
    /// Organization-level default lookups.
    pub organization_defaults: Arc<dyn OrganizationDefaultsRepository>,
}

/// Request-level and batch-level authorization decisions combining
/// ownership, bypass rules, connections and policy assignments.
///
/// Every call re-derives its answer from the store; nothing is cached.
#[derive(Clone)]
pub struct AuthorizationService {
    profiles: ProfileDirectory,
    resolver: ReferenceResolver,
    connections: ConnectionStore,
    policy_manager: PolicyManager,
    organization_defaults: Arc<dyn OrganizationDefaultsRepository>,
    ownership: Arc<OwnershipRegistry>,
}

impl AuthorizationService {
    /// Creates an authorization service from its collaborators.
    #[must_use]
    pub fn new(
        profiles: ProfileDirectory,
        resolver: ReferenceResolver,
        connections: ConnectionStore,
        policy_manager: PolicyManager,
        organization_defaults: Arc<dyn OrganizationDefaultsRepository>,
    ) -> Self {
        Self {
            profiles,
            resolver,
            connections,
            policy_manager,
            organization_defaults,
            ownership: Arc::new(OwnershipRegistry::default()),
        }
    }

    /// Wires every collaborator from a set of store ports.
    #[must_use]
    pub fn from_ports(ports: AccessPorts) -> Self {
        let policy_store = PolicyStore::new(
            ports.policies,
            ports.policy_assignments,
            ports.care_teams,
        );

        Self::new(
            ProfileDirectory::new(ports.profiles, ports.research_subjects.clone()),
            ReferenceResolver::new(ports.research_subjects.clone()),
            ConnectionStore::new(ports.connections),
            PolicyManager::new(policy_store, ports.research_subjects),
            ports.organization_defaults,
        )
    }

    /// Replaces the registry used to read ownership from resource payloads.
    #[must_use]
    pub fn with_ownership_registry(mut self, registry: OwnershipRegistry) -> Self {
        self.ownership = Arc::new(registry);
        self
    }

    /// Returns the policy manager backing policy-based checks.
    #[must_use]
    pub fn policy_manager(&self) -> &PolicyManager {
        &self.policy_manager
    }

    async fn requester_summary(&self, requester: &Reference) -> AppResult<ProfileSummary> {
        self.profiles
            .user_profiles(std::slice::from_ref(requester))
            .await?
            .remove(requester)
            .ok_or_else(|| denied(requester, "requester profile could not be resolved"))
    }

    async fn profile_summary(&self, profile: &Reference) -> AppResult<ProfileSummary> {
        self.profiles
            .user_profiles(std::slice::from_ref(profile))
            .await?
            .remove(profile)
            .ok_or_else(|| {
                AppError::Forbidden(format!("profile '{profile}' could not be resolved"))
            })
    }

    /// Checks the bypass rules in order: system user, self access, then a
    /// public organization-level default for the resource type.
    async fn bypass(
        &self,
        requester: &Reference,
        requester_type: ProfileType,
        is_self: bool,
        resource_type: &str,
        access_type: AccessType,
    ) -> AppResult<Option<Bypass>> {
        let bypass = if requester_type == ProfileType::System {
            Some(Bypass::SystemUser)
        } else if is_self {
            Some(Bypass::SelfAccess)
        } else if self.resource_access_level(resource_type, access_type).await? {
            Some(Bypass::PublicResource)
        } else {
            None
        };

        if let Some(bypass) = bypass {
            debug!(
                requester = %requester,
                resource_type,
                access_type = %access_type,
                bypass = bypass.as_str(),
                "authorization bypassed"
            );
        }

        Ok(bypass)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bypass {
    SystemUser,
    SelfAccess,
    PublicResource,
}

impl Bypass {
    fn as_str(self) -> &'static str {
        match self {
            Self::SystemUser => "system_user",
            Self::SelfAccess => "self_access",
            Self::PublicResource => "public_resource",
        }
    }
}

/// Logs a denial and builds the matching error.
fn denied(requester: &Reference, reason: &str) -> AppError {
    warn!(requester = %requester, reason, "denying access");
    AppError::Forbidden(format!("requester '{requester}' is not authorized: {reason}"))
}

/// Fails when `expected` is given and differs from the profile's actual type.
fn ensure_profile_type(
    requester: &Reference,
    summary: &ProfileSummary,
    expected: Option<ProfileType>,
) -> AppResult<()> {
    match expected {
        Some(expected) if expected != summary.profile_type => Err(denied(
            requester,
            "owner profile type does not match the declared type",
        )),
        _ => Ok(()),
    }
}
