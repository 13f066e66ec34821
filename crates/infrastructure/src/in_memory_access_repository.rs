use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cohort_application::{
    AccessPorts, CareTeamRepository, ConnectionRepository, OrganizationDefaultsRepository,
    PolicyAssignmentRepository, PolicyRepository, ProfileRepository, ResearchSubjectRepository,
};
use cohort_core::AppResult;
use cohort_domain::{
    CareTeam, Connection, ConnectionQuery, OrganizationLevelDefault, Policy, PolicyAssignment,
    Profile, Reference, ResearchSubject, ResearchSubjectCriteria, ResourceAction,
};
use tokio::sync::RwLock;
use tracing::debug;

mod fixture;


pub use fixture::AccessFixture;

/// In-memory implementation of every access-control store port.
///
/// Filters mirror the PostgreSQL adapters so either can back the service.
#[derive(Debug, Default)]
pub struct InMemoryAccessRepository {
    profiles: RwLock<HashMap<String, Profile>>,
    research_subjects: RwLock<HashMap<String, ResearchSubject>>,
    connections: RwLock<HashMap<String, Connection>>,
    policies: RwLock<HashMap<String, Policy>>,
    assignments: RwLock<HashMap<String, PolicyAssignment>>,
    care_teams: RwLock<HashMap<String, CareTeam>>,
    defaults: RwLock<HashMap<String, OrganizationLevelDefault>>,
}

impl InMemoryAccessRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository seeded with every record of a fixture.
    pub async fn from_fixture(fixture: AccessFixture) -> Self {
        let repository = Self::new();
        debug!(
            profiles = fixture.profiles.len(),
            connections = fixture.connections.len(),
            policies = fixture.policies.len(),
            "seeding in-memory access repository"
        );
        for profile in fixture.profiles {
            repository.insert_profile(profile).await;
        }
        for subject in fixture.research_subjects {
            repository.insert_research_subject(subject).await;
        }
        for connection in fixture.connections {
            repository.insert_connection(connection).await;
        }
        for policy in fixture.policies {
            repository.insert_policy(policy).await;
        }
        for assignment in fixture.policy_assignments {
            repository.insert_policy_assignment(assignment).await;
        }
        for care_team in fixture.care_teams {
            repository.insert_care_team(care_team).await;
        }
        for default in fixture.organization_defaults {
            repository.set_organization_default(default).await;
        }
        repository
    }

    /// Wires this repository into every access port.
    #[must_use]
    pub fn access_ports(self: &Arc<Self>) -> AccessPorts {
        AccessPorts {
            profiles: self.clone(),
            research_subjects: self.clone(),
            connections: self.clone(),
            policies: self.clone(),
            policy_assignments: self.clone(),
            care_teams: self.clone(),
            organization_defaults: self.clone(),
        }
    }

    /// Inserts or replaces a profile.
    pub async fn insert_profile(&self, profile: Profile) {
        self.profiles.write().await.insert(profile.id.clone(), profile);
    }

    /// Inserts or replaces a research subject.
    pub async fn insert_research_subject(&self, subject: ResearchSubject) {
        self.research_subjects
            .write()
            .await
            .insert(subject.id.clone(), subject);
    }

    /// Inserts or replaces a connection.
    pub async fn insert_connection(&self, connection: Connection) {
        self.connections
            .write()
            .await
            .insert(connection.id.clone(), connection);
    }

    /// Inserts or replaces a policy.
    pub async fn insert_policy(&self, policy: Policy) {
        self.policies.write().await.insert(policy.id.clone(), policy);
    }

    /// Inserts or replaces a policy assignment.
    pub async fn insert_policy_assignment(&self, assignment: PolicyAssignment) {
        self.assignments
            .write()
            .await
            .insert(assignment.id.clone(), assignment);
    }

    /// Inserts or replaces a care team.
    pub async fn insert_care_team(&self, care_team: CareTeam) {
        self.care_teams
            .write()
            .await
            .insert(care_team.id.clone(), care_team);
    }

    /// Sets the organization-level default for a resource type.
    pub async fn set_organization_default(&self, default: OrganizationLevelDefault) {
        self.defaults
            .write()
            .await
            .insert(default.resource_type.clone(), default);
    }
}

fn sorted_by_id<T>(mut values: Vec<T>, id: impl Fn(&T) -> &str) -> Vec<T> {
    values.sort_by(|left, right| id(left).cmp(id(right)));
    values
}

#[async_trait]
impl ProfileRepository for InMemoryAccessRepository {
    async fn list_active_profiles(&self, profile_ids: &[String]) -> AppResult<Vec<Profile>> {
        let profiles = self.profiles.read().await;

        Ok(sorted_by_id(
            profile_ids
                .iter()
                .filter_map(|id| profiles.get(id))
                .filter(|profile| profile.is_active())
                .cloned()
                .collect(),
            |profile| profile.id.as_str(),
        ))
    }
}

#[async_trait]
impl ResearchSubjectRepository for InMemoryAccessRepository {
    async fn list_research_subjects(
        &self,
        subject_ids: &[String],
        criteria: Option<&ResearchSubjectCriteria>,
    ) -> AppResult<Vec<ResearchSubject>> {
        let subjects = self.research_subjects.read().await;

        Ok(sorted_by_id(
            subject_ids
                .iter()
                .filter_map(|id| subjects.get(id))
                .filter(|subject| {
                    !subject.is_deleted && criteria.is_none_or(|criteria| criteria.matches(subject))
                })
                .cloned()
                .collect(),
            |subject| subject.id.as_str(),
        ))
    }
}

#[async_trait]
impl ConnectionRepository for InMemoryAccessRepository {
    async fn list_connections(&self, query: &ConnectionQuery) -> AppResult<Vec<Connection>> {
        Ok(sorted_by_id(
            self.connections
                .read()
                .await
                .values()
                .filter(|connection| query.matches(connection))
                .cloned()
                .collect(),
            |connection| connection.id.as_str(),
        ))
    }
}

#[async_trait]
impl PolicyRepository for InMemoryAccessRepository {
    async fn list_allow_policies(
        &self,
        policy_ids: &[String],
        actions: &[ResourceAction],
    ) -> AppResult<Vec<Policy>> {
        let policies = self.policies.read().await;

        Ok(sorted_by_id(
            policy_ids
                .iter()
                .filter_map(|id| policies.get(id))
                .filter(|policy| policy.is_enforceable_allow() && policy.permits_all(actions))
                .cloned()
                .collect(),
            |policy| policy.id.as_str(),
        ))
    }
}

#[async_trait]
impl PolicyAssignmentRepository for InMemoryAccessRepository {
    async fn list_assignments(
        &self,
        principal: &Reference,
        resource_scopes: &[Reference],
    ) -> AppResult<Vec<PolicyAssignment>> {
        Ok(sorted_by_id(
            self.assignments
                .read()
                .await
                .values()
                .filter(|assignment| {
                    !assignment.is_deleted
                        && &assignment.principal == principal
                        && resource_scopes.contains(&assignment.resource_scope)
                })
                .cloned()
                .collect(),
            |assignment| assignment.id.as_str(),
        ))
    }
}

#[async_trait]
impl CareTeamRepository for InMemoryAccessRepository {
    async fn list_current_care_teams(
        &self,
        scope: &[Reference],
        now: DateTime<Utc>,
    ) -> AppResult<Vec<CareTeam>> {
        Ok(sorted_by_id(
            self.care_teams
                .read()
                .await
                .values()
                .filter(|team| team.serves_any(scope) && team.is_current(now))
                .cloned()
                .collect(),
            |team| team.id.as_str(),
        ))
    }
}

#[async_trait]
impl OrganizationDefaultsRepository for InMemoryAccessRepository {
    async fn find_default(
        &self,
        resource_type: &str,
    ) -> AppResult<Option<OrganizationLevelDefault>> {
        Ok(self.defaults.read().await.get(resource_type).cloned())
    }
}
