use cohort_core::{AppError, AppResult};
use cohort_domain::{
    CareTeam, Connection, OrganizationLevelDefault, Policy, PolicyAssignment, Profile,
    ResearchSubject,
};
use serde::Deserialize;

/// Seed data for an [`super::InMemoryAccessRepository`], usually loaded from
/// a JSON document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AccessFixture {
    /// User profiles.
    pub profiles: Vec<Profile>,
    /// Research subjects.
    pub research_subjects: Vec<ResearchSubject>,
    /// Connections.
    pub connections: Vec<Connection>,
    /// Policy documents.
    pub policies: Vec<Policy>,
    /// Policy assignments.
    pub policy_assignments: Vec<PolicyAssignment>,
    /// Care teams with their rosters.
    pub care_teams: Vec<CareTeam>,
    /// Organization-level defaults.
    pub organization_defaults: Vec<OrganizationLevelDefault>,
}

impl AccessFixture {
    /// Parses a fixture from JSON.
    pub fn from_json(value: &str) -> AppResult<Self> {
        serde_json::from_str(value)
            .map_err(|error| AppError::Validation(format!("invalid access fixture: {error}")))
    }
}
