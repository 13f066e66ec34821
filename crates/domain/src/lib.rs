//! Domain entities and invariants for the access-control core.

#![forbid(unsafe_code)]

mod care_team;
mod connection;
mod organization;
mod ownership;
mod policy;
mod profile;
mod reference;
mod research_subject;
mod verdict;

pub use care_team::{CareTeam, CareTeamParticipant, ParticipantStatus, Period};
pub use connection::{Connection, ConnectionQuery, ConnectionStatus, ConnectionType};
pub use organization::{OrganizationAccess, OrganizationLevelDefault};
pub use ownership::{FieldPath, OwnershipPaths, OwnershipRegistry, ResourceOwnership};
pub use policy::{Policy, PolicyAssignment, PolicyEffect, PolicyStatus, ResourceAction};
pub use profile::{HumanName, Profile, ProfileStatus, ProfileSummary, ProfileType};
pub use reference::{
    Reference, ReferenceKind, dedupe_references, remove_references, to_resource_id,
    to_resource_ids, to_resource_reference, to_resource_references, unique_references,
};
pub use research_subject::{ResearchSubject, ResearchSubjectCriteria, ResearchSubjectStatus};
pub use verdict::{AuthorizationVerdict, Grant};
