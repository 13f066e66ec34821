//! Application services and ports for access-control decisions.

#![forbid(unsafe_code)]

mod access_ports;
mod authorization_service;
mod connection_store;
mod policy_manager;
mod policy_store;
mod profile_directory;
mod reference_resolver;

pub use access_ports::{
    CareTeamRepository, ConnectionRepository, OrganizationDefaultsRepository,
    PolicyAssignmentRepository, PolicyRepository, ProfileRepository, ResearchSubjectRepository,
};
pub use authorization_service::{
    AccessPorts, AuthorizationRequest, AuthorizationService, ConnectionAccessRequest,
    requester_owned_references,
};
pub use connection_store::ConnectionStore;
pub use policy_manager::{PolicyManager, ResourceScopedGrant};
pub use policy_store::PolicyStore;
pub use profile_directory::ProfileDirectory;
pub use reference_resolver::{ReferenceResolver, resolve_alias};
