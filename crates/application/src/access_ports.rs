mod connections;
mod organization;
mod policies;
mod profiles;

pub use connections::ConnectionRepository;
pub use organization::OrganizationDefaultsRepository;
pub use policies::{CareTeamRepository, PolicyAssignmentRepository, PolicyRepository};
pub use profiles::{ProfileRepository, ResearchSubjectRepository};
