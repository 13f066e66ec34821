//! Storage adapters for the access-control ports.

#![forbid(unsafe_code)]

mod in_memory_access_repository;
mod migrations;
mod postgres_connection_repository;
mod postgres_decode;
mod postgres_organization_defaults_repository;
mod postgres_policy_repository;
mod postgres_profile_repository;

#[cfg(test)]
mod postgres_test_support;

pub use in_memory_access_repository::{AccessFixture, InMemoryAccessRepository};
pub use migrations::run_migrations;
pub use postgres_connection_repository::PostgresConnectionRepository;
pub use postgres_organization_defaults_repository::PostgresOrganizationDefaultsRepository;
pub use postgres_policy_repository::PostgresPolicyRepository;
pub use postgres_profile_repository::PostgresProfileRepository;
