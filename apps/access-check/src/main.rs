//! Cohort access-check: runs one batch authorization and prints the verdict.

#![forbid(unsafe_code)]

mod config;

use std::sync::Arc;

use clap::Parser;
use cohort_application::{AccessPorts, AuthorizationService};
use cohort_core::{AccessType, AppError, AppResult};
use cohort_domain::{Reference, ResourceAction};
use cohort_infrastructure::{
    AccessFixture, InMemoryAccessRepository, PostgresConnectionRepository,
    PostgresOrganizationDefaultsRepository, PostgresPolicyRepository, PostgresProfileRepository,
    run_migrations,
};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::config::{AccessCheckConfig, AccessStore, init_tracing};

/// Checks whether a requester may access the records of one or more requestees.
#[derive(Parser, Debug)]
#[command(name = "access-check")]
struct Args {
    /// Requesting profile id or `UserProfile/<id>` reference
    requester: String,

    /// Access type, `read` or `edit`
    access_type: String,

    /// Resource type being accessed, e.g. `Observation`
    resource_type: String,

    /// Profiles or research subjects whose records are requested
    #[arg(required = true)]
    requestees: Vec<String>,

    /// Resource action checked against policies, as `Type:verb` (repeatable)
    #[arg(long = "action")]
    actions: Vec<String>,
}

#[derive(Debug)]
struct AccessCheck {
    requester: Reference,
    access_type: AccessType,
    resource_type: String,
    requestees: Vec<Reference>,
    actions: Vec<ResourceAction>,
}

impl Args {
    fn into_check(self) -> AppResult<AccessCheck> {
        Ok(AccessCheck {
            requester: Reference::profile(self.requester.as_str())?,
            access_type: self.access_type.parse()?,
            resource_type: self.resource_type,
            requestees: self
                .requestees
                .iter()
                .map(|value| requestee_reference(value.as_str()))
                .collect::<AppResult<_>>()?,
            actions: self
                .actions
                .iter()
                .map(|value| ResourceAction::parse(value.as_str()))
                .collect::<AppResult<_>>()?,
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let check = Args::parse().into_check()?;
    let config = AccessCheckConfig::load()?;
    let service = AuthorizationService::from_ports(access_ports(&config.store).await?);

    let verdict = service
        .authorize_multiple_connections_based(
            &check.requester,
            &check.requestees,
            check.resource_type.as_str(),
            check.access_type,
            &check.actions,
        )
        .await?;

    info!(
        requester = %check.requester,
        full_auth_granted = verdict.full_auth_granted,
        "access check completed"
    );

    let rendered = serde_json::to_string_pretty(&verdict)
        .map_err(|error| AppError::Internal(format!("failed to render verdict: {error}")))?;
    println!("{rendered}");

    Ok(())
}

/// Bare ids name profiles; anything with a prefix is taken as a reference.
fn requestee_reference(value: &str) -> AppResult<Reference> {
    if value.contains('/') {
        Reference::parse(value)
    } else {
        Reference::profile(value)
    }
}

async fn access_ports(store: &AccessStore) -> AppResult<AccessPorts> {
    match store {
        AccessStore::Postgres {
            database_url,
            max_connections,
            run_migrations: migrate,
        } => {
            let pool = connect_pool(database_url.as_str(), *max_connections).await?;
            if *migrate {
                run_migrations(&pool).await?;
                info!("applied access-control migrations");
            }

            Ok(postgres_ports(pool))
        }
        AccessStore::Fixture { path } => {
            let raw = std::fs::read_to_string(path).map_err(|error| {
                AppError::Validation(format!(
                    "failed to read fixture '{}': {error}",
                    path.display()
                ))
            })?;
            let fixture = AccessFixture::from_json(&raw)?;
            let repository = Arc::new(InMemoryAccessRepository::from_fixture(fixture).await);
            info!(fixture = %path.display(), "using in-memory access store");

            Ok(repository.access_ports())
        }
    }
}

async fn connect_pool(database_url: &str, max_connections: u32) -> AppResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))
}

fn postgres_ports(pool: PgPool) -> AccessPorts {
    let profiles = Arc::new(PostgresProfileRepository::new(pool.clone()));
    let policies = Arc::new(PostgresPolicyRepository::new(pool.clone()));

    AccessPorts {
        profiles: profiles.clone(),
        research_subjects: profiles,
        connections: Arc::new(PostgresConnectionRepository::new(pool.clone())),
        policies: policies.clone(),
        policy_assignments: policies.clone(),
        care_teams: policies,
        organization_defaults: Arc::new(PostgresOrganizationDefaultsRepository::new(pool)),
    }
}
