use std::env;
use std::path::PathBuf;

use cohort_core::{AppError, AppResult};
use tracing_subscriber::EnvFilter;

/// Backing store the check runs against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessStore {
    Postgres {
        database_url: String,
        max_connections: u32,
        run_migrations: bool,
    },
    Fixture {
        path: PathBuf,
    },
}

#[derive(Debug, Clone)]
pub struct AccessCheckConfig {
    pub store: AccessStore,
}

impl AccessCheckConfig {
    pub fn load() -> AppResult<Self> {
        let store = match non_empty_env("DATABASE_URL") {
            Some(database_url) => {
                let max_connections = parse_env_u32("COHORT_DB_MAX_CONNECTIONS", 5)?;
                if max_connections == 0 {
                    return Err(AppError::Validation(
                        "COHORT_DB_MAX_CONNECTIONS must be greater than zero".to_owned(),
                    ));
                }

                AccessStore::Postgres {
                    database_url,
                    max_connections,
                    run_migrations: env::var("COHORT_RUN_MIGRATIONS")
                        .unwrap_or_else(|_| "false".to_owned())
                        .eq_ignore_ascii_case("true"),
                }
            }
            None => AccessStore::Fixture {
                path: PathBuf::from(non_empty_env("COHORT_FIXTURE_PATH").ok_or_else(|| {
                    AppError::Validation(
                        "DATABASE_URL or COHORT_FIXTURE_PATH is required".to_owned(),
                    )
                })?),
            },
        };

        Ok(Self { store })
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn parse_env_u32(name: &str, default: u32) -> AppResult<u32> {
    match env::var(name) {
        Ok(value) => value.parse::<u32>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}
