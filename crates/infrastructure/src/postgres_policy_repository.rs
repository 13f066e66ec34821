use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use cohort_application::{CareTeamRepository, PolicyAssignmentRepository, PolicyRepository};
use cohort_core::{AppError, AppResult};
use cohort_domain::{
    CareTeam, CareTeamParticipant, Period, Policy, PolicyAssignment, Reference, ResourceAction,
};

use sqlx::{FromRow, PgPool};

use crate::postgres_decode::{
    decode_optional_reference, decode_reference, decode_value, reference_values,
};

mod assignments;
mod care_teams;
mod policies;

#[cfg(test)]
mod tests;

/// PostgreSQL-backed repository for policies, policy assignments and the
/// care teams that gate them.
#[derive(Clone)]
pub struct PostgresPolicyRepository {
    pool: PgPool,
}

impl PostgresPolicyRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PolicyRepository for PostgresPolicyRepository {
    async fn list_allow_policies(
        &self,
        policy_ids: &[String],
        actions: &[ResourceAction],
    ) -> AppResult<Vec<Policy>> {
        self.list_allow_policies_impl(policy_ids, actions).await
    }
}

#[async_trait]
impl PolicyAssignmentRepository for PostgresPolicyRepository {
    async fn list_assignments(
        &self,
        principal: &Reference,
        resource_scopes: &[Reference],
    ) -> AppResult<Vec<PolicyAssignment>> {
        self.list_assignments_impl(principal, resource_scopes).await
    }
}

#[async_trait]
impl CareTeamRepository for PostgresPolicyRepository {
    async fn list_current_care_teams(
        &self,
        scope: &[Reference],
        now: DateTime<Utc>,
    ) -> AppResult<Vec<CareTeam>> {
        self.list_current_care_teams_impl(scope, now).await
    }
}

fn period(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Option<Period> {
    (start.is_some() || end.is_some()).then_some(Period { start, end })
}
