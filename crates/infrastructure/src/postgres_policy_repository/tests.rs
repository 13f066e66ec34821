use chrono::{Duration, Utc};
use cohort_application::{CareTeamRepository, PolicyAssignmentRepository, PolicyRepository};
use cohort_domain::{Reference, ResourceAction};
use sqlx::PgPool;

use crate::postgres_test_support::{test_pool, unique_id};

use super::PostgresPolicyRepository;

fn reference(value: &str) -> Reference {
    Reference::parse(value).unwrap_or_else(|_| unreachable!())
}

fn action(value: &str) -> ResourceAction {
    ResourceAction::parse(value).unwrap_or_else(|_| unreachable!())
}

async fn insert_policy(pool: &PgPool, id: &str, actions: &[&str]) {
    let insert = sqlx::query(
        r#"
            INSERT INTO policies (id, name, status, effect, actions)
            VALUES ($1, 'Test policy', 'active', 'allow', $2)
            "#,
    )
    .bind(id)
    .bind(actions)
    .execute(pool)
    .await;

    assert!(insert.is_ok());
}

#[tokio::test]
async fn list_allow_policies_requires_every_action() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresPolicyRepository::new(pool.clone());

    let wildcard = unique_id("policy");
    let exact = unique_id("policy");
    insert_policy(&pool, &wildcard, &["Task:*"]).await;
    insert_policy(&pool, &exact, &["Task:create"]).await;
    let ids = [wildcard.clone(), exact.clone()];

    let both_task_verbs = repository
        .list_allow_policies(&ids, &[action("Task:create"), action("Task:update")])
        .await
        .unwrap_or_default();
    assert_eq!(both_task_verbs.len(), 1);
    assert_eq!(both_task_verbs[0].id, wildcard);

    let mixed_types = repository
        .list_allow_policies(&ids, &[action("Task:create"), action("Visit:create")])
        .await
        .unwrap_or_default();
    assert!(mixed_types.is_empty());
}

#[tokio::test]
async fn list_assignments_matches_principal_and_scope() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresPolicyRepository::new(pool.clone());

    let principal = format!("UserProfile/{}", unique_id("prac"));
    let study = format!("Study/{}", unique_id("study"));
    let insert = sqlx::query(
        r#"
            INSERT INTO policy_assignments (id, principal_reference, resource_scope_reference, policy_reference)
            VALUES ($1, $2, $3, 'Policy/p-1')
            "#,
    )
    .bind(unique_id("pa"))
    .bind(&principal)
    .bind(&study)
    .execute(&pool)
    .await;
    assert!(insert.is_ok());

    let assignments = repository
        .list_assignments(&reference(&principal), &[reference(&study)])
        .await
        .unwrap_or_default();
    assert_eq!(assignments.len(), 1);
    assert_eq!(assignments[0].policy, reference("Policy/p-1"));

    let other_scope = repository
        .list_assignments(&reference(&principal), &[reference("Study/elsewhere")])
        .await
        .unwrap_or_default();
    assert!(other_scope.is_empty());
}

#[tokio::test]
async fn list_current_care_teams_excludes_ended_teams_but_keeps_rosters() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresPolicyRepository::new(pool.clone());

    let study = format!("Study/{}", unique_id("study"));
    let current = unique_id("ct");
    let ended = unique_id("ct");
    let now = Utc::now();
    for (id, period_end) in [(&current, None), (&ended, Some(now - Duration::days(1)))] {
        let insert = sqlx::query(
            r#"
                INSERT INTO care_teams (id, study_reference, period_end)
                VALUES ($1, $2, $3)
                "#,
        )
        .bind(id)
        .bind(&study)
        .bind(period_end)
        .execute(&pool)
        .await;
        assert!(insert.is_ok());
    }

    let member = format!("UserProfile/{}", unique_id("prac"));
    let insert = sqlx::query(
        r#"
            INSERT INTO care_team_participants (care_team_id, member_reference, status, period_end)
            VALUES ($1, $2, 'active', $3)
            "#,
    )
    .bind(&current)
    .bind(&member)
    .bind(now - Duration::days(2))
    .execute(&pool)
    .await;
    assert!(insert.is_ok());

    let teams = repository
        .list_current_care_teams(&[reference(&study)], now)
        .await
        .unwrap_or_default();

    assert_eq!(teams.len(), 1);
    assert_eq!(teams[0].id, current);
    assert_eq!(teams[0].participants.len(), 1);
    assert!(!teams[0].has_current_member(&reference(&member), now));
}
