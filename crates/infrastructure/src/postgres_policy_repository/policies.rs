use super::*;

#[derive(Debug, FromRow)]
struct PolicyRow {
    id: String,
    name: Option<String>,
    status: String,
    effect: String,
    actions: Vec<String>,
    is_deleted: bool,
}

impl PolicyRow {
    fn into_policy(self) -> AppResult<Policy> {
        let actions = self
            .actions
            .iter()
            .map(|action| decode_value::<ResourceAction>(action, "policy action"))
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Policy {
            status: decode_value(&self.status, "policy status")?,
            effect: decode_value(&self.effect, "policy effect")?,
            actions,
            name: self.name,
            is_deleted: self.is_deleted,
            id: self.id,
        })
    }
}

impl PostgresPolicyRepository {
    pub(super) async fn list_allow_policies_impl(
        &self,
        policy_ids: &[String],
        actions: &[ResourceAction],
    ) -> AppResult<Vec<Policy>> {
        let rows = sqlx::query_as::<_, PolicyRow>(
            r#"
            SELECT id, name, status, effect, actions, is_deleted
            FROM policies
            WHERE id = ANY($1)
              AND effect = 'allow'
              AND status = 'active'
              AND is_deleted = FALSE
            ORDER BY id
            "#,
        )
        .bind(policy_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load policies: {error}")))?;

        let policies = rows
            .into_iter()
            .map(PolicyRow::into_policy)
            .collect::<AppResult<Vec<_>>>()?;

        Ok(policies
            .into_iter()
            .filter(|policy| policy.permits_all(actions))
            .collect())
    }
}
