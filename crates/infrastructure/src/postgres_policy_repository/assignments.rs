use super::*;

#[derive(Debug, FromRow)]
struct PolicyAssignmentRow {
    id: String,
    principal_reference: String,
    resource_scope_reference: String,
    policy_reference: String,
    is_deleted: bool,
}

impl PolicyAssignmentRow {
    fn into_assignment(self) -> AppResult<PolicyAssignment> {
        Ok(PolicyAssignment {
            principal: decode_reference(&self.principal_reference, "principal reference")?,
            resource_scope: decode_reference(
                &self.resource_scope_reference,
                "resource scope reference",
            )?,
            policy: decode_reference(&self.policy_reference, "policy reference")?,
            is_deleted: self.is_deleted,
            id: self.id,
        })
    }
}

impl PostgresPolicyRepository {
    pub(super) async fn list_assignments_impl(
        &self,
        principal: &Reference,
        resource_scopes: &[Reference],
    ) -> AppResult<Vec<PolicyAssignment>> {
        let rows = sqlx::query_as::<_, PolicyAssignmentRow>(
            r#"
            SELECT id, principal_reference, resource_scope_reference, policy_reference, is_deleted
            FROM policy_assignments
            WHERE principal_reference = $1
              AND resource_scope_reference = ANY($2)
              AND is_deleted = FALSE
            ORDER BY id
            "#,
        )
        .bind(principal.to_string())
        .bind(reference_values(resource_scopes))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to load policy assignments for '{principal}': {error}"
            ))
        })?;

        rows.into_iter()
            .map(PolicyAssignmentRow::into_assignment)
            .collect()
    }
}
