use super::*;

#[derive(Debug, FromRow)]
struct ResearchSubjectRow {
    id: String,
    status: String,
    individual_reference: String,
    study_reference: String,
    site_reference: Option<String>,
    is_deleted: bool,
}

impl ResearchSubjectRow {
    fn into_research_subject(self) -> AppResult<ResearchSubject> {
        Ok(ResearchSubject {
            status: decode_value(&self.status, "research subject status")?,
            individual: decode_reference(&self.individual_reference, "individual reference")?,
            study: decode_reference(&self.study_reference, "study reference")?,
            site: decode_optional_reference(self.site_reference.as_deref(), "site reference")?,
            is_deleted: self.is_deleted,
            id: self.id,
        })
    }
}

impl PostgresProfileRepository {
    pub(super) async fn list_research_subjects_impl(
        &self,
        subject_ids: &[String],
        criteria: Option<&ResearchSubjectCriteria>,
    ) -> AppResult<Vec<ResearchSubject>> {
        let excluded_statuses: Vec<String> = criteria
            .map(|criteria| {
                criteria
                    .excluded_statuses
                    .iter()
                    .map(|status| status.as_str().to_owned())
                    .collect()
            })
            .unwrap_or_default();

        let rows = sqlx::query_as::<_, ResearchSubjectRow>(
            r#"
            SELECT id, status, individual_reference, study_reference, site_reference, is_deleted
            FROM research_subjects
            WHERE id = ANY($1)
              AND is_deleted = FALSE
              AND status <> ALL($2)
            ORDER BY id
            "#,
        )
        .bind(subject_ids)
        .bind(&excluded_statuses)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load research subjects: {error}"))
        })?;

        rows.into_iter()
            .map(ResearchSubjectRow::into_research_subject)
            .collect()
    }
}
