use std::collections::BTreeMap;
use std::sync::Arc;

use cohort_core::{AppError, AppResult};
use cohort_domain::{Reference, ResearchSubjectCriteria, dedupe_references};
use tracing::warn;

use crate::access_ports::ResearchSubjectRepository;

/// Resolves research subject references to the profiles they enroll.
#[derive(Clone)]
pub struct ReferenceResolver {
    research_subjects: Arc<dyn ResearchSubjectRepository>,
}

impl ReferenceResolver {
    /// Creates a resolver backed by a research subject repository.
    #[must_use]
    pub fn new(research_subjects: Arc<dyn ResearchSubjectRepository>) -> Self {
        Self { research_subjects }
    }

    /// Maps every research subject reference among `owner` and
    /// `information_source` to the `UserProfile` reference of its individual.
    ///
    /// Fails with `Forbidden` when any requested subject is missing, deleted
    /// or rejected by `criteria`.
    pub async fn research_subject_profiles(
        &self,
        owner: &Reference,
        information_source: Option<&Reference>,
        criteria: Option<&ResearchSubjectCriteria>,
    ) -> AppResult<BTreeMap<Reference, Reference>> {
        let candidates: Vec<Reference> = std::iter::once(owner)
            .chain(information_source)
            .filter(|reference| reference.is_research_subject())
            .cloned()
            .collect();
        let subjects = dedupe_references(&candidates);
        if subjects.is_empty() {
            return Ok(BTreeMap::new());
        }

        let subject_ids: Vec<String> = subjects
            .iter()
            .map(|reference| reference.id().to_owned())
            .collect();
        let rows = self
            .research_subjects
            .list_research_subjects(&subject_ids, criteria)
            .await?;

        if rows.len() != subject_ids.len() {
            warn!(
                requested = subject_ids.len(),
                resolved = rows.len(),
                reason = "research subject missing or excluded",
                "denying access"
            );
            return Err(AppError::Forbidden(format!(
                "research subjects [{}] could not all be resolved to active enrollments",
                subject_ids.join(", ")
            )));
        }

        rows.into_iter()
            .map(|row| Ok((row.reference()?, row.individual)))
            .collect()
    }
}

/// Returns the profile `reference` resolves to, or `reference` itself when
/// it is not an alias.
#[must_use]
pub fn resolve_alias(aliases: &BTreeMap<Reference, Reference>, reference: &Reference) -> Reference {
    aliases
        .get(reference)
        .cloned()
        .unwrap_or_else(|| reference.clone())
}
