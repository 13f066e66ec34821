use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use cohort_core::{AppError, AppResult};
use cohort_domain::{
    Profile, ProfileSummary, Reference, ResearchSubjectCriteria, dedupe_references,
};
use tracing::warn;

use crate::access_ports::{ProfileRepository, ResearchSubjectRepository};

/// Profile validation and attribute lookups used by authorization.
#[derive(Clone)]
pub struct ProfileDirectory {
    profiles: Arc<dyn ProfileRepository>,
    research_subjects: Arc<dyn ResearchSubjectRepository>,
}

impl ProfileDirectory {
    /// Creates a directory from profile and research subject repositories.
    #[must_use]
    pub fn new(
        profiles: Arc<dyn ProfileRepository>,
        research_subjects: Arc<dyn ResearchSubjectRepository>,
    ) -> Self {
        Self {
            profiles,
            research_subjects,
        }
    }

    /// Returns the attributes of every requested profile.
    ///
    /// Fails with `Forbidden` when the input is empty or when any profile
    /// does not exist, is inactive or is deleted.
    pub async fn user_profiles(
        &self,
        profiles: &[Reference],
    ) -> AppResult<BTreeMap<Reference, ProfileSummary>> {
        let requested = dedupe_references(profiles);
        if requested.is_empty() {
            return Err(AppError::Forbidden(
                "no profiles were supplied for authorization".to_owned(),
            ));
        }

        if let Some(other) = requested
            .iter()
            .find(|reference| !reference.is_user_profile())
        {
            return Err(AppError::Forbidden(format!(
                "reference '{other}' does not denote a user profile"
            )));
        }

        let summaries = self.active_profile_summaries(&requested).await?;
        if summaries.len() != requested.len() {
            let missing: Vec<String> = requested
                .iter()
                .filter(|reference| !summaries.contains_key(*reference))
                .map(ToString::to_string)
                .collect();
            warn!(
                missing = %missing.join(", "),
                reason = "profile missing, inactive or deleted",
                "denying access"
            );
            return Err(AppError::Forbidden(format!(
                "profiles [{}] are missing, inactive or deleted",
                missing.join(", ")
            )));
        }

        Ok(summaries)
    }

    /// Returns the subset of `profiles` that are active, non-deleted user
    /// profiles. Never fails on invalid entries.
    pub async fn valid_profile_references(
        &self,
        profiles: &[Reference],
    ) -> AppResult<BTreeSet<Reference>> {
        let requested: Vec<Reference> = dedupe_references(profiles)
            .into_iter()
            .filter(Reference::is_user_profile)
            .collect();
        if requested.is_empty() {
            return Ok(BTreeSet::new());
        }

        Ok(self
            .active_profile_summaries(&requested)
            .await?
            .into_keys()
            .collect())
    }

    /// Reduces a batch of profile and research subject references to the
    /// valid profiles they denote.
    ///
    /// Each key is an active profile; its value lists the requested
    /// references (the profile itself and any research subject enrollments)
    /// that resolve to it. Entries whose profile is invalid are dropped.
    pub async fn validate_profiles(
        &self,
        references: &[Reference],
        criteria: Option<&ResearchSubjectCriteria>,
    ) -> AppResult<BTreeMap<Reference, Vec<Reference>>> {
        let requested = dedupe_references(references);
        let subject_ids: Vec<String> = requested
            .iter()
            .filter(|reference| reference.is_research_subject())
            .map(|reference| reference.id().to_owned())
            .collect();

        let subjects = if subject_ids.is_empty() {
            Vec::new()
        } else {
            self.research_subjects
                .list_research_subjects(&subject_ids, criteria)
                .await?
        };

        let aliases: Vec<(Reference, Reference)> = subjects
            .into_iter()
            .map(|subject| Ok((subject.individual.clone(), subject.reference()?)))
            .collect::<AppResult<_>>()?;

        let profile_map = requested
            .iter()
            .filter(|reference| reference.is_user_profile())
            .map(|reference| (reference.clone(), reference.clone()))
            .chain(aliases)
            .fold(
                BTreeMap::<Reference, Vec<Reference>>::new(),
                |mut map, (profile, original)| {
                    let originals = map.entry(profile).or_default();
                    if !originals.contains(&original) {
                        originals.push(original);
                    }
                    map
                },
            );

        let profiles: Vec<Reference> = profile_map.keys().cloned().collect();
        let valid = self.valid_profile_references(&profiles).await?;

        Ok(profile_map
            .into_iter()
            .filter(|(profile, _)| valid.contains(profile))
            .collect())
    }

    async fn active_profile_summaries(
        &self,
        requested: &[Reference],
    ) -> AppResult<BTreeMap<Reference, ProfileSummary>> {
        let ids: Vec<String> = requested
            .iter()
            .map(|reference| reference.id().to_owned())
            .collect();
        let rows = self.profiles.list_active_profiles(&ids).await?;

        let mut summaries = BTreeMap::new();
        for profile in rows.into_iter().filter(Profile::is_active) {
            let reference = profile.reference()?;
            if requested.contains(&reference) {
                summaries.insert(reference, profile.summary());
            }
        }

        Ok(summaries)
    }
}
