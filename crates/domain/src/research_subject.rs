use std::str::FromStr;

use cohort_core::{AccessType, AppError};
use serde::{Deserialize, Serialize};

use crate::Reference;

/// Enrollment status of a research subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResearchSubjectStatus {
    /// Actively enrolled.
    Active,
    /// Identified as a possible participant.
    Candidate,
    /// Meets the study criteria.
    Eligible,
    /// In post-study follow-up.
    FollowUp,
    /// Does not meet the study criteria.
    Ineligible,
    /// Was never registered.
    NotRegistered,
    /// No longer on study.
    OffStudy,
    /// On study.
    OnStudy,
    /// On study, intervention arm.
    OnStudyIntervention,
    /// On study, observation arm.
    OnStudyObservation,
    /// Awaiting enrollment.
    PendingOnStudy,
    /// Possible candidate, not yet screened.
    PotentialCandidate,
    /// Being screened.
    Screening,
    /// Withdrew from the study.
    Withdrawn,
}

impl ResearchSubjectStatus {
    /// Statuses that may no longer be edited on behalf of the subject.
    pub const EDIT_EXCLUDED: [Self; 3] = [Self::Withdrawn, Self::Ineligible, Self::NotRegistered];

    /// Returns a stable storage value for the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Candidate => "candidate",
            Self::Eligible => "eligible",
            Self::FollowUp => "follow-up",
            Self::Ineligible => "ineligible",
            Self::NotRegistered => "not-registered",
            Self::OffStudy => "off-study",
            Self::OnStudy => "on-study",
            Self::OnStudyIntervention => "on-study-intervention",
            Self::OnStudyObservation => "on-study-observation",
            Self::PendingOnStudy => "pending-on-study",
            Self::PotentialCandidate => "potential-candidate",
            Self::Screening => "screening",
            Self::Withdrawn => "withdrawn",
        }
    }
}

impl FromStr for ResearchSubjectStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "active" => Ok(Self::Active),
            "candidate" => Ok(Self::Candidate),
            "eligible" => Ok(Self::Eligible),
            "follow-up" => Ok(Self::FollowUp),
            "ineligible" => Ok(Self::Ineligible),
            "not-registered" => Ok(Self::NotRegistered),
            "off-study" => Ok(Self::OffStudy),
            "on-study" => Ok(Self::OnStudy),
            "on-study-intervention" => Ok(Self::OnStudyIntervention),
            "on-study-observation" => Ok(Self::OnStudyObservation),
            "pending-on-study" => Ok(Self::PendingOnStudy),
            "potential-candidate" => Ok(Self::PotentialCandidate),
            "screening" => Ok(Self::Screening),
            "withdrawn" => Ok(Self::Withdrawn),
            _ => Err(AppError::Validation(format!(
                "unknown research subject status '{value}'"
            ))),
        }
    }
}

/// A profile's enrollment in a study.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchSubject {
    /// Bare research subject id.
    pub id: String,
    /// Enrollment status.
    pub status: ResearchSubjectStatus,
    /// The enrolled individual's profile.
    pub individual: Reference,
    /// The study enrolled in.
    pub study: Reference,
    /// Optional study site.
    #[serde(default)]
    pub site: Option<Reference>,
    /// Soft-delete marker.
    #[serde(default)]
    pub is_deleted: bool,
}

impl ResearchSubject {
    /// Returns the `ResearchSubject/<id>` reference.
    pub fn reference(&self) -> cohort_core::AppResult<Reference> {
        Reference::research_subject(self.id.as_str())
    }

    /// Returns the study and, when present, the site the subject belongs to.
    #[must_use]
    pub fn resource_scope(&self) -> Vec<Reference> {
        let mut scope = vec![self.study.clone()];
        if let Some(site) = &self.site {
            scope.push(site.clone());
        }
        scope
    }
}

/// Additional filter applied when resolving research subjects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResearchSubjectCriteria {
    /// Statuses that disqualify a subject.
    pub excluded_statuses: Vec<ResearchSubjectStatus>,
}

impl ResearchSubjectCriteria {
    /// Criteria for edit access: withdrawn, ineligible and unregistered
    /// subjects are excluded.
    #[must_use]
    pub fn edit_access() -> Self {
        Self {
            excluded_statuses: ResearchSubjectStatus::EDIT_EXCLUDED.to_vec(),
        }
    }

    /// Returns the criteria implied by an access type. Read access applies
    /// no criteria.
    #[must_use]
    pub fn for_access(access_type: AccessType) -> Option<Self> {
        match access_type {
            AccessType::Read => None,
            AccessType::Edit => Some(Self::edit_access()),
        }
    }

    /// Returns whether the subject passes these criteria.
    #[must_use]
    pub fn matches(&self, subject: &ResearchSubject) -> bool {
        !self.excluded_statuses.contains(&subject.status)
    }
}
