use std::str::FromStr;

use cohort_core::AppError;
use serde::{Deserialize, Serialize};

use crate::Reference;

/// Kind of individual a profile represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileType {
    /// Platform service account.
    System,
    /// Patient or study participant.
    Patient,
    /// Clinician or study staff.
    Practitioner,
    /// Family member or caregiver acting for a patient.
    CarePartner,
}

impl ProfileType {
    /// Returns a stable storage value for the profile type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Patient => "patient",
            Self::Practitioner => "practitioner",
            Self::CarePartner => "carepartner",
        }
    }
}

impl FromStr for ProfileType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "system" => Ok(Self::System),
            "patient" => Ok(Self::Patient),
            "practitioner" => Ok(Self::Practitioner),
            "carepartner" => Ok(Self::CarePartner),
            _ => Err(AppError::Validation(format!(
                "unknown profile type '{value}'"
            ))),
        }
    }
}

/// Lifecycle status of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileStatus {
    /// Profile can take part in authorization.
    Active,
    /// Profile is suspended.
    Inactive,
}

impl ProfileStatus {
    /// Returns a stable storage value for the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

impl FromStr for ProfileStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            _ => Err(AppError::Validation(format!(
                "unknown profile status '{value}'"
            ))),
        }
    }
}

/// Human name parts attached to a profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HumanName {
    /// Family name.
    #[serde(default)]
    pub family: Option<String>,
    /// Given names in order.
    #[serde(default)]
    pub given: Vec<String>,
}

impl HumanName {
    /// Formats the name as `"<family>, <given...>"`.
    #[must_use]
    pub fn display_name(&self) -> String {
        let family = self
            .family
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty());
        let given = self
            .given
            .iter()
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        match (family, given.is_empty()) {
            (Some(family), false) => format!("{family}, {given}"),
            (Some(family), true) => family.to_owned(),
            (None, _) => given,
        }
    }
}

/// Identity unit for all authorization decisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Bare profile id.
    pub id: String,
    /// Kind of individual.
    pub profile_type: ProfileType,
    /// Lifecycle status.
    pub status: ProfileStatus,
    /// Name parts.
    #[serde(default)]
    pub name: HumanName,
    /// Soft-delete marker.
    #[serde(default)]
    pub is_deleted: bool,
}

impl Profile {
    /// Returns the `UserProfile/<id>` reference for this profile.
    pub fn reference(&self) -> cohort_core::AppResult<Reference> {
        Reference::profile(self.id.as_str())
    }

    /// Returns whether the profile is active and not deleted.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == ProfileStatus::Active && !self.is_deleted
    }

    /// Projects the attributes needed by authorization decisions.
    #[must_use]
    pub fn summary(&self) -> ProfileSummary {
        ProfileSummary {
            profile_type: self.profile_type,
            profile_status: self.status,
            display_name: self.name.display_name(),
        }
    }
}

/// Profile attributes consumed by authorization decisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSummary {
    /// Kind of individual.
    pub profile_type: ProfileType,
    /// Lifecycle status.
    pub profile_status: ProfileStatus,
    /// `"<family>, <given...>"` display name.
    pub display_name: String,
}
