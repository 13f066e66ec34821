use std::str::FromStr;

use chrono::{DateTime, Utc};
use cohort_core::AppError;
use serde::{Deserialize, Serialize};

use crate::Reference;

/// Time window with an optional open end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    /// Start of the window.
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    /// End of the window; `None` means open-ended.
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
}

impl Period {
    /// Returns whether the window has not ended at `now`.
    #[must_use]
    pub fn has_not_ended(&self, now: DateTime<Utc>) -> bool {
        self.end.is_none_or(|end| end >= now)
    }
}

/// Participation status of a care team member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantStatus {
    /// Member currently serves on the team.
    Active,
    /// Member left or was suspended.
    Inactive,
}

impl ParticipantStatus {
    /// Returns a stable storage value for the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

impl FromStr for ParticipantStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            _ => Err(AppError::Validation(format!(
                "unknown care team participant status '{value}'"
            ))),
        }
    }
}

/// One roster entry of a care team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareTeamParticipant {
    /// Participating profile.
    pub member: Reference,
    /// Participation status.
    pub status: ParticipantStatus,
    /// Participation window.
    #[serde(default)]
    pub period: Option<Period>,
}

impl CareTeamParticipant {
    /// Returns whether the participant is active and their own period has
    /// not ended.
    #[must_use]
    pub fn is_current(&self, now: DateTime<Utc>) -> bool {
        self.status == ParticipantStatus::Active
            && self
                .period
                .as_ref()
                .is_none_or(|period| period.has_not_ended(now))
    }
}

/// Roster of profiles associated with a study or site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareTeam {
    /// Bare care team id.
    pub id: String,
    /// Roster.
    #[serde(default)]
    pub participants: Vec<CareTeamParticipant>,
    /// Study the team serves.
    #[serde(default)]
    pub study: Option<Reference>,
    /// Site the team serves.
    #[serde(default)]
    pub site: Option<Reference>,
    /// Team-level active window.
    #[serde(default)]
    pub period: Option<Period>,
    /// Soft-delete marker.
    #[serde(default)]
    pub is_deleted: bool,
}

impl CareTeam {
    /// Returns whether the team serves any of `scope`.
    #[must_use]
    pub fn serves_any(&self, scope: &[Reference]) -> bool {
        self.scoped_references()
            .iter()
            .any(|reference| scope.contains(reference))
    }

    /// Returns whether the team-level period has not ended.
    #[must_use]
    pub fn is_current(&self, now: DateTime<Utc>) -> bool {
        !self.is_deleted
            && self
                .period
                .as_ref()
                .is_none_or(|period| period.has_not_ended(now))
    }

    /// Returns whether `member` appears as a current participant.
    #[must_use]
    pub fn has_current_member(&self, member: &Reference, now: DateTime<Utc>) -> bool {
        self.participants
            .iter()
            .any(|participant| &participant.member == member && participant.is_current(now))
    }

    /// Returns the study and site references the team serves.
    #[must_use]
    pub fn scoped_references(&self) -> Vec<Reference> {
        self.study.iter().chain(self.site.iter()).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::{CareTeam, CareTeamParticipant, ParticipantStatus, Period};
    use crate::Reference;

    fn reference(value: &str) -> Reference {
        Reference::parse(value).unwrap_or_else(|_| unreachable!())
    }

    fn team(participant_period: Option<Period>, team_period: Option<Period>) -> CareTeam {
        CareTeam {
            id: "ct-1".to_owned(),
            participants: vec![CareTeamParticipant {
                member: reference("UserProfile/prac-1"),
                status: ParticipantStatus::Active,
                period: participant_period,
            }],
            study: Some(reference("Study/s-1")),
            site: Some(reference("StudySite/site-1")),
            period: team_period,
            is_deleted: false,
        }
    }

    fn ended() -> Option<Period> {
        Some(Period {
            start: None,
            end: Some(Utc::now() - Duration::days(1)),
        })
    }

    #[test]
    fn open_ended_membership_is_current() {
        let now = Utc::now();
        let care_team = team(None, None);
        assert!(care_team.is_current(now));
        assert!(care_team.has_current_member(&reference("UserProfile/prac-1"), now));
        assert!(!care_team.has_current_member(&reference("UserProfile/other"), now));
    }

    #[test]
    fn team_and_participant_expiry_are_checked_independently() {
        let now = Utc::now();

        let expired_team = team(None, ended());
        assert!(!expired_team.is_current(now));
        assert!(expired_team.has_current_member(&reference("UserProfile/prac-1"), now));

        let expired_participant = team(ended(), None);
        assert!(expired_participant.is_current(now));
        assert!(!expired_participant.has_current_member(&reference("UserProfile/prac-1"), now));
    }

    #[test]
    fn inactive_participant_is_not_current() {
        let mut care_team = team(None, None);
        care_team.participants[0].status = ParticipantStatus::Inactive;
        assert!(!care_team.has_current_member(&reference("UserProfile/prac-1"), Utc::now()));
    }

    #[test]
    fn serves_any_matches_study_or_site() {
        let care_team = team(None, None);
        assert!(care_team.serves_any(&[reference("StudySite/site-1")]));
        assert!(care_team.serves_any(&[reference("Study/s-1")]));
        assert!(!care_team.serves_any(&[reference("Study/s-2")]));
    }
}
