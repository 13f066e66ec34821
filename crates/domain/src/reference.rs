//! Typed resource references and the string utilities used at the edges.
//!
//! Callers hand references around as `"<Prefix>/<id>"` strings. Inside the
//! authorization core they are parsed once into [`Reference`] values so that
//! prefix handling happens in exactly one place.

use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use cohort_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

/// Resource type a reference points at.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReferenceKind {
    /// An individual profile (patient, practitioner, care partner, system).
    UserProfile,
    /// A profile's enrollment in a study.
    ResearchSubject,
    /// A static permission document.
    Policy,
    /// A research study used as a resource scope.
    Study,
    /// A study site used as a resource scope.
    StudySite,
    /// A care team roster.
    CareTeam,
    /// A directed profile-to-profile connection.
    Connection,
    /// Any other resource type, keyed by its prefix.
    Other(String),
}

impl ReferenceKind {
    /// Returns the reference prefix for this kind.
    #[must_use]
    pub fn prefix(&self) -> &str {
        match self {
            Self::UserProfile => "UserProfile",
            Self::ResearchSubject => "ResearchSubject",
            Self::Policy => "Policy",
            Self::Study => "Study",
            Self::StudySite => "StudySite",
            Self::CareTeam => "CareTeam",
            Self::Connection => "Connection",
            Self::Other(prefix) => prefix.as_str(),
        }
    }

    /// Resolves a prefix into a kind, falling back to [`ReferenceKind::Other`].
    #[must_use]
    pub fn from_prefix(prefix: &str) -> Self {
        match prefix {
            "UserProfile" => Self::UserProfile,
            "ResearchSubject" => Self::ResearchSubject,
            "Policy" => Self::Policy,
            "Study" => Self::Study,
            "StudySite" => Self::StudySite,
            "CareTeam" => Self::CareTeam,
            "Connection" => Self::Connection,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl Display for ReferenceKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.prefix())
    }
}

/// A parsed `"<Prefix>/<id>"` reference.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Reference {
    kind: ReferenceKind,
    id: NonEmptyString,
}

impl Reference {
    /// Creates a reference from a kind and a bare id.
    pub fn new(kind: ReferenceKind, id: impl Into<String>) -> AppResult<Self> {
        let id = NonEmptyString::new(id)?;
        if id.as_str().contains('/') {
            return Err(AppError::Validation(format!(
                "reference id '{}' must not contain '/'",
                id.as_str()
            )));
        }

        Ok(Self { kind, id })
    }

    /// Parses a `"<Prefix>/<id>"` value.
    pub fn parse(value: &str) -> AppResult<Self> {
        let Some((prefix, id)) = value.split_once('/') else {
            return Err(AppError::Validation(format!(
                "reference '{value}' must have the form '<Prefix>/<id>'"
            )));
        };

        if prefix.trim().is_empty() {
            return Err(AppError::Validation(format!(
                "reference '{value}' is missing its prefix"
            )));
        }

        Self::new(ReferenceKind::from_prefix(prefix), id)
    }

    /// Builds a user profile reference from either a bare id or a
    /// `UserProfile/<id>` value.
    pub fn profile(value: &str) -> AppResult<Self> {
        Self::new(
            ReferenceKind::UserProfile,
            to_resource_id(value, ReferenceKind::UserProfile.prefix()),
        )
    }

    /// Builds a research subject reference from a bare id.
    pub fn research_subject(id: &str) -> AppResult<Self> {
        Self::new(ReferenceKind::ResearchSubject, id)
    }

    /// Returns the reference kind.
    #[must_use]
    pub fn kind(&self) -> &ReferenceKind {
        &self.kind
    }

    /// Returns the bare id.
    #[must_use]
    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    /// Returns whether the reference points at a user profile.
    #[must_use]
    pub fn is_user_profile(&self) -> bool {
        self.kind == ReferenceKind::UserProfile
    }

    /// Returns whether the reference points at a research subject.
    #[must_use]
    pub fn is_research_subject(&self) -> bool {
        self.kind == ReferenceKind::ResearchSubject
    }
}

impl Display for Reference {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}/{}", self.kind, self.id.as_str())
    }
}

impl FromStr for Reference {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for Reference {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value.as_str())
    }
}

impl From<Reference> for String {
    fn from(value: Reference) -> Self {
        value.to_string()
    }
}

/// Deduplicates references in input order, dropping blank values and
/// values that do not contain `prefix`.
#[must_use]
pub fn unique_references<S: AsRef<str>>(references: &[S], prefix: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    references
        .iter()
        .map(AsRef::as_ref)
        .filter(|value| !value.trim().is_empty() && value.contains(prefix))
        .filter(|value| seen.insert(*value))
        .map(str::to_owned)
        .collect()
}

/// Strips `"<prefix>/"` from `value`. Values in any other form are returned
/// unchanged.
#[must_use]
pub fn to_resource_id(value: &str, prefix: &str) -> String {
    value
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('/'))
        .unwrap_or(value)
        .to_owned()
}

/// Prepends `"<prefix>/"` to a bare id. Values already containing a `/`
/// (this prefix's or another's) are returned unchanged.
#[must_use]
pub fn to_resource_reference(value: &str, prefix: &str) -> String {
    if value.contains('/') {
        return value.to_owned();
    }
    format!("{prefix}/{value}")
}

/// List form of [`to_resource_id`].
#[must_use]
pub fn to_resource_ids<S: AsRef<str>>(values: &[S], prefix: &str) -> Vec<String> {
    values
        .iter()
        .map(|value| to_resource_id(value.as_ref(), prefix))
        .collect()
}

/// List form of [`to_resource_reference`].
#[must_use]
pub fn to_resource_references<S: AsRef<str>>(values: &[S], prefix: &str) -> Vec<String> {
    values
        .iter()
        .map(|value| to_resource_reference(value.as_ref(), prefix))
        .collect()
}

/// Returns `source` minus every value in `to_remove`.
///
/// An empty `to_remove` returns `source` untouched.
#[must_use]
pub fn remove_references(source: &[Reference], to_remove: &[Reference]) -> Vec<Reference> {
    if to_remove.is_empty() {
        return source.to_vec();
    }

    let removed: HashSet<&Reference> = to_remove.iter().collect();
    source
        .iter()
        .filter(|reference| !removed.contains(reference))
        .cloned()
        .collect()
}

/// Deduplicates typed references, preserving first-seen order.
#[must_use]
pub fn dedupe_references(references: &[Reference]) -> Vec<Reference> {
    let mut seen = HashSet::new();
    references
        .iter()
        .filter(|reference| seen.insert(*reference))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{
        Reference, ReferenceKind, dedupe_references, remove_references, to_resource_id,
        to_resource_reference, unique_references,
    };

    fn reference(value: &str) -> Reference {
        Reference::parse(value).unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn parse_splits_prefix_and_id() {
        let parsed = reference("ResearchSubject/abc");
        assert_eq!(parsed.kind(), &ReferenceKind::ResearchSubject);
        assert_eq!(parsed.id(), "abc");
        assert_eq!(parsed.to_string(), "ResearchSubject/abc");
    }

    #[test]
    fn parse_rejects_values_without_prefix() {
        assert!(Reference::parse("abc").is_err());
        assert!(Reference::parse("/abc").is_err());
        assert!(Reference::parse("UserProfile/").is_err());
        assert!(Reference::parse("UserProfile/a/b").is_err());
    }

    #[test]
    fn unknown_prefix_is_kept_as_other() {
        let parsed = reference("Device/7");
        assert_eq!(parsed.kind(), &ReferenceKind::Other("Device".to_owned()));
        assert_eq!(parsed.to_string(), "Device/7");
    }

    #[test]
    fn profile_accepts_bare_id_and_reference() {
        let from_id = Reference::profile("p-1");
        let from_reference = Reference::profile("UserProfile/p-1");
        assert!(from_id.is_ok());
        assert_eq!(
            from_id.unwrap_or_else(|_| unreachable!()),
            from_reference.unwrap_or_else(|_| unreachable!())
        );
    }

    #[test]
    fn profile_does_not_strip_other_prefixes() {
        assert!(Reference::profile("ResearchSubject/p-1").is_err());
    }

    #[test]
    fn unique_references_filters_blank_and_foreign_values() {
        let values = [
            "UserProfile/1",
            "",
            "ResearchSubject/2",
            "UserProfile/1",
            "UserProfile/3",
        ];
        assert_eq!(
            unique_references(&values, "UserProfile"),
            vec!["UserProfile/1".to_owned(), "UserProfile/3".to_owned()]
        );
    }

    #[test]
    fn conversion_leaves_other_prefixes_alone() {
        assert_eq!(
            to_resource_id("ResearchSubject/1", "UserProfile"),
            "ResearchSubject/1"
        );
        assert_eq!(
            to_resource_reference("ResearchSubject/1", "UserProfile"),
            "ResearchSubject/1"
        );
        assert_eq!(to_resource_id("UserProfile/1", "UserProfile"), "1");
    }

    #[test]
    fn remove_references_with_empty_removal_keeps_source() {
        let source = vec![reference("UserProfile/1"), reference("UserProfile/2")];
        assert_eq!(remove_references(&source, &[]), source);
        assert_eq!(
            remove_references(&source, &[reference("UserProfile/2")]),
            vec![reference("UserProfile/1")]
        );
    }

    #[test]
    fn dedupe_references_keeps_first_occurrence() {
        let source = vec![
            reference("UserProfile/2"),
            reference("UserProfile/1"),
            reference("UserProfile/2"),
        ];
        assert_eq!(
            dedupe_references(&source),
            vec![reference("UserProfile/2"), reference("UserProfile/1")]
        );
    }

    proptest! {
        #[test]
        fn reference_conversion_round_trips(
            id in "[A-Za-z0-9-]{1,36}",
            prefix in "(UserProfile|ResearchSubject|Policy|StudySite)",
        ) {
            let as_reference = to_resource_reference(&id, &prefix);
            prop_assert_eq!(to_resource_id(&as_reference, &prefix), id);
            prop_assert_eq!(to_resource_reference(&as_reference, &prefix), as_reference);
        }
    }
}
