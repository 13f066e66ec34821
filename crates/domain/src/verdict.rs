//! Authorization verdicts and the grant algebra used to reason about them.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{Connection, Reference};

/// Access granted over a set of requested references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grant {
    /// Everything is granted.
    Full,
    /// Only the listed references are granted.
    Partial(BTreeSet<Reference>),
    /// Nothing is granted.
    None,
}

impl Grant {
    /// Builds a partial grant, collapsing an empty set into [`Grant::None`].
    #[must_use]
    pub fn of<I>(references: I) -> Self
    where
        I: IntoIterator<Item = Reference>,
    {
        let references: BTreeSet<Reference> = references.into_iter().collect();
        if references.is_empty() {
            Self::None
        } else {
            Self::Partial(references)
        }
    }

    /// Combines two grants; anything granted by either is granted.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        match (self, other) {
            (Self::Full, _) | (_, Self::Full) => Self::Full,
            (Self::None, grant) | (grant, Self::None) => grant,
            (Self::Partial(mut left), Self::Partial(right)) => {
                left.extend(right);
                Self::Partial(left)
            }
        }
    }

    /// Restricts two grants to what both allow.
    #[must_use]
    pub fn intersection(self, other: Self) -> Self {
        match (self, other) {
            (Self::None, _) | (_, Self::None) => Self::None,
            (Self::Full, grant) | (grant, Self::Full) => grant,
            (Self::Partial(left), Self::Partial(right)) => {
                Self::of(left.intersection(&right).cloned())
            }
        }
    }

    /// Returns whether `reference` is granted.
    #[must_use]
    pub fn contains(&self, reference: &Reference) -> bool {
        match self {
            Self::Full => true,
            Self::Partial(references) => references.contains(reference),
            Self::None => false,
        }
    }

    /// Returns whether every requested reference is granted.
    #[must_use]
    pub fn covers(&self, requested: &[Reference]) -> bool {
        requested.iter().all(|reference| self.contains(reference))
    }

    /// Returns the requested references that are granted, in request order.
    #[must_use]
    pub fn retain(&self, requested: &[Reference]) -> Vec<Reference> {
        requested
            .iter()
            .filter(|reference| self.contains(reference))
            .cloned()
            .collect()
    }
}

/// Outcome of one authorization call.
///
/// When `full_auth_granted` is false the caller must restrict the request to
/// [`AuthorizationVerdict::grant`] and deny everything outside it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationVerdict {
    /// No further reference-level filtering is needed.
    pub full_auth_granted: bool,
    /// Connections that grant access to some requested profiles.
    pub authorized_connections: Vec<Connection>,
    /// References cleared by ownership or policy.
    pub authorized_requestees: Vec<Reference>,
    /// Resource scopes cleared by policy.
    pub authorized_resource_scopes: Vec<Reference>,
    /// Resolved profile to the requested references that denote it.
    pub subject_to_profile_map: BTreeMap<Reference, Vec<Reference>>,
}

impl AuthorizationVerdict {
    /// A verdict that grants everything.
    #[must_use]
    pub fn full() -> Self {
        Self {
            full_auth_granted: true,
            ..Self::default()
        }
    }

    /// Returns the grant this verdict describes.
    ///
    /// A connection grants its `from` profile together with every requested
    /// reference that resolved to that profile.
    #[must_use]
    pub fn grant(&self) -> Grant {
        if self.full_auth_granted {
            return Grant::Full;
        }

        let connected = self.authorized_connections.iter().flat_map(|connection| {
            std::iter::once(connection.from.clone()).chain(
                self.subject_to_profile_map
                    .get(&connection.from)
                    .cloned()
                    .unwrap_or_default(),
            )
        });

        Grant::of(
            self.authorized_requestees
                .iter()
                .cloned()
                .chain(self.authorized_resource_scopes.iter().cloned())
                .chain(connected),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{AuthorizationVerdict, Grant};
    use crate::{Connection, ConnectionStatus, ConnectionType, Reference};

    fn reference(value: &str) -> Reference {
        Reference::parse(value).unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn union_and_intersection_follow_set_semantics() {
        let left = Grant::of([reference("UserProfile/1"), reference("UserProfile/2")]);
        let right = Grant::of([reference("UserProfile/2"), reference("UserProfile/3")]);

        let union = left.clone().union(right.clone());
        assert!(union.covers(&[
            reference("UserProfile/1"),
            reference("UserProfile/2"),
            reference("UserProfile/3"),
        ]));

        let intersection = left.intersection(right);
        assert_eq!(intersection, Grant::of([reference("UserProfile/2")]));

        assert_eq!(Grant::Full.union(Grant::None), Grant::Full);
        assert_eq!(Grant::Full.intersection(Grant::None), Grant::None);
        assert_eq!(Grant::of(Vec::new()), Grant::None);
    }

    #[test]
    fn verdict_grant_includes_aliases_reached_by_connections() {
        let patient = reference("UserProfile/patient-1");
        let subject = reference("ResearchSubject/rs-1");
        let verdict = AuthorizationVerdict {
            authorized_connections: vec![Connection {
                id: "c-1".to_owned(),
                from: patient.clone(),
                to: reference("UserProfile/prac-1"),
                connection_type: ConnectionType::Partner,
                status: ConnectionStatus::Active,
                request_expiration_date: None,
                is_deleted: false,
            }],
            subject_to_profile_map: BTreeMap::from([(
                patient.clone(),
                vec![patient.clone(), subject.clone()],
            )]),
            ..AuthorizationVerdict::default()
        };

        let grant = verdict.grant();
        assert!(grant.covers(&[patient, subject]));
        assert!(!grant.contains(&reference("UserProfile/stranger")));
    }

    #[test]
    fn retain_keeps_only_granted_references() {
        let grant = Grant::of([reference("UserProfile/1")]);
        assert_eq!(
            grant.retain(&[reference("UserProfile/1"), reference("UserProfile/2")]),
            vec![reference("UserProfile/1")]
        );
        assert!(Grant::None.covers(&[]));
    }
}
