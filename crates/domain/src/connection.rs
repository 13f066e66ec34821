use std::str::FromStr;

use chrono::{DateTime, Utc};
use cohort_core::AppError;
use serde::{Deserialize, Serialize};

use crate::Reference;

/// Relationship carried by a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionType {
    /// Clinical partner (care provider).
    Partner,
    /// Delegate acting on the owner's behalf.
    Delegate,
    /// Peer sharing under sharing rules.
    Friend,
}

impl ConnectionType {
    /// Types accepted by plain owner/information-source checks.
    pub const CARE: [Self; 2] = [Self::Partner, Self::Delegate];

    /// Types accepted by sharing-rule checks.
    pub const SHARING: [Self; 3] = [Self::Partner, Self::Delegate, Self::Friend];

    /// Returns a stable storage value for the connection type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Partner => "partner",
            Self::Delegate => "delegate",
            Self::Friend => "friend",
        }
    }
}

impl FromStr for ConnectionType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "partner" => Ok(Self::Partner),
            "delegate" => Ok(Self::Delegate),
            "friend" => Ok(Self::Friend),
            _ => Err(AppError::Validation(format!(
                "unknown connection type '{value}'"
            ))),
        }
    }
}

/// Lifecycle status of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// Requested, awaiting acceptance.
    Pending,
    /// Accepted and granting access.
    Active,
    /// Declined by the recipient.
    Rejected,
    /// Withdrawn after acceptance.
    Revoked,
}

impl ConnectionStatus {
    /// Returns a stable storage value for the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Rejected => "rejected",
            Self::Revoked => "revoked",
        }
    }
}

impl FromStr for ConnectionStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "active" => Ok(Self::Active),
            "rejected" => Ok(Self::Rejected),
            "revoked" => Ok(Self::Revoked),
            _ => Err(AppError::Validation(format!(
                "unknown connection status '{value}'"
            ))),
        }
    }
}

/// Directed grant letting `to` access data owned by `from`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    /// Bare connection id.
    pub id: String,
    /// Profile whose data is shared.
    pub from: Reference,
    /// Profile being granted access.
    pub to: Reference,
    /// Relationship type.
    pub connection_type: ConnectionType,
    /// Lifecycle status.
    pub status: ConnectionStatus,
    /// Expiry of a pending request.
    #[serde(default)]
    pub request_expiration_date: Option<DateTime<Utc>>,
    /// Soft-delete marker.
    #[serde(default)]
    pub is_deleted: bool,
}

/// Filter describing which connections to look up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionQuery {
    /// Accepted `from` profiles (OR).
    pub from: Vec<Reference>,
    /// Required `to` profile.
    pub to: Reference,
    /// Accepted connection types.
    pub types: Vec<ConnectionType>,
    /// Accepted statuses.
    pub statuses: Vec<ConnectionStatus>,
}

impl ConnectionQuery {
    /// Returns whether a stored connection satisfies this query.
    #[must_use]
    pub fn matches(&self, connection: &Connection) -> bool {
        !connection.is_deleted
            && self.from.contains(&connection.from)
            && connection.to == self.to
            && self.types.contains(&connection.connection_type)
            && self.statuses.contains(&connection.status)
    }
}

#[cfg(test)]
mod tests {
    use super::{Connection, ConnectionQuery, ConnectionStatus, ConnectionType};
    use crate::Reference;

    fn profile(id: &str) -> Reference {
        Reference::profile(id).unwrap_or_else(|_| unreachable!())
    }

    fn connection(status: ConnectionStatus, is_deleted: bool) -> Connection {
        Connection {
            id: "c-1".to_owned(),
            from: profile("patient-1"),
            to: profile("prac-1"),
            connection_type: ConnectionType::Partner,
            status,
            request_expiration_date: None,
            is_deleted,
        }
    }

    fn query(from: &str, to: &str) -> ConnectionQuery {
        ConnectionQuery {
            from: vec![profile(from)],
            to: profile(to),
            types: ConnectionType::CARE.to_vec(),
            statuses: vec![ConnectionStatus::Active],
        }
    }

    #[test]
    fn query_matches_active_connection_in_stored_direction() {
        let stored = connection(ConnectionStatus::Active, false);
        assert!(query("patient-1", "prac-1").matches(&stored));
        assert!(!query("prac-1", "patient-1").matches(&stored));
    }

    #[test]
    fn query_ignores_pending_and_deleted_connections() {
        assert!(
            !query("patient-1", "prac-1").matches(&connection(ConnectionStatus::Pending, false))
        );
        assert!(!query("patient-1", "prac-1").matches(&connection(ConnectionStatus::Active, true)));
    }

    #[test]
    fn friend_connection_only_matches_sharing_types() {
        let mut stored = connection(ConnectionStatus::Active, false);
        stored.connection_type = ConnectionType::Friend;
        assert!(!query("patient-1", "prac-1").matches(&stored));

        let mut sharing = query("patient-1", "prac-1");
        sharing.types = ConnectionType::SHARING.to_vec();
        assert!(sharing.matches(&stored));
    }
}
