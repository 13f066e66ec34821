use std::sync::Arc;

use cohort_core::AppResult;
use cohort_domain::{Connection, ConnectionQuery, ConnectionStatus, ConnectionType, Reference};
use tracing::debug;

use crate::access_ports::ConnectionRepository;

/// Directed connection lookups between profiles.
///
/// A connection grants `to` access to data owned by `from`, so callers pass
/// the owner as `from` and the acting profile as `to`.
#[derive(Clone)]
pub struct ConnectionStore {
    repository: Arc<dyn ConnectionRepository>,
}

impl ConnectionStore {
    /// Creates a store backed by a connection repository.
    #[must_use]
    pub fn new(repository: Arc<dyn ConnectionRepository>) -> Self {
        Self { repository }
    }

    /// Returns the connections from `from` to `to` of an accepted type and
    /// status. An empty result means no connection.
    pub async fn has_connection(
        &self,
        from: &Reference,
        to: &Reference,
        types: &[ConnectionType],
        statuses: &[ConnectionStatus],
    ) -> AppResult<Vec<Connection>> {
        self.connections(std::slice::from_ref(from), to, types, statuses)
            .await
    }

    /// Batch form of [`ConnectionStore::has_connection`]: any profile in
    /// `from` may be the connection's origin.
    pub async fn connections(
        &self,
        from: &[Reference],
        to: &Reference,
        types: &[ConnectionType],
        statuses: &[ConnectionStatus],
    ) -> AppResult<Vec<Connection>> {
        let from: Vec<Reference> = from
            .iter()
            .filter(|reference| reference.is_user_profile())
            .cloned()
            .collect();
        if from.is_empty() || !to.is_user_profile() || types.is_empty() || statuses.is_empty() {
            debug!(to = %to, "connection lookup skipped for non-profile or empty filter");
            return Ok(Vec::new());
        }

        self.repository
            .list_connections(&ConnectionQuery {
                from,
                to: to.clone(),
                types: types.to_vec(),
                statuses: statuses.to_vec(),
            })
            .await
    }
}
