use async_trait::async_trait;

use cohort_core::AppResult;
use cohort_domain::{Connection, ConnectionQuery};

/// Repository port for connection lookups.
#[async_trait]
pub trait ConnectionRepository: Send + Sync {
    /// Lists non-deleted connections matching every part of `query`.
    async fn list_connections(&self, query: &ConnectionQuery) -> AppResult<Vec<Connection>>;
}
