use async_trait::async_trait;
use chrono::{DateTime, Utc};

use cohort_application::ConnectionRepository;
use cohort_core::{AppError, AppResult};
use cohort_domain::{Connection, ConnectionQuery};

use sqlx::{FromRow, PgPool};

use crate::postgres_decode::{decode_reference, decode_value, reference_values};

/// PostgreSQL-backed repository for directed profile connections.
#[derive(Clone)]
pub struct PostgresConnectionRepository {
    pool: PgPool,
}

impl PostgresConnectionRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ConnectionRow {
    id: String,
    from_reference: String,
    to_reference: String,
    connection_type: String,
    status: String,
    request_expiration_date: Option<DateTime<Utc>>,
    is_deleted: bool,
}

impl ConnectionRow {
    fn into_connection(self) -> AppResult<Connection> {
        Ok(Connection {
            from: decode_reference(&self.from_reference, "connection from reference")?,
            to: decode_reference(&self.to_reference, "connection to reference")?,
            connection_type: decode_value(&self.connection_type, "connection type")?,
            status: decode_value(&self.status, "connection status")?,
            request_expiration_date: self.request_expiration_date,
            is_deleted: self.is_deleted,
            id: self.id,
        })
    }
}

#[async_trait]
impl ConnectionRepository for PostgresConnectionRepository {
    async fn list_connections(&self, query: &ConnectionQuery) -> AppResult<Vec<Connection>> {
        let types: Vec<&str> = query
            .types
            .iter()
            .map(|connection_type| connection_type.as_str())
            .collect();
        let statuses: Vec<&str> = query.statuses.iter().map(|status| status.as_str()).collect();

        let rows = sqlx::query_as::<_, ConnectionRow>(
            r#"
            SELECT
                id,
                from_reference,
                to_reference,
                connection_type,
                status,
                request_expiration_date,
                is_deleted
            FROM connections
            WHERE from_reference = ANY($1)
              AND to_reference = $2
              AND connection_type = ANY($3)
              AND status = ANY($4)
              AND is_deleted = FALSE
            ORDER BY id
            "#,
        )
        .bind(reference_values(&query.from))
        .bind(query.to.to_string())
        .bind(&types)
        .bind(&statuses)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to load connections to '{}': {error}",
                query.to
            ))
        })?;

        rows.into_iter().map(ConnectionRow::into_connection).collect()
    }
}
