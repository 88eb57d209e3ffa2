//! Database-specific error types and conversions.

use tessera_core::error::TesseraError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Invalid stored value: {0}")]
    Decode(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Record already exists: {entity}")]
    Duplicate { entity: String },
}

impl From<DbError> for TesseraError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => TesseraError::NotFound { entity, id },
            DbError::Duplicate { entity } => TesseraError::Duplicate { entity },
            other => TesseraError::Database(other.to_string()),
        }
    }
}

/// Parse a UUID stored as a string column.
pub(crate) fn parse_uuid(raw: &str, what: &str) -> Result<uuid::Uuid, DbError> {
    uuid::Uuid::parse_str(raw).map_err(|e| DbError::Decode(format!("invalid {what} UUID: {e}")))
}
