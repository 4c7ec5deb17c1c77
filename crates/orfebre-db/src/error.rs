//! # Ledger Errors
//!
//! Everything the storage layer can fail with. Engine errors raised while
//! costing stored data pass through unchanged as [`DbError::Core`].
//!
//! ```text
//!   sqlx::Error ──┐
//!   MigrateError ─┼──► DbError ──► seed binary / admin command
//!   CoreError ────┘
//! ```

use orfebre_core::CoreError;
use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation (duplicate lot id, stone id, ...).
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// A CHECK constraint rejected the row (negative grams, remaining above
    /// purchased, rate outside `[0, 1)`).
    #[error("Constraint rejected row: {0}")]
    CheckViolation(String),

    /// A row changed between the read and the write.
    ///
    /// ## When This Occurs
    /// - Two callers consume from the same lot concurrently
    /// - The same `ConsumptionResult` is applied twice
    ///
    /// The whole write was rolled back; re-read the lots and recompute.
    #[error("Concurrent modification of {entity} {id}")]
    Conflict { entity: String, id: String },

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// The costing engine rejected the stored data.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a Conflict error for a given entity type and ID.
    pub fn conflict(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::Conflict {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// True for errors a caller can resolve by re-reading and retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DbError::Conflict { .. } | DbError::PoolExhausted)
    }
}

/// ```text
/// RowNotFound          → NotFound
/// UNIQUE failed        → UniqueViolation (field = "table.column")
/// CHECK failed         → CheckViolation
/// other database error → QueryFailed
/// PoolTimedOut         → PoolExhausted
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite: "UNIQUE constraint failed: <table>.<column>"
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("CHECK constraint failed") {
                    DbError::CheckViolation(msg.to_string())
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<orfebre_core::ValidationError> for DbError {
    fn from(err: orfebre_core::ValidationError) -> Self {
        DbError::Core(CoreError::from(err))
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_is_retryable() {
        assert!(DbError::conflict("MetalLot", "lot-1").is_retryable());
        assert!(!DbError::not_found("MetalLot", "lot-1").is_retryable());
    }

    #[test]
    fn test_core_errors_pass_through() {
        let err: DbError = CoreError::configuration("grams_produced_per_month", "zero").into();
        assert!(matches!(err, DbError::Core(CoreError::Configuration { .. })));
        assert!(err.to_string().contains("grams_produced_per_month"));
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: DbError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
