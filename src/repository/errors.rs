use diesel::r2d2::PoolError;
use diesel::result::Error as DieselError;
use thiserror::Error;

use crate::domain::types::TypeConstraintError;
use crate::query::predicate::Relation;

/// Failure raised by a [`QueryExecutor`](crate::repository::QueryExecutor).
///
/// The underlying cause is kept as the error source so callers can inspect
/// it; nothing in this crate retries or recovers from these.
#[derive(Debug, Error)]
pub enum QueryExecutionError {
    #[error("Connection error: {0}")]
    Connection(#[from] PoolError),

    #[error("Database error: {0}")]
    Database(#[from] DieselError),

    #[error("Invalid row: {0}")]
    InvalidRow(#[from] TypeConstraintError),

    #[error("Unsupported predicate: {0}")]
    UnsupportedPredicate(String),

    #[error("Query reads {0} fields without joining it")]
    MissingJoin(Relation),

    #[error("Query cancelled by caller")]
    Cancelled,

    #[error("Query deadline exceeded")]
    DeadlineExceeded,
}

pub type ExecutionResult<T> = Result<T, QueryExecutionError>;

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn database_errors_keep_their_cause() {
        let err = QueryExecutionError::from(DieselError::NotFound);

        assert_eq!(err.to_string(), "Database error: Record not found");
        assert!(err.source().is_some());
    }

    #[test]
    fn missing_join_names_the_relation() {
        let err = QueryExecutionError::MissingJoin(Relation::Team);
        assert_eq!(err.to_string(), "Query reads team fields without joining it");
    }
}
