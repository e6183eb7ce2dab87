use thiserror::Error;

use crate::repository::errors::QueryExecutionError;

pub mod member;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Reserved for semantic checks on search conditions. Every condition is
    /// currently accepted as-is.
    #[error("Invalid search condition: {0}")]
    InvalidCondition(String),

    #[error(transparent)]
    Execution(#[from] QueryExecutionError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;
