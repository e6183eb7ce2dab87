//! Query execution boundary.
//!
//! The query layer never talks to storage directly. It hands a
//! [`QuerySpec`] to a [`QueryExecutor`], which owns connections and any retry
//! policy. The caller's [`QueryContext`] is passed along to every call as is.

use crate::db::{DbConnection, DbPool, get_connection, get_connection_timeout};
use crate::query::spec::QuerySpec;
use crate::repository::errors::ExecutionResult;

pub mod context;
pub mod errors;
pub mod member;
pub mod memory;
#[cfg(any(test, feature = "test-mocks"))]
pub mod mock;

pub use context::QueryContext;
pub use memory::InMemoryRepository;

/// Read-only executor for composed queries.
///
/// Implementations fail with [`Cancelled`](errors::QueryExecutionError::Cancelled)
/// or [`DeadlineExceeded`](errors::QueryExecutionError::DeadlineExceeded)
/// instead of running a query once `ctx` no longer allows it.
pub trait QueryExecutor {
    type Row;

    /// Loads at most `limit` rows starting at `offset`, in the query's order.
    fn fetch(
        &self,
        spec: &QuerySpec,
        limit: u32,
        offset: u64,
        ctx: &QueryContext,
    ) -> ExecutionResult<Vec<Self::Row>>;

    /// Loads every matching row, in the query's order.
    fn fetch_all(&self, spec: &QuerySpec, ctx: &QueryContext) -> ExecutionResult<Vec<Self::Row>>;

    /// Counts matching rows. Projection and ordering are ignored.
    fn count(&self, spec: &QuerySpec, ctx: &QueryContext) -> ExecutionResult<u64>;
}

/// Diesel-backed executor over a pooled SQLite database.
#[derive(Clone)]
pub struct DieselRepository {
    pool: DbPool,
}

impl DieselRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Checks out a connection, waiting no longer than the caller's deadline.
    fn conn(&self, ctx: &QueryContext) -> ExecutionResult<DbConnection> {
        ctx.check()?;
        let conn = match ctx.remaining() {
            Some(remaining) => get_connection_timeout(&self.pool, remaining)?,
            None => get_connection(&self.pool)?,
        };
        ctx.check()?;
        Ok(conn)
    }
}
