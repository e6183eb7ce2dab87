//! Per-request cancellation and deadline.
//!
//! The caller builds a [`QueryContext`] and the query layer hands the same
//! value to every executor call it makes. Executors check it before touching
//! storage; nothing above them enforces it.

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::repository::errors::{ExecutionResult, QueryExecutionError};

#[derive(Clone, Debug, Default)]
pub struct QueryContext {
    deadline: Option<Instant>,
    cancellation: Option<CancellationToken>,
}

impl QueryContext {
    /// A context that never expires and cannot be cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Deadline `timeout` from now. A timeout too large to represent means
    /// no deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Instant::now().checked_add(timeout);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancellation(&self) -> Option<&CancellationToken> {
        self.cancellation.as_ref()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    /// Time left before the deadline, zero once it has passed.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Fails if the request was cancelled or its deadline has passed.
    pub fn check(&self) -> ExecutionResult<()> {
        if self.is_cancelled() {
            return Err(QueryExecutionError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                Err(QueryExecutionError::DeadlineExceeded)
            }
            _ => Ok(()),
        }
    }
}
