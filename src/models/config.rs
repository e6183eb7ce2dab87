//! Configuration model loaded from external sources.

use std::time::Duration;

use serde::Deserialize;

use crate::db::ConnectionOptions;
use crate::domain::member::MemberSearchCondition;
use crate::query::page::PageRequest;
use crate::repository::QueryContext;

fn default_page() -> PageRequest {
    PageRequest::new(0, 20)
}

#[derive(Clone, Debug, Deserialize)]
/// Settings for the `member-search` runner.
pub struct AppConfig {
    pub database_url: String,
    /// How long a query waits on a locked database before failing.
    pub busy_timeout_ms: Option<u64>,
    /// Open connections with `PRAGMA query_only`.
    #[serde(default)]
    pub read_only: bool,
    pub max_connections: Option<u32>,
    /// Deadline for the whole search, fetch and count together.
    pub query_timeout_ms: Option<u64>,
    #[serde(default)]
    pub search: MemberSearchCondition,
    #[serde(default = "default_page")]
    pub page: PageRequest,
}

impl AppConfig {
    /// A fresh context for one search. The deadline starts now.
    pub fn query_context(&self) -> QueryContext {
        match self.query_timeout_ms {
            Some(ms) => QueryContext::new().with_timeout(Duration::from_millis(ms)),
            None => QueryContext::new(),
        }
    }

    pub fn connection_options(&self) -> ConnectionOptions {
        ConnectionOptions {
            busy_timeout: self
                .busy_timeout_ms
                .map(Duration::from_millis)
                .or(ConnectionOptions::default().busy_timeout),
            read_only: self.read_only,
            max_connections: self.max_connections,
            ..ConnectionOptions::default()
        }
    }
}
