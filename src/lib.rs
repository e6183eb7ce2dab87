//! Dynamic member search over a member/team store.
//!
//! A sparse [`MemberSearchCondition`](domain::member::MemberSearchCondition)
//! is turned into predicates, composed into a [`QuerySpec`](query::QuerySpec)
//! and paginated through any [`QueryExecutor`](repository::QueryExecutor).
//! [`services::member::search_members`] wires these steps together.

pub mod db;
pub mod domain;
pub mod models;
pub mod query;
pub mod repository;
pub mod schema;
pub mod services;
