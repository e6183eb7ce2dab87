//! Database and configuration models.

pub mod config;
pub mod member;
