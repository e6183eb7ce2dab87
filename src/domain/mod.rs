//! Domain records exposed by the member search layer.

pub mod member;
pub mod types;
