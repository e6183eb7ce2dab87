//! Strongly-typed identifiers used by domain records and search conditions.
//!
//! Once a value is wrapped it is known to be a valid database key, so the
//! query layer can bind it without re-checking.
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced when attempting to construct a constrained value object.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeConstraintError {
    /// Provided identifier is zero or negative.
    #[error("id must be greater than zero, got {0}")]
    NonPositiveId(i64),
    /// Provided identifier does not fit the `INTEGER` key column.
    #[error("id {0} is out of range")]
    IdOutOfRange(i64),
    /// Provided text is not an integer.
    #[error("invalid id: {0:?}")]
    MalformedId(String),
}

/// Generates a positive `i32` key newtype.
///
/// Keys are checked once at the boundary (database row, config value or
/// command-line text) and are plain `Copy` integers afterwards.
macro_rules! positive_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[serde(try_from = "i64", into = "i32")]
        pub struct $name(i32);

        impl $name {
            pub fn new(value: i32) -> Result<Self, TypeConstraintError> {
                Self::try_from(i64::from(value))
            }

            pub const fn get(self) -> i32 {
                self.0
            }
        }

        impl TryFrom<i64> for $name {
            type Error = TypeConstraintError;

            fn try_from(value: i64) -> Result<Self, Self::Error> {
                if value <= 0 {
                    return Err(TypeConstraintError::NonPositiveId(value));
                }
                i32::try_from(value)
                    .map(Self)
                    .map_err(|_| TypeConstraintError::IdOutOfRange(value))
            }
        }

        impl FromStr for $name {
            type Err = TypeConstraintError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let value = s
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| TypeConstraintError::MalformedId(s.to_owned()))?;
                Self::try_from(value)
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$name> for i32 {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl From<$name> for i64 {
            fn from(value: $name) -> Self {
                i64::from(value.0)
            }
        }
    };
}

positive_id!(MemberId, "Primary key of a member row.");
positive_id!(TeamId, "Primary key of a team row.");
