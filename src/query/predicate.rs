//! Search fields, literal values and the predicates built from a
//! [`MemberSearchCondition`].

use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::domain::member::MemberSearchCondition;

/// Entity a field is read from. `Member` is the query root.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    Member,
    Team,
}

impl Display for Relation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Relation::Member => write!(f, "member"),
            Relation::Team => write!(f, "team"),
        }
    }
}

/// A column that can be projected, filtered or sorted on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    MemberId,
    Username,
    Age,
    /// The member's foreign key, so filtering on it needs no join.
    TeamId,
    TeamName,
}

impl Field {
    pub const fn relation(self) -> Relation {
        match self {
            Field::MemberId | Field::Username | Field::Age | Field::TeamId => Relation::Member,
            Field::TeamName => Relation::Team,
        }
    }
}

impl Display for Field {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Field::MemberId => "member.id",
            Field::Username => "member.username",
            Field::Age => "member.age",
            Field::TeamId => "member.team_id",
            Field::TeamName => "team.name",
        };
        f.write_str(name)
    }
}

/// Literal operand of a predicate.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Text(String),
}

impl Value {
    /// Compares two values of the same kind. Mixed kinds are incomparable.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Text(v) => write!(f, "'{v}'"),
        }
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

/// Anything a predicate can be evaluated against. `None` is SQL `NULL`.
pub trait Record {
    fn value(&self, field: Field) -> Option<Value>;
}

/// A single comparison against one field. A query's predicates are always
/// combined with AND.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    Eq(Field, Value),
    Gt(Field, Value),
    Goe(Field, Value),
    Lt(Field, Value),
    Loe(Field, Value),
    /// SQL `LIKE` pattern with `%` and `_` wildcards.
    Like(Field, String),
    /// Inclusive on both ends.
    Between(Field, Value, Value),
}

impl Predicate {
    pub fn field(&self) -> Field {
        match self {
            Predicate::Eq(field, _)
            | Predicate::Gt(field, _)
            | Predicate::Goe(field, _)
            | Predicate::Lt(field, _)
            | Predicate::Loe(field, _)
            | Predicate::Like(field, _)
            | Predicate::Between(field, _, _) => *field,
        }
    }

    /// Evaluates the predicate with SQL semantics: a `NULL` field or an
    /// operand of the wrong kind never matches.
    pub fn matches<R: Record + ?Sized>(&self, record: &R) -> bool {
        let Some(actual) = record.value(self.field()) else {
            return false;
        };

        match self {
            Predicate::Eq(_, v) => actual.compare(v) == Some(Ordering::Equal),
            Predicate::Gt(_, v) => actual.compare(v) == Some(Ordering::Greater),
            Predicate::Goe(_, v) => matches!(
                actual.compare(v),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Predicate::Lt(_, v) => actual.compare(v) == Some(Ordering::Less),
            Predicate::Loe(_, v) => {
                matches!(actual.compare(v), Some(Ordering::Less | Ordering::Equal))
            }
            Predicate::Between(_, low, high) => {
                matches!(actual.compare(low), Some(Ordering::Greater | Ordering::Equal))
                    && matches!(actual.compare(high), Some(Ordering::Less | Ordering::Equal))
            }
            Predicate::Like(_, pattern) => match actual {
                Value::Text(text) => like_matches(pattern, &text),
                Value::Int(_) => false,
            },
        }
    }
}

impl Display for Predicate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Predicate::Eq(field, v) => write!(f, "{field} = {v}"),
            Predicate::Gt(field, v) => write!(f, "{field} > {v}"),
            Predicate::Goe(field, v) => write!(f, "{field} >= {v}"),
            Predicate::Lt(field, v) => write!(f, "{field} < {v}"),
            Predicate::Loe(field, v) => write!(f, "{field} <= {v}"),
            Predicate::Like(field, pattern) => write!(f, "{field} LIKE '{pattern}'"),
            Predicate::Between(field, low, high) => {
                write!(f, "{field} BETWEEN {low} AND {high}")
            }
        }
    }
}

/// ASCII case-insensitive `LIKE`, matching SQLite's default behaviour.
fn like_matches(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().map(|c| c.to_ascii_lowercase()).collect();
    let text: Vec<char> = text.chars().map(|c| c.to_ascii_lowercase()).collect();

    let (mut p, mut t) = (0, 0);
    // Position of the last `%` and the text index it is currently absorbing up to.
    let mut resume: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && pattern[p] == '%' {
            resume = Some((p, t));
            p += 1;
        } else if p < pattern.len() && (pattern[p] == '_' || pattern[p] == text[t]) {
            p += 1;
            t += 1;
        } else if let Some((star, absorbed)) = resume {
            p = star + 1;
            t = absorbed + 1;
            resume = Some((star, absorbed + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|c| *c == '%')
}

/// Translates every populated field of `condition` into exactly one
/// predicate. An empty condition yields an empty set, i.e. an unfiltered scan.
pub fn build_predicates(condition: &MemberSearchCondition) -> Vec<Predicate> {
    [
        username_eq(condition.username.as_deref()),
        username_contains(condition.username_contains.as_deref()),
        team_id_eq(condition.team_id.map(i32::from)),
        team_name_eq(condition.team_name.as_deref()),
        age_goe(condition.age_goe),
        age_loe(condition.age_loe),
    ]
    .into_iter()
    .flatten()
    .collect()
}

fn username_eq(username: Option<&str>) -> Option<Predicate> {
    username.map(|u| Predicate::Eq(Field::Username, u.into()))
}

fn username_contains(fragment: Option<&str>) -> Option<Predicate> {
    fragment.map(|f| Predicate::Like(Field::Username, format!("%{f}%")))
}

fn team_id_eq(team_id: Option<i32>) -> Option<Predicate> {
    team_id.map(|id| Predicate::Eq(Field::TeamId, id.into()))
}

fn team_name_eq(team_name: Option<&str>) -> Option<Predicate> {
    team_name.map(|name| Predicate::Eq(Field::TeamName, name.into()))
}

fn age_goe(age: Option<i32>) -> Option<Predicate> {
    age.map(|a| Predicate::Goe(Field::Age, a.into()))
}

fn age_loe(age: Option<i32>) -> Option<Predicate> {
    age.map(|a| Predicate::Loe(Field::Age, a.into()))
}
