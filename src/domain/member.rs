use serde::{Deserialize, Serialize};

use crate::domain::types::{MemberId, TeamId};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Member {
    pub id: MemberId,
    pub username: Option<String>,
    pub age: i32,
    pub team_id: Option<TeamId>,
}

/// Flattened member row joined with its team.
///
/// Only ever produced by a query; there is no way to persist it.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct MemberTeamDto {
    pub member_id: MemberId,
    pub username: Option<String>,
    pub age: i32,
    pub team_id: Option<TeamId>,
    pub team_name: Option<String>,
}

/// Optional filters for a member search. Every populated field narrows the
/// result set; an empty condition matches every member.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MemberSearchCondition {
    pub username: Option<String>,
    pub username_contains: Option<String>,
    pub team_id: Option<TeamId>,
    pub team_name: Option<String>,
    pub age_goe: Option<i32>,
    pub age_loe: Option<i32>,
}

fn non_blank(value: impl Into<String>) -> Option<String> {
    Some(value.into().trim().to_string()).filter(|s| !s.is_empty())
}

impl MemberSearchCondition {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact username match. Blank input leaves the filter unset.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = non_blank(username);
        self
    }

    /// Substring username match. Blank input leaves the filter unset.
    pub fn username_contains(mut self, fragment: impl Into<String>) -> Self {
        self.username_contains = non_blank(fragment);
        self
    }

    pub fn team_id(mut self, team_id: TeamId) -> Self {
        self.team_id = Some(team_id);
        self
    }

    /// Exact team name match. Blank input leaves the filter unset.
    pub fn team_name(mut self, team_name: impl Into<String>) -> Self {
        self.team_name = non_blank(team_name);
        self
    }

    /// Inclusive lower age bound.
    pub fn age_goe(mut self, age: i32) -> Self {
        self.age_goe = Some(age);
        self
    }

    /// Inclusive upper age bound.
    pub fn age_loe(mut self, age: i32) -> Self {
        self.age_loe = Some(age);
        self
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
