//! In-process member/team store that evaluates [`QuerySpec`]s directly.
//!
//! Join, filter and sort semantics follow the SQLite executor so the two can
//! be swapped in tests. Like it, rows always carry the member's team; the
//! join kind only decides whether teamless members are dropped.

use std::cmp::Ordering;

use crate::domain::member::{Member, MemberTeamDto, Team};
use crate::query::predicate::{Field, Record, Relation, Value};
use crate::query::spec::{JoinKind, QuerySpec};
use crate::repository::{QueryContext, QueryExecutor};
use crate::repository::errors::{ExecutionResult, QueryExecutionError};

#[derive(Clone, Debug, Default)]
pub struct InMemoryRepository {
    teams: Vec<Team>,
    members: Vec<Member>,
}

/// A member with its team, if it has one.
struct JoinedRow<'a> {
    member: &'a Member,
    team: Option<&'a Team>,
}

impl Record for JoinedRow<'_> {
    fn value(&self, field: Field) -> Option<Value> {
        match field {
            Field::MemberId => Some(self.member.id.get().into()),
            Field::Username => self.member.username.as_deref().map(Value::from),
            Field::Age => Some(self.member.age.into()),
            Field::TeamId => self.member.team_id.map(|id| id.get().into()),
            Field::TeamName => self.team.map(|team| team.name.as_str().into()),
        }
    }
}

impl JoinedRow<'_> {
    fn to_dto(&self) -> MemberTeamDto {
        MemberTeamDto {
            member_id: self.member.id,
            username: self.member.username.clone(),
            age: self.member.age,
            team_id: self.member.team_id,
            team_name: self.team.map(|team| team.name.clone()),
        }
    }
}

impl InMemoryRepository {
    pub fn new(teams: Vec<Team>, members: Vec<Member>) -> Self {
        Self { teams, members }
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    fn matching_rows(&self, spec: &QuerySpec) -> ExecutionResult<Vec<JoinedRow<'_>>> {
        let join = spec.join_kind(Relation::Team);
        if join.is_none() && spec.filters_on(Relation::Team) {
            return Err(QueryExecutionError::MissingJoin(Relation::Team));
        }

        let mut rows = Vec::new();
        for member in &self.members {
            let team = member
                .team_id
                .and_then(|id| self.teams.iter().find(|team| team.id == id));
            if join == Some(JoinKind::Inner) && team.is_none() {
                continue;
            }

            let row = JoinedRow { member, team };
            if spec.predicates().iter().all(|predicate| predicate.matches(&row)) {
                rows.push(row);
            }
        }

        rows.sort_by(|a, b| {
            spec.ordering()
                .iter()
                .map(|sort| {
                    sort.compare(a.value(sort.field).as_ref(), b.value(sort.field).as_ref())
                })
                .find(|ordering| *ordering != Ordering::Equal)
                .unwrap_or_else(|| a.member.id.cmp(&b.member.id))
        });

        Ok(rows)
    }
}

impl QueryExecutor for InMemoryRepository {
    type Row = MemberTeamDto;

    fn fetch(
        &self,
        spec: &QuerySpec,
        limit: u32,
        offset: u64,
        ctx: &QueryContext,
    ) -> ExecutionResult<Vec<MemberTeamDto>> {
        ctx.check()?;
        let skip = usize::try_from(offset).unwrap_or(usize::MAX);
        Ok(self
            .matching_rows(spec)?
            .iter()
            .skip(skip)
            .take(limit as usize)
            .map(JoinedRow::to_dto)
            .collect())
    }

    fn fetch_all(
        &self,
        spec: &QuerySpec,
        ctx: &QueryContext,
    ) -> ExecutionResult<Vec<MemberTeamDto>> {
        ctx.check()?;
        Ok(self
            .matching_rows(spec)?
            .iter()
            .map(JoinedRow::to_dto)
            .collect())
    }

    fn count(&self, spec: &QuerySpec, ctx: &QueryContext) -> ExecutionResult<u64> {
        ctx.check()?;
        Ok(self.matching_rows(spec)?.len() as u64)
    }
}
