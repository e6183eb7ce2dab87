//! Diesel interpretation of member/team [`QuerySpec`]s.
//!
//! Each query becomes a boxed select over `members`, joined to `teams` when
//! the query says so, with one `filter` per predicate and one `ORDER BY` term
//! per sort key. Rows always come back ordered by member id last so that
//! pages are stable. The caller's [`QueryContext`] is checked before and
//! after a connection is checked out.

use diesel::prelude::*;
use diesel::sqlite::Sqlite;

use crate::domain::member::MemberTeamDto;
use crate::models::member::MemberTeamRow;
use crate::query::predicate::{Field, Predicate, Relation, Value};
use crate::query::spec::{Direction, JoinKind, NullsOrder, QuerySpec};
use crate::repository::errors::{ExecutionResult, QueryExecutionError};
use crate::repository::{DieselRepository, QueryContext, QueryExecutor};
use crate::schema::{members, teams};

fn int_operand(field: Field, value: &Value) -> ExecutionResult<i32> {
    match value {
        Value::Int(v) => i32::try_from(*v).map_err(|_| {
            QueryExecutionError::UnsupportedPredicate(format!("{v} is out of range for {field}"))
        }),
        Value::Text(_) => Err(QueryExecutionError::UnsupportedPredicate(format!(
            "{field} compared with text {value}"
        ))),
    }
}

fn text_operand(field: Field, value: &Value) -> ExecutionResult<String> {
    match value {
        Value::Text(v) => Ok(v.clone()),
        Value::Int(_) => Err(QueryExecutionError::UnsupportedPredicate(format!(
            "{field} compared with number {value}"
        ))),
    }
}

macro_rules! filter_integer {
    ($query:ident, $column:expr, $predicate:expr) => {
        match $predicate {
            Predicate::Eq(f, v) => $query.filter($column.eq(int_operand(*f, v)?)),
            Predicate::Gt(f, v) => $query.filter($column.gt(int_operand(*f, v)?)),
            Predicate::Goe(f, v) => $query.filter($column.ge(int_operand(*f, v)?)),
            Predicate::Lt(f, v) => $query.filter($column.lt(int_operand(*f, v)?)),
            Predicate::Loe(f, v) => $query.filter($column.le(int_operand(*f, v)?)),
            Predicate::Between(f, low, high) => $query.filter(
                $column.between(int_operand(*f, low)?, int_operand(*f, high)?),
            ),
            Predicate::Like(f, _) => {
                return Err(QueryExecutionError::UnsupportedPredicate(format!(
                    "LIKE on numeric field {f}"
                )));
            }
        }
    };
}

macro_rules! filter_text {
    ($query:ident, $column:expr, $predicate:expr) => {
        match $predicate {
            Predicate::Eq(f, v) => $query.filter($column.eq(text_operand(*f, v)?)),
            Predicate::Gt(f, v) => $query.filter($column.gt(text_operand(*f, v)?)),
            Predicate::Goe(f, v) => $query.filter($column.ge(text_operand(*f, v)?)),
            Predicate::Lt(f, v) => $query.filter($column.lt(text_operand(*f, v)?)),
            Predicate::Loe(f, v) => $query.filter($column.le(text_operand(*f, v)?)),
            Predicate::Between(f, low, high) => $query.filter(
                $column.between(text_operand(*f, low)?, text_operand(*f, high)?),
            ),
            Predicate::Like(_, pattern) => $query.filter($column.like(pattern.clone())),
        }
    };
}

/// Adds one `filter` per predicate. The `members_only` form is for queries
/// without the `teams` join and rejects team predicates.
macro_rules! apply_predicates {
    ($query:ident, $predicates:expr) => {
        for predicate in $predicates {
            $query = match predicate.field() {
                Field::MemberId => filter_integer!($query, members::id, predicate),
                Field::Age => filter_integer!($query, members::age, predicate),
                Field::TeamId => filter_integer!($query, members::team_id, predicate),
                Field::Username => filter_text!($query, members::username, predicate),
                Field::TeamName => filter_text!($query, teams::name, predicate),
            };
        }
    };
    ($query:ident, $predicates:expr, members_only) => {
        for predicate in $predicates {
            $query = match predicate.field() {
                Field::MemberId => filter_integer!($query, members::id, predicate),
                Field::Age => filter_integer!($query, members::age, predicate),
                Field::TeamId => filter_integer!($query, members::team_id, predicate),
                Field::Username => filter_text!($query, members::username, predicate),
                Field::TeamName => return Err(QueryExecutionError::MissingJoin(Relation::Team)),
            };
        }
    };
}

macro_rules! order_by_column {
    ($query:ident, $column:expr, $sort:expr) => {{
        $query = match $sort.nulls {
            NullsOrder::Native => $query,
            NullsOrder::First => $query.then_order_by($column.is_null().desc()),
            NullsOrder::Last => $query.then_order_by($column.is_null().asc()),
        };
        $query = match $sort.direction {
            Direction::Asc => $query.then_order_by($column.asc()),
            Direction::Desc => $query.then_order_by($column.desc()),
        };
    }};
}

macro_rules! apply_ordering {
    ($query:ident, $ordering:expr) => {
        for sort in $ordering {
            match sort.field {
                Field::MemberId => order_by_column!($query, members::id, sort),
                Field::Username => order_by_column!($query, members::username, sort),
                Field::Age => order_by_column!($query, members::age, sort),
                Field::TeamId => order_by_column!($query, members::team_id, sort),
                Field::TeamName => order_by_column!($query, teams::name, sort),
            }
        }
        $query = $query.then_order_by(members::id.asc());
    };
}

/// Builds and loads the member/team projection over `$source`.
macro_rules! load_member_teams {
    ($source:expr, $spec:expr, $window:expr, $conn:expr) => {{
        let mut query = $source
            .select((
                members::id,
                members::username,
                members::age,
                members::team_id,
                teams::name.nullable(),
            ))
            .into_boxed::<Sqlite>();
        apply_predicates!(query, $spec.predicates());
        apply_ordering!(query, $spec.ordering());
        if let Some((limit, offset)) = $window {
            query = query.limit(limit).offset(offset);
        }
        query.load::<MemberTeamRow>($conn)?
    }};
}

impl DieselRepository {
    fn load_member_teams(
        &self,
        spec: &QuerySpec,
        window: Option<(i64, i64)>,
        ctx: &QueryContext,
    ) -> ExecutionResult<Vec<MemberTeamDto>> {
        // Same rule as `count`, which cannot reach `teams` without the join.
        if spec.join_kind(Relation::Team).is_none() && spec.filters_on(Relation::Team) {
            return Err(QueryExecutionError::MissingJoin(Relation::Team));
        }

        let mut conn = self.conn(ctx)?;

        // Rows always carry the team name, so a query without a team join is
        // still read through a left join.
        let rows = match spec.join_kind(Relation::Team) {
            Some(JoinKind::Inner) => load_member_teams!(
                members::table.inner_join(teams::table),
                spec,
                window,
                &mut conn
            ),
            Some(JoinKind::Left) | None => load_member_teams!(
                members::table.left_join(teams::table),
                spec,
                window,
                &mut conn
            ),
        };

        rows.into_iter()
            .map(|row| MemberTeamDto::try_from(row).map_err(QueryExecutionError::from))
            .collect()
    }
}

impl QueryExecutor for DieselRepository {
    type Row = MemberTeamDto;

    fn fetch(
        &self,
        spec: &QuerySpec,
        limit: u32,
        offset: u64,
        ctx: &QueryContext,
    ) -> ExecutionResult<Vec<MemberTeamDto>> {
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);
        self.load_member_teams(spec, Some((i64::from(limit), offset)), ctx)
    }

    fn fetch_all(
        &self,
        spec: &QuerySpec,
        ctx: &QueryContext,
    ) -> ExecutionResult<Vec<MemberTeamDto>> {
        self.load_member_teams(spec, None, ctx)
    }

    fn count(&self, spec: &QuerySpec, ctx: &QueryContext) -> ExecutionResult<u64> {
        let mut conn = self.conn(ctx)?;

        let total: i64 = match spec.join_kind(Relation::Team) {
            Some(JoinKind::Inner) => {
                let mut query = members::table
                    .inner_join(teams::table)
                    .into_boxed::<Sqlite>();
                apply_predicates!(query, spec.predicates());
                query.count().get_result(&mut conn)?
            }
            Some(JoinKind::Left) => {
                let mut query = members::table
                    .left_join(teams::table)
                    .into_boxed::<Sqlite>();
                apply_predicates!(query, spec.predicates());
                query.count().get_result(&mut conn)?
            }
            None => {
                let mut query = members::table.into_boxed::<Sqlite>();
                apply_predicates!(query, spec.predicates(), members_only);
                query.count().get_result(&mut conn)?
            }
        };

        log::debug!("Counted {total} members for {} predicates", spec.predicates().len());
        Ok(total.max(0) as u64)
    }
}
