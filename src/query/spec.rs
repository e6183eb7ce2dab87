//! Immutable query descriptions.
//!
//! A [`QuerySpec`] says what to select, how to reach it, what to filter on and
//! how to order it. It never performs I/O; executors interpret it. The same
//! value can be executed any number of times.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::query::predicate::{Field, Predicate, Relation, Value};

/// Fields the caller reads from each result row.
///
/// Executors always return their full row type. The projection decides which
/// relations a query reaches: a projected field of a related table gets that
/// table joined.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionSpec {
    fields: Vec<Field>,
}

impl ProjectionSpec {
    pub fn new(fields: impl IntoIterator<Item = Field>) -> Self {
        let mut projected = Vec::new();
        for field in fields {
            if !projected.contains(&field) {
                projected.push(field);
            }
        }
        Self { fields: projected }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinKind {
    /// Drops root rows without a related row.
    Inner,
    /// Keeps root rows; related fields read as `NULL`.
    Left,
}

/// Traversal from the member root to a related entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JoinSpec {
    pub relation: Relation,
    pub kind: JoinKind,
}

impl JoinSpec {
    pub const fn inner(relation: Relation) -> Self {
        Self {
            relation,
            kind: JoinKind::Inner,
        }
    }

    pub const fn left(relation: Relation) -> Self {
        Self {
            relation,
            kind: JoinKind::Left,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

/// Placement of `NULL` values. `Native` sorts `NULL` lowest, as SQLite does.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NullsOrder {
    #[default]
    Native,
    First,
    Last,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: Field,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default)]
    pub nulls: NullsOrder,
}

impl SortSpec {
    pub const fn asc(field: Field) -> Self {
        Self {
            field,
            direction: Direction::Asc,
            nulls: NullsOrder::Native,
        }
    }

    pub const fn desc(field: Field) -> Self {
        Self {
            field,
            direction: Direction::Desc,
            nulls: NullsOrder::Native,
        }
    }

    pub const fn nulls_first(mut self) -> Self {
        self.nulls = NullsOrder::First;
        self
    }

    pub const fn nulls_last(mut self) -> Self {
        self.nulls = NullsOrder::Last;
        self
    }

    /// Orders two field values according to this sort key.
    pub fn compare(&self, left: Option<&Value>, right: Option<&Value>) -> Ordering {
        let directed = |ordering: Ordering| match self.direction {
            Direction::Asc => ordering,
            Direction::Desc => ordering.reverse(),
        };
        let null_first = match self.nulls {
            NullsOrder::First => Ordering::Less,
            NullsOrder::Last => Ordering::Greater,
            NullsOrder::Native => directed(Ordering::Less),
        };

        match (left, right) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => null_first,
            (Some(_), None) => null_first.reverse(),
            (Some(l), Some(r)) => directed(l.compare(r).unwrap_or(Ordering::Equal)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySpec {
    projection: ProjectionSpec,
    predicates: Vec<Predicate>,
    joins: Vec<JoinSpec>,
    ordering: Vec<SortSpec>,
}

/// Assembles a query description.
///
/// Duplicate joins for one relation keep the first declaration. A related
/// entity referenced by the projection, a predicate or a sort key without a
/// declared join is reached through an implicit left join.
pub fn compose(
    projection: ProjectionSpec,
    predicates: Vec<Predicate>,
    joins: Vec<JoinSpec>,
    ordering: Vec<SortSpec>,
) -> QuerySpec {
    let mut resolved: Vec<JoinSpec> = Vec::with_capacity(joins.len());
    for join in joins {
        if join.relation != Relation::Member
            && !resolved.iter().any(|j| j.relation == join.relation)
        {
            resolved.push(join);
        }
    }

    let referenced = projection
        .fields()
        .iter()
        .copied()
        .chain(predicates.iter().map(Predicate::field))
        .chain(ordering.iter().map(|sort| sort.field))
        .map(Field::relation);
    for relation in referenced {
        if relation != Relation::Member && !resolved.iter().any(|j| j.relation == relation) {
            resolved.push(JoinSpec::left(relation));
        }
    }

    QuerySpec {
        projection,
        predicates,
        joins: resolved,
        ordering,
    }
}

impl QuerySpec {
    pub fn projection(&self) -> &ProjectionSpec {
        &self.projection
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn joins(&self) -> &[JoinSpec] {
        &self.joins
    }

    pub fn ordering(&self) -> &[SortSpec] {
        &self.ordering
    }

    pub fn join_kind(&self, relation: Relation) -> Option<JoinKind> {
        self.joins
            .iter()
            .find(|join| join.relation == relation)
            .map(|join| join.kind)
    }

    /// Whether any predicate reads a field of `relation`.
    pub fn filters_on(&self, relation: Relation) -> bool {
        self.predicates
            .iter()
            .any(|predicate| predicate.field().relation() == relation)
    }

    /// The cardinality-preserving core of this query: no projection, no
    /// ordering, and only the joins that can change which rows match. Inner
    /// joins stay because they drop unmatched rows; left joins stay only when
    /// a predicate reads through them.
    pub fn count_spec(&self) -> QuerySpec {
        let joins = self
            .joins
            .iter()
            .filter(|join| join.kind == JoinKind::Inner || self.filters_on(join.relation))
            .copied()
            .collect();

        QuerySpec {
            projection: ProjectionSpec::default(),
            predicates: self.predicates.clone(),
            joins,
            ordering: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member_team_projection() -> ProjectionSpec {
        ProjectionSpec::new([
            Field::MemberId,
            Field::Username,
            Field::Age,
            Field::TeamId,
            Field::TeamName,
        ])
    }

    #[test]
    fn compose_is_pure() {
        let build = || {
            compose(
                member_team_projection(),
                vec![Predicate::Goe(Field::Age, 20.into())],
                vec![JoinSpec::left(Relation::Team)],
                vec![SortSpec::desc(Field::Age)],
            )
        };

        assert_eq!(build(), build());
    }

    #[test]
    fn empty_predicates_compose_an_unfiltered_scan() {
        let spec = compose(
            ProjectionSpec::new([Field::MemberId]),
            Vec::new(),
            Vec::new(),
            Vec::new(),
        );

        assert!(spec.predicates().is_empty());
        assert!(spec.joins().is_empty());
    }

    #[test]
    fn referenced_relation_gets_implicit_left_join() {
        let spec = compose(
            ProjectionSpec::new([Field::MemberId]),
            vec![Predicate::Eq(Field::TeamName, "teamA".into())],
            Vec::new(),
            Vec::new(),
        );

        assert_eq!(spec.joins(), &[JoinSpec::left(Relation::Team)]);
    }

    #[test]
    fn duplicate_joins_keep_first_declaration() {
        let spec = compose(
            member_team_projection(),
            Vec::new(),
            vec![
                JoinSpec::inner(Relation::Team),
                JoinSpec::left(Relation::Team),
                JoinSpec::inner(Relation::Member),
            ],
            Vec::new(),
        );

        assert_eq!(spec.joins(), &[JoinSpec::inner(Relation::Team)]);
        assert_eq!(spec.join_kind(Relation::Team), Some(JoinKind::Inner));
    }

    #[test]
    fn count_spec_drops_display_only_left_join() {
        let spec = compose(
            member_team_projection(),
            vec![Predicate::Goe(Field::Age, 20.into())],
            vec![JoinSpec::left(Relation::Team)],
            vec![SortSpec::asc(Field::Username)],
        );

        let count = spec.count_spec();
        assert!(count.projection().is_empty());
        assert!(count.ordering().is_empty());
        assert!(count.joins().is_empty());
        assert_eq!(count.predicates(), spec.predicates());
    }

    #[test]
    fn count_spec_keeps_joins_that_filter() {
        let filtered = compose(
            member_team_projection(),
            vec![Predicate::Eq(Field::TeamName, "teamB".into())],
            vec![JoinSpec::left(Relation::Team)],
            Vec::new(),
        );
        assert_eq!(filtered.count_spec().joins(), &[JoinSpec::left(Relation::Team)]);

        let inner = compose(
            member_team_projection(),
            Vec::new(),
            vec![JoinSpec::inner(Relation::Team)],
            Vec::new(),
        );
        assert_eq!(inner.count_spec().joins(), &[JoinSpec::inner(Relation::Team)]);
    }

    #[test]
    fn nulls_last_puts_missing_values_after_present_ones() {
        let sort = SortSpec::asc(Field::Username).nulls_last();
        let a = Value::from("a");

        assert_eq!(sort.compare(None, Some(&a)), Ordering::Greater);
        assert_eq!(sort.compare(Some(&a), None), Ordering::Less);

        let desc = SortSpec::desc(Field::Username).nulls_last();
        assert_eq!(desc.compare(None, Some(&a)), Ordering::Greater);
    }

    #[test]
    fn native_nulls_sort_lowest() {
        let a = Value::from("a");

        assert_eq!(
            SortSpec::asc(Field::Username).compare(None, Some(&a)),
            Ordering::Less
        );
        assert_eq!(
            SortSpec::desc(Field::Username).compare(None, Some(&a)),
            Ordering::Greater
        );
    }

    #[test]
    fn sort_spec_deserializes_with_defaults() {
        let sort: SortSpec = serde_json::from_str(r#"{"field": "team_name"}"#).unwrap();
        assert_eq!(sort, SortSpec::asc(Field::TeamName));

        let sort: SortSpec =
            serde_json::from_str(r#"{"field": "username", "direction": "desc", "nulls": "last"}"#)
                .unwrap();
        assert_eq!(sort, SortSpec::desc(Field::Username).nulls_last());
    }
}
