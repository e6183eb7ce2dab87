use crate::domain::member::{MemberSearchCondition, MemberTeamDto};
use crate::query::page::{Page, PageRequest, paginate, paginate_counted};
use crate::query::predicate::{Field, Relation, build_predicates};
use crate::query::spec::{JoinSpec, ProjectionSpec, QuerySpec, SortSpec, compose};
use crate::repository::{QueryContext, QueryExecutor};
use crate::services::{ServiceError, ServiceResult};

fn member_team_projection() -> ProjectionSpec {
    ProjectionSpec::new([
        Field::MemberId,
        Field::Username,
        Field::Age,
        Field::TeamId,
        Field::TeamName,
    ])
}

/// Members left-joined to their team, filtered by `condition`.
fn member_team_query(condition: &MemberSearchCondition, ordering: Vec<SortSpec>) -> QuerySpec {
    let spec = compose(
        member_team_projection(),
        build_predicates(condition),
        vec![JoinSpec::left(Relation::Team)],
        ordering,
    );
    if log::log_enabled!(log::Level::Debug) {
        let filters: Vec<String> = spec.predicates().iter().map(ToString::to_string).collect();
        log::debug!("Composed member search where [{}]", filters.join(" AND "));
    }
    spec
}

/// Searches members page by page, skipping the count query when the first
/// page is already short.
pub fn search_members<E>(
    executor: &E,
    condition: &MemberSearchCondition,
    page: &PageRequest,
    ctx: &QueryContext,
) -> ServiceResult<Page<MemberTeamDto>>
where
    E: QueryExecutor<Row = MemberTeamDto> + ?Sized,
{
    let spec = member_team_query(condition, page.sort.clone());
    paginate(&spec, page, executor, ctx).map_err(ServiceError::from)
}

/// Searches members page by page, always counting the full result set.
pub fn search_members_counted<E>(
    executor: &E,
    condition: &MemberSearchCondition,
    page: &PageRequest,
    ctx: &QueryContext,
) -> ServiceResult<Page<MemberTeamDto>>
where
    E: QueryExecutor<Row = MemberTeamDto> + ?Sized,
{
    let spec = member_team_query(condition, page.sort.clone());
    paginate_counted(&spec, page, executor, ctx).map_err(ServiceError::from)
}

/// Returns every member matching `condition`, unpaged.
pub fn list_members<E>(
    executor: &E,
    condition: &MemberSearchCondition,
    ordering: Vec<SortSpec>,
    ctx: &QueryContext,
) -> ServiceResult<Vec<MemberTeamDto>>
where
    E: QueryExecutor<Row = MemberTeamDto> + ?Sized,
{
    let spec = member_team_query(condition, ordering);
    executor.fetch_all(&spec, ctx).map_err(ServiceError::from)
}
