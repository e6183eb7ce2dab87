//! Offset pagination with count elision.

use serde::{Deserialize, Serialize};

use crate::query::spec::{QuerySpec, SortSpec};
use crate::repository::{QueryContext, QueryExecutor};
use crate::repository::errors::ExecutionResult;

/// Requested window and ordering.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(default)]
    pub offset: u64,
    pub limit: u32,
    #[serde(default)]
    pub sort: Vec<SortSpec>,
}

impl PageRequest {
    pub fn new(offset: u64, limit: u32) -> Self {
        Self {
            offset,
            limit,
            sort: Vec::new(),
        }
    }

    /// Zero-based page number of fixed `page_size`.
    pub fn of(page_number: u64, page_size: u32) -> Self {
        Self::new(page_number.saturating_mul(u64::from(page_size)), page_size)
    }

    pub fn sort_by(mut self, sort: SortSpec) -> Self {
        self.sort.push(sort);
        self
    }
}

/// One window of an ordered result set plus the size of the whole set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total: u64,
    pub page_size: u32,
    pub offset: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, total: u64, page_size: u32, offset: u64) -> Self {
        Self {
            content,
            total,
            page_size,
            offset,
        }
    }

    pub fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            return u64::from(self.total > 0);
        }
        self.total.div_ceil(u64::from(self.page_size))
    }

    /// Zero-based index of this page.
    pub fn page_number(&self) -> u64 {
        if self.page_size == 0 {
            return 0;
        }
        self.offset / u64::from(self.page_size)
    }

    pub fn has_next(&self) -> bool {
        self.offset.saturating_add(self.content.len() as u64) < self.total
    }

    pub fn is_first(&self) -> bool {
        self.offset == 0
    }

    pub fn is_last(&self) -> bool {
        !self.has_next()
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            total: self.total,
            page_size: self.page_size,
            offset: self.offset,
        }
    }
}

/// Fetches one page of `spec` and its total.
///
/// When the first page comes back short, its length is the total and no
/// count query is issued. Every other case asks the executor to count the
/// spec's [`count_spec`](QuerySpec::count_spec). `ctx` reaches both calls
/// untouched.
pub fn paginate<E>(
    spec: &QuerySpec,
    page: &PageRequest,
    executor: &E,
    ctx: &QueryContext,
) -> ExecutionResult<Page<E::Row>>
where
    E: QueryExecutor + ?Sized,
{
    let content = executor.fetch(spec, page.limit, page.offset, ctx)?;

    let total = if page.offset == 0 && content.len() < page.limit as usize {
        log::debug!("Short first page of {} rows, skipping count query", content.len());
        content.len() as u64
    } else {
        executor.count(&spec.count_spec(), ctx)?
    };

    Ok(Page::new(content, total, page.limit, page.offset))
}

/// Like [`paginate`], but always issues the count query.
pub fn paginate_counted<E>(
    spec: &QuerySpec,
    page: &PageRequest,
    executor: &E,
    ctx: &QueryContext,
) -> ExecutionResult<Page<E::Row>>
where
    E: QueryExecutor + ?Sized,
{
    let content = executor.fetch(spec, page.limit, page.offset, ctx)?;
    let total = executor.count(&spec.count_spec(), ctx)?;

    Ok(Page::new(content, total, page.limit, page.offset))
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use diesel::result::Error as DieselError;
    use mockall::predicate::{always, eq};
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::domain::member::MemberTeamDto;
    use crate::domain::types::MemberId;
    use crate::query::predicate::{Field, Predicate, Relation};
    use crate::query::spec::{JoinSpec, ProjectionSpec, compose};
    use crate::repository::errors::QueryExecutionError;
    use crate::repository::mock::MockExecutor;

    fn rows(ids: std::ops::RangeInclusive<i32>) -> Vec<MemberTeamDto> {
        ids.map(|id| MemberTeamDto {
            member_id: MemberId::new(id).unwrap(),
            username: Some(format!("member{id}")),
            age: id * 10,
            team_id: None,
            team_name: None,
        })
        .collect()
    }

    fn spec() -> QuerySpec {
        compose(
            ProjectionSpec::new([Field::MemberId, Field::Username, Field::TeamName]),
            vec![Predicate::Goe(Field::Age, 10.into())],
            vec![JoinSpec::left(Relation::Team)],
            Vec::new(),
        )
    }

    #[test]
    fn short_first_page_skips_count() {
        let mut executor = MockExecutor::new();
        executor
            .expect_fetch()
            .with(eq(spec()), eq(10), eq(0), always())
            .times(1)
            .returning(|_, _, _, _| Ok(rows(1..=4)));
        executor.expect_count().times(0);

        let ctx = QueryContext::new();
        let page = paginate(&spec(), &PageRequest::new(0, 10), &executor, &ctx).unwrap();

        assert_eq!(page.content.len(), 4);
        assert_eq!(page.total, 4);
        assert_eq!(page.page_size, 10);
        assert_eq!(page.offset, 0);
    }

    #[test]
    fn full_page_issues_one_count_without_display_join() {
        let mut executor = MockExecutor::new();
        executor
            .expect_fetch()
            .with(eq(spec()), eq(2), eq(1), always())
            .times(1)
            .returning(|_, _, _, _| Ok(rows(2..=3)));
        executor
            .expect_count()
            .withf(|count_spec, _| {
                count_spec.joins().is_empty() && count_spec.ordering().is_empty()
            })
            .times(1)
            .returning(|_, _| Ok(4));

        let ctx = QueryContext::new();
        let page = paginate(&spec(), &PageRequest::new(1, 2), &executor, &ctx).unwrap();

        assert_eq!(page.content.len(), 2);
        assert_eq!(page.total, 4);
        assert_eq!(page.offset, 1);
        assert_eq!(page.page_size, 2);
    }

    #[test]
    fn caller_context_reaches_fetch_and_count_unchanged() {
        let deadline = Instant::now() + Duration::from_secs(600);
        let token = CancellationToken::new();
        let ctx = QueryContext::new()
            .with_deadline(deadline)
            .with_cancellation(token.clone());

        let mut executor = MockExecutor::new();
        executor
            .expect_fetch()
            .withf(move |_, _, _, ctx| ctx.deadline() == Some(deadline) && !ctx.is_cancelled())
            .times(1)
            .returning(|_, _, _, ctx| {
                // Cancelling through the received context must be visible to
                // the caller's token and to the count call.
                if let Some(token) = ctx.cancellation() {
                    token.cancel();
                }
                Ok(rows(1..=2))
            });
        executor
            .expect_count()
            .withf(move |_, ctx| ctx.deadline() == Some(deadline) && ctx.is_cancelled())
            .times(1)
            .returning(|_, _| Ok(9));

        let page = paginate(&spec(), &PageRequest::new(0, 2), &executor, &ctx).unwrap();

        assert_eq!(page.total, 9);
        assert!(token.is_cancelled());
    }

    #[test]
    fn offset_past_the_data_still_counts() {
        let mut executor = MockExecutor::new();
        executor
            .expect_fetch()
            .times(1)
            .returning(|_, _, _, _| Ok(Vec::new()));
        executor.expect_count().times(1).returning(|_, _| Ok(4));

        let ctx = QueryContext::new();
        let page = paginate(&spec(), &PageRequest::new(10, 5), &executor, &ctx).unwrap();

        assert!(page.content.is_empty());
        assert_eq!(page.total, 4);
    }

    #[test]
    fn exactly_full_first_page_counts() {
        let mut executor = MockExecutor::new();
        executor
            .expect_fetch()
            .returning(|_, _, _, _| Ok(rows(1..=4)));
        executor.expect_count().times(1).returning(|_, _| Ok(4));

        let ctx = QueryContext::new();
        let page = paginate(&spec(), &PageRequest::new(0, 4), &executor, &ctx).unwrap();
        assert_eq!(page.total, 4);
        assert!(page.is_last());
    }

    #[test]
    fn fetch_failure_propagates_without_count() {
        let mut executor = MockExecutor::new();
        executor.expect_fetch().times(1).returning(|_, _, _, _| {
            Err(QueryExecutionError::from(DieselError::BrokenTransactionManager))
        });
        executor.expect_count().times(0);

        let ctx = QueryContext::new();
        let err = paginate(&spec(), &PageRequest::new(0, 10), &executor, &ctx).unwrap_err();
        assert!(matches!(
            err,
            QueryExecutionError::Database(DieselError::BrokenTransactionManager)
        ));
    }

    #[test]
    fn count_failure_propagates() {
        let mut executor = MockExecutor::new();
        executor
            .expect_fetch()
            .returning(|_, _, _, _| Ok(rows(1..=2)));
        executor
            .expect_count()
            .times(1)
            .returning(|_, _| Err(QueryExecutionError::DeadlineExceeded));

        let ctx = QueryContext::new();
        let err = paginate(&spec(), &PageRequest::new(2, 2), &executor, &ctx).unwrap_err();
        assert!(matches!(err, QueryExecutionError::DeadlineExceeded));
    }

    #[test]
    fn counted_pagination_always_counts() {
        let mut executor = MockExecutor::new();
        executor
            .expect_fetch()
            .returning(|_, _, _, _| Ok(rows(1..=4)));
        executor.expect_count().times(1).returning(|_, _| Ok(4));

        let ctx = QueryContext::new();
        let page = paginate_counted(&spec(), &PageRequest::new(0, 10), &executor, &ctx).unwrap();
        assert_eq!(page.total, 4);
    }

    #[test]
    fn page_navigation_helpers() {
        let page = Page::new(vec![1, 2], 5, 2, 2);

        assert_eq!(page.total_pages(), 3);
        assert_eq!(page.page_number(), 1);
        assert!(page.has_next());
        assert!(!page.is_first());

        let last = Page::new(vec![5], 5, 2, 4);
        assert!(last.is_last());
        assert_eq!(last.map(|n| n * 10).content, vec![50]);

        assert_eq!(Page::<i32>::new(Vec::new(), 0, 0, 0).total_pages(), 0);
    }

    #[test]
    fn navigation_near_the_offset_limit_does_not_overflow() {
        let page = Page::new(vec![1], 1, 10, u64::MAX);

        assert!(page.is_last());
        assert!(!page.has_next());
        assert_eq!(page.page_number(), u64::MAX / 10);
    }

    #[test]
    fn page_request_of_computes_offset() {
        let request = PageRequest::of(3, 20);
        assert_eq!(request.offset, 60);
        assert_eq!(request.limit, 20);
    }
}
