//! Mock executor for isolating the pager and services in tests.

use mockall::mock;

use crate::domain::member::MemberTeamDto;
use crate::query::spec::QuerySpec;
use crate::repository::{QueryContext, QueryExecutor};
use crate::repository::errors::ExecutionResult;

mock! {
    pub Executor {}

    impl QueryExecutor for Executor {
        type Row = MemberTeamDto;

        fn fetch(
            &self,
            spec: &QuerySpec,
            limit: u32,
            offset: u64,
            ctx: &QueryContext,
        ) -> ExecutionResult<Vec<MemberTeamDto>>;
        fn fetch_all(
            &self,
            spec: &QuerySpec,
            ctx: &QueryContext,
        ) -> ExecutionResult<Vec<MemberTeamDto>>;
        fn count(&self, spec: &QuerySpec, ctx: &QueryContext) -> ExecutionResult<u64>;
    }
}
