#![allow(dead_code)]

use std::cell::Cell;

use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tempfile::TempDir;

use member_search::db::{DbPool, establish_connection_pool};
use member_search::domain::member::{Member, MemberTeamDto, Team};
use member_search::models::member::{
    Member as DbMember, NewMember as DbNewMember, NewTeam as DbNewTeam, Team as DbTeam,
};
use member_search::query::QuerySpec;
use member_search::repository::{QueryContext, QueryExecutor};
use member_search::repository::errors::ExecutionResult;
use member_search::schema::{members, teams};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// SQLite database in a temporary directory, migrated on creation and removed
/// on drop.
pub struct TestDb {
    pool: DbPool,
    _dir: TempDir,
}

impl TestDb {
    pub fn new(filename: &str) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join(filename);
        let pool =
            establish_connection_pool(path.to_str().expect("utf-8 path")).expect("create pool");

        let mut pooled = pool.get().expect("get connection");
        let conn: &mut SqliteConnection = &mut pooled;
        conn.run_pending_migrations(MIGRATIONS).expect("run migrations");
        drop(pooled);

        Self { pool, _dir: dir }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn insert_team(&self, name: &str) -> Team {
        let mut conn = self.pool.get().expect("get connection");
        let team = diesel::insert_into(teams::table)
            .values(&DbNewTeam { name })
            .get_result::<DbTeam>(&mut conn)
            .expect("insert team");
        Team::try_from(team).expect("valid team")
    }

    pub fn insert_member(&self, username: Option<&str>, age: i32, team: Option<&Team>) -> Member {
        let mut conn = self.pool.get().expect("get connection");
        let member = diesel::insert_into(members::table)
            .values(&DbNewMember {
                username,
                age,
                team_id: team.map(|t| t.id.get()),
            })
            .get_result::<DbMember>(&mut conn)
            .expect("insert member");
        Member::try_from(member).expect("valid member")
    }
}

/// Fixture shared by most tests: teamA with member1/member2, teamB with
/// member3/member4, ages 10 through 40.
pub struct Fixture {
    pub teams: Vec<Team>,
    pub members: Vec<Member>,
}

pub fn seed_four_members(db: &TestDb) -> Fixture {
    let team_a = db.insert_team("teamA");
    let team_b = db.insert_team("teamB");

    let members = vec![
        db.insert_member(Some("member1"), 10, Some(&team_a)),
        db.insert_member(Some("member2"), 20, Some(&team_a)),
        db.insert_member(Some("member3"), 30, Some(&team_b)),
        db.insert_member(Some("member4"), 40, Some(&team_b)),
    ];

    Fixture {
        teams: vec![team_a, team_b],
        members,
    }
}

/// Wraps an executor and records how many fetch and count calls reach it.
pub struct CountingExecutor<E> {
    inner: E,
    pub fetches: Cell<usize>,
    pub counts: Cell<usize>,
}

impl<E> CountingExecutor<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            fetches: Cell::new(0),
            counts: Cell::new(0),
        }
    }
}

impl<E> QueryExecutor for CountingExecutor<E>
where
    E: QueryExecutor<Row = MemberTeamDto>,
{
    type Row = MemberTeamDto;

    fn fetch(
        &self,
        spec: &QuerySpec,
        limit: u32,
        offset: u64,
        ctx: &QueryContext,
    ) -> ExecutionResult<Vec<MemberTeamDto>> {
        self.fetches.set(self.fetches.get() + 1);
        self.inner.fetch(spec, limit, offset, ctx)
    }

    fn fetch_all(
        &self,
        spec: &QuerySpec,
        ctx: &QueryContext,
    ) -> ExecutionResult<Vec<MemberTeamDto>> {
        self.fetches.set(self.fetches.get() + 1);
        self.inner.fetch_all(spec, ctx)
    }

    fn count(&self, spec: &QuerySpec, ctx: &QueryContext) -> ExecutionResult<u64> {
        self.counts.set(self.counts.get() + 1);
        self.inner.count(spec, ctx)
    }
}
