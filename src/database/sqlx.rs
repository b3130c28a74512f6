use crate::core::models::{
    candidate::{Candidate, CandidateWithPosition, Insert as CandidateInsert},
    common::Pagination,
    course::{Course, Insert as CourseInsert},
    election::{Election, Insert as ElectionInsert},
    organization::{Insert as OrganizationInsert, Organization},
    position::{Insert as PositionInsert, Position},
    vote::{CandidateTally, Insert as VoteInsert},
    voter::{Insert as VoterInsert, Voter},
};
use crate::core::ports::repository::{
    CandidateCommon, Common, CourseCommon, ElectionCommon, Manager, OrganizationCommon, PositionCommon, Store, TxStore, VoteCommon, VoterCommon,
};
use crate::error::Error;
use sqlx::migrate::Migrator;
use sqlx::pool::PoolConnection;
use sqlx::{query_as, query_scalar, Executor, PgPool, Postgres, QueryBuilder, Transaction};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

pub async fn migrate(pool: &PgPool) -> Result<(), Error> {
    MIGRATOR.run(pool).await?;
    Ok(())
}

pub type PgStore = PgSqlx<PoolConnection<Postgres>>;
pub type PgTxStore<'a> = PgSqlx<Transaction<'a, Postgres>>;

pub struct PgSqlx<E>
where
    for<'e> &'e mut E: Executor<'e>,
{
    executor: E,
}

impl<E> PgSqlx<E>
where
    for<'e> &'e mut E: Executor<'e>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }
}

impl<E> OrganizationCommon for PgSqlx<E>
where
    for<'e> &'e mut E: Executor<'e, Database = Postgres>,
{
    async fn insert(&mut self, data: OrganizationInsert) -> Result<Organization, Error> {
        let org = query_as("INSERT INTO organizations (name) VALUES ($1) RETURNING *")
            .bind(data.name)
            .fetch_one(&mut self.executor)
            .await?;
        Ok(org)
    }
}

impl<E> CourseCommon for PgSqlx<E>
where
    for<'e> &'e mut E: Executor<'e, Database = Postgres>,
{
    async fn insert(&mut self, data: CourseInsert) -> Result<Course, Error> {
        let course = query_as("INSERT INTO courses (name) VALUES ($1) RETURNING *")
            .bind(data.name)
            .fetch_one(&mut self.executor)
            .await?;
        Ok(course)
    }
}

impl<E> PositionCommon for PgSqlx<E>
where
    for<'e> &'e mut E: Executor<'e, Database = Postgres>,
{
    async fn query_by_names(&mut self, names: &[String]) -> Result<Vec<Position>, Error> {
        let positions = query_as("SELECT * FROM positions WHERE name = ANY($1)")
            .bind(names)
            .fetch_all(&mut self.executor)
            .await?;
        Ok(positions)
    }

    async fn bulk_insert(&mut self, positions: Vec<PositionInsert>) -> Result<Vec<Position>, Error> {
        if positions.is_empty() {
            return Ok(Vec::new());
        }
        let mut stmt = QueryBuilder::new("INSERT INTO positions (name) ");
        stmt.push_values(positions, |mut b, p| {
            b.push_bind(p.name);
        });
        stmt.push(" RETURNING *");
        let created = stmt.build_query_as().fetch_all(&mut self.executor).await?;
        Ok(created)
    }

    async fn list(&mut self) -> Result<Vec<Position>, Error> {
        let positions = query_as("SELECT * FROM positions ORDER BY name").fetch_all(&mut self.executor).await?;
        Ok(positions)
    }
}

impl<E> ElectionCommon for PgSqlx<E>
where
    for<'e> &'e mut E: Executor<'e, Database = Postgres>,
{
    async fn insert(&mut self, data: ElectionInsert) -> Result<Election, Error> {
        let election = query_as("INSERT INTO elections (title, start_time, end_time) VALUES ($1, $2, $3) RETURNING *")
            .bind(data.title)
            .bind(data.start_time)
            .bind(data.end_time)
            .fetch_one(&mut self.executor)
            .await?;
        Ok(election)
    }

    async fn get(&mut self, id: i32) -> Result<Option<Election>, Error> {
        let election = query_as("SELECT * FROM elections WHERE id = $1").bind(id).fetch_optional(&mut self.executor).await?;
        Ok(election)
    }

    async fn query(&mut self, pagination: Pagination) -> Result<Vec<Election>, Error> {
        let mut stmt = QueryBuilder::new("SELECT * FROM elections ORDER BY created_at DESC, id DESC");
        stmt.push(" LIMIT ").push_bind(pagination.limit);
        stmt.push(" OFFSET ").push_bind(pagination.offset);
        let elections = stmt.build_query_as().fetch_all(&mut self.executor).await?;
        Ok(elections)
    }

    async fn count(&mut self) -> Result<i64, Error> {
        let total = query_scalar("SELECT COUNT(*) FROM elections").fetch_one(&mut self.executor).await?;
        Ok(total)
    }
}

impl<E> CandidateCommon for PgSqlx<E>
where
    for<'e> &'e mut E: Executor<'e, Database = Postgres>,
{
    async fn bulk_insert(&mut self, candidates: Vec<CandidateInsert>) -> Result<Vec<Candidate>, Error> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }
        let mut stmt = QueryBuilder::new("INSERT INTO candidates (name, image, id_number, position_id, election_id) ");
        stmt.push_values(candidates, |mut b, c| {
            b.push_bind(c.name)
                .push_bind(c.image)
                .push_bind(c.id_number)
                .push_bind(c.position_id)
                .push_bind(c.election_id);
        });
        stmt.push(" RETURNING *");
        let created = stmt.build_query_as().fetch_all(&mut self.executor).await?;
        Ok(created)
    }

    async fn get(&mut self, id: i32) -> Result<Option<Candidate>, Error> {
        let candidate = query_as("SELECT * FROM candidates WHERE id = $1").bind(id).fetch_optional(&mut self.executor).await?;
        Ok(candidate)
    }

    async fn query_by_election(&mut self, election_id: i32) -> Result<Vec<CandidateWithPosition>, Error> {
        let candidates = query_as(
            "
        SELECT
            c.id AS id,
            c.name AS name,
            c.image AS image,
            c.id_number AS id_number,
            c.position_id AS position_id,
            p.name AS position,
            c.election_id AS election_id,
            c.created_at AS created_at
        FROM candidates AS c
        JOIN positions AS p ON p.id = c.position_id
        WHERE c.election_id = $1
        ORDER BY c.created_at DESC, c.id DESC",
        )
        .bind(election_id)
        .fetch_all(&mut self.executor)
        .await?;
        Ok(candidates)
    }
}

impl<E> VoterCommon for PgSqlx<E>
where
    for<'e> &'e mut E: Executor<'e, Database = Postgres>,
{
    async fn insert(&mut self, data: VoterInsert) -> Result<Voter, Error> {
        let voter = query_as(
            "INSERT INTO voters (first_name, middle_name, last_name, suffix, id_number, course_id, organization_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *",
        )
        .bind(data.first_name)
        .bind(data.middle_name)
        .bind(data.last_name)
        .bind(data.suffix)
        .bind(data.id_number)
        .bind(data.course_id)
        .bind(data.organization_id)
        .fetch_one(&mut self.executor)
        .await?;
        Ok(voter)
    }

    async fn get(&mut self, id: i32) -> Result<Option<Voter>, Error> {
        let voter = query_as("SELECT * FROM voters WHERE id = $1").bind(id).fetch_optional(&mut self.executor).await?;
        Ok(voter)
    }
}

impl<E> VoteCommon for PgSqlx<E>
where
    for<'e> &'e mut E: Executor<'e, Database = Postgres>,
{
    async fn insert(&mut self, data: VoteInsert) -> Result<i32, Error> {
        let id = query_scalar("INSERT INTO votes (voter_id, candidate_id, election_id) VALUES ($1, $2, $3) RETURNING id")
            .bind(data.voter_id)
            .bind(data.candidate_id)
            .bind(data.election_id)
            .fetch_one(&mut self.executor)
            .await?;
        Ok(id)
    }

    async fn count(&mut self, election_id: i32, candidate_id: i32) -> Result<i64, Error> {
        let n = query_scalar("SELECT COUNT(*) FROM votes WHERE election_id = $1 AND candidate_id = $2")
            .bind(election_id)
            .bind(candidate_id)
            .fetch_one(&mut self.executor)
            .await?;
        Ok(n)
    }

    async fn tally(&mut self, election_id: i32) -> Result<Vec<CandidateTally>, Error> {
        let rows = query_as(
            "
        SELECT
            c.id AS candidate_id,
            c.name AS name,
            p.name AS position,
            COUNT(v.id) AS votes
        FROM candidates AS c
        JOIN positions AS p ON p.id = c.position_id
        LEFT JOIN votes AS v ON v.candidate_id = c.id AND v.election_id = c.election_id
        WHERE c.election_id = $1
        GROUP BY c.id, c.name, p.name
        ORDER BY p.name, c.name, c.id",
        )
        .bind(election_id)
        .fetch_all(&mut self.executor)
        .await?;
        Ok(rows)
    }
}

impl Store for PgSqlx<PoolConnection<Postgres>> {}
impl<'a> Store for PgSqlx<Transaction<'a, Postgres>> {}
impl Common for PgSqlx<PoolConnection<Postgres>> {}
impl<'a> Common for PgSqlx<Transaction<'a, Postgres>> {}

impl<'a> TxStore for PgSqlx<Transaction<'a, Postgres>> {
    async fn commit(self) -> Result<(), Error> {
        self.executor.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), Error> {
        self.executor.rollback().await?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct PgSqlxManager {
    pool: PgPool,
}

impl PgSqlxManager {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn begin(&self) -> Result<PgTxStore<'static>, Error> {
        let tx = self.pool.begin().await?;
        Ok(PgSqlx { executor: tx })
    }

    pub async fn acquire(&self) -> Result<PgStore, Error> {
        let conn = self.pool.acquire().await?;
        Ok(PgSqlx { executor: conn })
    }
}

impl<'a> Manager<'a, PgStore, PgTxStore<'a>> for PgSqlxManager {
    async fn db(&'a self) -> Result<PgStore, Error> {
        let d = self.acquire().await?;
        Ok(d)
    }

    async fn tx(&'a self) -> Result<PgTxStore<'a>, Error> {
        let t = self.begin().await?;
        Ok(t)
    }
}
