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
use crate::error::Error;

pub trait OrganizationCommon {
    async fn insert(&mut self, data: OrganizationInsert) -> Result<Organization, Error>;
}

pub trait CourseCommon {
    async fn insert(&mut self, data: CourseInsert) -> Result<Course, Error>;
}

pub trait PositionCommon {
    /// Existing positions whose name is in `names`. One round trip.
    async fn query_by_names(&mut self, names: &[String]) -> Result<Vec<Position>, Error>;
    /// Inserts every position in a single statement.
    async fn bulk_insert(&mut self, positions: Vec<PositionInsert>) -> Result<Vec<Position>, Error>;
    async fn list(&mut self) -> Result<Vec<Position>, Error>;
}

pub trait ElectionCommon {
    async fn insert(&mut self, data: ElectionInsert) -> Result<Election, Error>;
    async fn get(&mut self, id: i32) -> Result<Option<Election>, Error>;
    async fn query(&mut self, pagination: Pagination) -> Result<Vec<Election>, Error>;
    async fn count(&mut self) -> Result<i64, Error>;
}

pub trait CandidateCommon {
    async fn bulk_insert(&mut self, candidates: Vec<CandidateInsert>) -> Result<Vec<Candidate>, Error>;
    async fn get(&mut self, id: i32) -> Result<Option<Candidate>, Error>;
    /// Newest first.
    async fn query_by_election(&mut self, election_id: i32) -> Result<Vec<CandidateWithPosition>, Error>;
}

pub trait VoterCommon {
    async fn insert(&mut self, data: VoterInsert) -> Result<Voter, Error>;
    async fn get(&mut self, id: i32) -> Result<Option<Voter>, Error>;
}

pub trait VoteCommon {
    async fn insert(&mut self, data: VoteInsert) -> Result<i32, Error>;
    async fn count(&mut self, election_id: i32, candidate_id: i32) -> Result<i64, Error>;
    /// One row per candidate of the election, zero-vote candidates included.
    async fn tally(&mut self, election_id: i32) -> Result<Vec<CandidateTally>, Error>;
}

pub trait Common: OrganizationCommon + CourseCommon + PositionCommon + ElectionCommon + CandidateCommon + VoterCommon + VoteCommon {}

pub trait Store: Common {}

pub trait TxStore: Store {
    async fn commit(self) -> Result<(), Error>;
    async fn rollback(self) -> Result<(), Error>;
}

pub trait Manager<'m, S, T>
where
    S: Store,
    T: TxStore,
{
    async fn db(&'m self) -> Result<S, Error>;
    async fn tx(&'m self) -> Result<T, Error>;
}
