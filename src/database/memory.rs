//! In-memory implementation of the repository ports, used by the service tests.
//!
//! Writes made through a transactional handle are staged and only become
//! visible to other handles on `commit`. Uniqueness constraints are checked on
//! insert against committed and staged rows, and once more at commit time
//! against whatever other handles committed in the meantime.

use crate::core::models::{
    candidate::{Candidate, CandidateWithPosition, Insert as CandidateInsert},
    common::Pagination,
    course::{Course, Insert as CourseInsert},
    election::{Election, Insert as ElectionInsert},
    organization::{Insert as OrganizationInsert, Organization},
    position::{Insert as PositionInsert, Position},
    vote::{CandidateTally, Insert as VoteInsert, Vote},
    voter::{Insert as VoterInsert, Voter},
};
use crate::core::ports::repository::{
    CandidateCommon, Common, CourseCommon, ElectionCommon, Manager, OrganizationCommon, PositionCommon, Store, TxStore, VoteCommon, VoterCommon,
};
use crate::error::{Conflict, Error};
use chrono::Utc;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub organizations: Vec<Organization>,
    pub courses: Vec<Course>,
    pub positions: Vec<Position>,
    pub elections: Vec<Election>,
    pub candidates: Vec<Candidate>,
    pub voters: Vec<Voter>,
    pub votes: Vec<Vote>,
}

impl Tables {
    fn merged(&self, staged: Option<&Tables>) -> Tables {
        let mut view = self.clone();
        if let Some(staged) = staged {
            view.append(staged.clone());
        }
        view
    }

    fn append(&mut self, other: Tables) {
        self.organizations.extend(other.organizations);
        self.courses.extend(other.courses);
        self.positions.extend(other.positions);
        self.elections.extend(other.elections);
        self.candidates.extend(other.candidates);
        self.voters.extend(other.voters);
        self.votes.extend(other.votes);
    }

    /// Fails if any row of `staged` collides with a committed row.
    fn check_unique(&self, staged: &Tables) -> Result<(), Error> {
        for p in &staged.positions {
            if self.positions.iter().any(|e| e.name == p.name) {
                return Err(conflict("position", "name", Some(&p.name)));
            }
        }
        for el in &staged.elections {
            if self.elections.iter().any(|e| e.title == el.title) {
                return Err(conflict("election", "title", Some(&el.title)));
            }
        }
        for c in &staged.candidates {
            if let Some(num) = &c.id_number {
                if self.candidates.iter().any(|e| e.id_number.as_ref() == Some(num)) {
                    return Err(conflict("candidate", "id_number", Some(num)));
                }
            }
        }
        for c in &staged.courses {
            if self.courses.iter().any(|e| e.name == c.name) {
                return Err(conflict("course", "name", Some(&c.name)));
            }
        }
        for v in &staged.voters {
            if let Some(num) = &v.id_number {
                if self.voters.iter().any(|e| e.id_number.as_ref() == Some(num)) {
                    return Err(conflict("voter", "id_number", Some(num)));
                }
            }
        }
        Ok(())
    }
}

fn conflict(entity: &str, field: &str, value: Option<&String>) -> Error {
    Error::Conflict(Conflict::new(entity, field, value.cloned()))
}

fn foreign_key(msg: &str) -> Error {
    Error::Store(sqlx::Error::Protocol(format!("foreign key violation: {}", msg)))
}

#[derive(Default)]
struct Shared {
    tables: Mutex<Tables>,
    seq: AtomicI32,
    // Positions committed by a simulated concurrent writer, one before each upcoming commit.
    racing_positions: Mutex<VecDeque<String>>,
}

impl Shared {
    fn next_id(&self) -> i32 {
        self.seq.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[derive(Clone, Default)]
pub struct MemoryManager {
    shared: Arc<Shared>,
}

impl MemoryManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tables(&self) -> Tables {
        self.shared.lock().clone()
    }

    /// Makes another writer commit a position named `name` right before a
    /// transaction commits. Calls queue up; each commit consumes one.
    pub fn race_position_on_next_commit(&self, name: &str) {
        self.shared
            .racing_positions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(name.to_owned());
    }
}

impl<'m> Manager<'m, MemStore, MemStore> for MemoryManager {
    async fn db(&'m self) -> Result<MemStore, Error> {
        Ok(MemStore {
            shared: self.shared.clone(),
            staged: None,
        })
    }

    async fn tx(&'m self) -> Result<MemStore, Error> {
        Ok(MemStore {
            shared: self.shared.clone(),
            staged: Some(Tables::default()),
        })
    }
}

pub struct MemStore {
    shared: Arc<Shared>,
    staged: Option<Tables>,
}

impl MemStore {
    fn view(&self) -> Tables {
        self.shared.lock().merged(self.staged.as_ref())
    }

    /// Runs `f` with the current view and the table set rows must land in.
    fn write<R>(&mut self, f: impl FnOnce(&Tables, &mut Tables) -> Result<R, Error>) -> Result<R, Error> {
        let mut committed = self.shared.lock();
        let view = committed.merged(self.staged.as_ref());
        match self.staged.as_mut() {
            Some(staged) => f(&view, staged),
            None => f(&view, &mut *committed),
        }
    }
}

impl OrganizationCommon for MemStore {
    async fn insert(&mut self, data: OrganizationInsert) -> Result<Organization, Error> {
        let id = self.shared.next_id();
        self.write(|_, target| {
            let org = Organization {
                id,
                name: data.name,
                created_at: Utc::now(),
            };
            target.organizations.push(org.clone());
            Ok(org)
        })
    }
}

impl CourseCommon for MemStore {
    async fn insert(&mut self, data: CourseInsert) -> Result<Course, Error> {
        let id = self.shared.next_id();
        self.write(|view, target| {
            if view.courses.iter().any(|c| c.name == data.name) {
                return Err(conflict("course", "name", Some(&data.name)));
            }
            let course = Course {
                id,
                name: data.name,
                created_at: Utc::now(),
            };
            target.courses.push(course.clone());
            Ok(course)
        })
    }
}

impl PositionCommon for MemStore {
    async fn query_by_names(&mut self, names: &[String]) -> Result<Vec<Position>, Error> {
        Ok(self.view().positions.into_iter().filter(|p| names.contains(&p.name)).collect())
    }

    async fn bulk_insert(&mut self, positions: Vec<PositionInsert>) -> Result<Vec<Position>, Error> {
        let ids: Vec<i32> = positions.iter().map(|_| self.shared.next_id()).collect();
        self.write(|view, target| {
            let mut seen = HashSet::new();
            for p in &positions {
                if !seen.insert(p.name.as_str()) || view.positions.iter().any(|e| e.name == p.name) {
                    return Err(conflict("position", "name", Some(&p.name)));
                }
            }
            let now = Utc::now();
            let created: Vec<Position> = positions
                .into_iter()
                .zip(ids)
                .map(|(p, id)| Position {
                    id,
                    name: p.name,
                    created_at: now,
                })
                .collect();
            target.positions.extend(created.iter().cloned());
            Ok(created)
        })
    }

    async fn list(&mut self) -> Result<Vec<Position>, Error> {
        let mut positions = self.view().positions;
        positions.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(positions)
    }
}

impl ElectionCommon for MemStore {
    async fn insert(&mut self, data: ElectionInsert) -> Result<Election, Error> {
        let id = self.shared.next_id();
        self.write(|view, target| {
            if view.elections.iter().any(|e| e.title == data.title) {
                return Err(conflict("election", "title", Some(&data.title)));
            }
            let election = Election {
                id,
                title: data.title,
                start_time: data.start_time,
                end_time: data.end_time,
                created_at: Utc::now(),
            };
            target.elections.push(election.clone());
            Ok(election)
        })
    }

    async fn get(&mut self, id: i32) -> Result<Option<Election>, Error> {
        Ok(self.view().elections.into_iter().find(|e| e.id == id))
    }

    async fn query(&mut self, pagination: Pagination) -> Result<Vec<Election>, Error> {
        let mut elections = self.view().elections;
        elections.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(elections
            .into_iter()
            .skip(pagination.offset.max(0) as usize)
            .take(pagination.limit.max(0) as usize)
            .collect())
    }

    async fn count(&mut self) -> Result<i64, Error> {
        Ok(self.view().elections.len() as i64)
    }
}

impl CandidateCommon for MemStore {
    async fn bulk_insert(&mut self, candidates: Vec<CandidateInsert>) -> Result<Vec<Candidate>, Error> {
        let ids: Vec<i32> = candidates.iter().map(|_| self.shared.next_id()).collect();
        self.write(|view, target| {
            let mut seen = HashSet::new();
            for c in &candidates {
                if !view.positions.iter().any(|p| p.id == c.position_id) {
                    return Err(foreign_key("candidates.position_id"));
                }
                if !view.elections.iter().any(|e| e.id == c.election_id) {
                    return Err(foreign_key("candidates.election_id"));
                }
                if let Some(num) = &c.id_number {
                    if !seen.insert(num.as_str()) || view.candidates.iter().any(|e| e.id_number.as_ref() == Some(num)) {
                        return Err(conflict("candidate", "id_number", Some(num)));
                    }
                }
            }
            let now = Utc::now();
            let created: Vec<Candidate> = candidates
                .into_iter()
                .zip(ids)
                .map(|(c, id)| Candidate {
                    id,
                    name: c.name,
                    image: c.image,
                    id_number: c.id_number,
                    position_id: c.position_id,
                    election_id: c.election_id,
                    created_at: now,
                })
                .collect();
            target.candidates.extend(created.iter().cloned());
            Ok(created)
        })
    }

    async fn get(&mut self, id: i32) -> Result<Option<Candidate>, Error> {
        Ok(self.view().candidates.into_iter().find(|c| c.id == id))
    }

    async fn query_by_election(&mut self, election_id: i32) -> Result<Vec<CandidateWithPosition>, Error> {
        let view = self.view();
        let mut candidates: Vec<CandidateWithPosition> = view
            .candidates
            .iter()
            .filter(|c| c.election_id == election_id)
            .filter_map(|c| {
                let position = view.positions.iter().find(|p| p.id == c.position_id)?;
                Some(CandidateWithPosition {
                    id: c.id,
                    name: c.name.clone(),
                    image: c.image.clone(),
                    id_number: c.id_number.clone(),
                    position_id: c.position_id,
                    position: position.name.clone(),
                    election_id: c.election_id,
                    created_at: c.created_at,
                })
            })
            .collect();
        candidates.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(candidates)
    }
}

impl VoterCommon for MemStore {
    async fn insert(&mut self, data: VoterInsert) -> Result<Voter, Error> {
        let id = self.shared.next_id();
        self.write(|view, target| {
            if let Some(num) = &data.id_number {
                if view.voters.iter().any(|v| v.id_number.as_ref() == Some(num)) {
                    return Err(conflict("voter", "id_number", Some(num)));
                }
            }
            if let Some(course_id) = data.course_id {
                if !view.courses.iter().any(|c| c.id == course_id) {
                    return Err(foreign_key("voters.course_id"));
                }
            }
            if let Some(organization_id) = data.organization_id {
                if !view.organizations.iter().any(|o| o.id == organization_id) {
                    return Err(foreign_key("voters.organization_id"));
                }
            }
            let voter = Voter {
                id,
                first_name: data.first_name,
                middle_name: data.middle_name,
                last_name: data.last_name,
                suffix: data.suffix,
                id_number: data.id_number,
                course_id: data.course_id,
                organization_id: data.organization_id,
                created_at: Utc::now(),
            };
            target.voters.push(voter.clone());
            Ok(voter)
        })
    }

    async fn get(&mut self, id: i32) -> Result<Option<Voter>, Error> {
        Ok(self.view().voters.into_iter().find(|v| v.id == id))
    }
}

impl VoteCommon for MemStore {
    async fn insert(&mut self, data: VoteInsert) -> Result<i32, Error> {
        let id = self.shared.next_id();
        self.write(|view, target| {
            if !view.voters.iter().any(|v| v.id == data.voter_id) {
                return Err(foreign_key("votes.voter_id"));
            }
            if !view.candidates.iter().any(|c| c.id == data.candidate_id) {
                return Err(foreign_key("votes.candidate_id"));
            }
            if !view.elections.iter().any(|e| e.id == data.election_id) {
                return Err(foreign_key("votes.election_id"));
            }
            target.votes.push(Vote {
                id,
                voter_id: data.voter_id,
                candidate_id: data.candidate_id,
                election_id: data.election_id,
                created_at: Utc::now(),
            });
            Ok(id)
        })
    }

    async fn count(&mut self, election_id: i32, candidate_id: i32) -> Result<i64, Error> {
        let n = self
            .view()
            .votes
            .iter()
            .filter(|v| v.election_id == election_id && v.candidate_id == candidate_id)
            .count();
        Ok(n as i64)
    }

    async fn tally(&mut self, election_id: i32) -> Result<Vec<CandidateTally>, Error> {
        let view = self.view();
        let mut rows: Vec<CandidateTally> = view
            .candidates
            .iter()
            .filter(|c| c.election_id == election_id)
            .filter_map(|c| {
                let position = view.positions.iter().find(|p| p.id == c.position_id)?;
                let votes = view.votes.iter().filter(|v| v.candidate_id == c.id && v.election_id == c.election_id).count();
                Some(CandidateTally {
                    candidate_id: c.id,
                    name: c.name.clone(),
                    position: position.name.clone(),
                    votes: votes as i64,
                })
            })
            .collect();
        rows.sort_by(|a, b| (&a.position, &a.name, a.candidate_id).cmp(&(&b.position, &b.name, b.candidate_id)));
        Ok(rows)
    }
}

impl Common for MemStore {}
impl Store for MemStore {}

impl TxStore for MemStore {
    async fn commit(mut self) -> Result<(), Error> {
        let Some(staged) = self.staged.take() else {
            return Ok(());
        };
        let racing = self.shared.racing_positions.lock().unwrap_or_else(|e| e.into_inner()).pop_front();
        let id = racing.as_ref().map(|_| self.shared.next_id());
        let mut committed = self.shared.lock();
        if let (Some(name), Some(id)) = (racing, id) {
            committed.positions.push(Position {
                id,
                name,
                created_at: Utc::now(),
            });
        }
        committed.check_unique(&staged)?;
        committed.append(staged);
        Ok(())
    }

    async fn rollback(mut self) -> Result<(), Error> {
        self.staged = None;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn test_voter_references_course_and_organization() {
        let manager = MemoryManager::new();
        let mut db = manager.db().await.unwrap();
        let course = CourseCommon::insert(&mut db, CourseInsert { name: "BS Computer Science".into() }).await.unwrap();
        let org = OrganizationCommon::insert(&mut db, OrganizationInsert { name: "College of Engineering".into() }).await.unwrap();
        let voter = VoterCommon::insert(
            &mut db,
            VoterInsert {
                first_name: "Juan".into(),
                last_name: "Dela Cruz".into(),
                id_number: Some("2020-1234".into()),
                course_id: Some(course.id),
                organization_id: Some(org.id),
                ..default::default()
            },
        )
        .await
        .unwrap();
        let fetched = VoterCommon::get(&mut db, voter.id).await.unwrap().unwrap();
        assert_eq!(fetched.course_id, Some(course.id));
        assert_eq!(fetched.organization_id, Some(org.id));

        let err = VoterCommon::insert(
            &mut db,
            VoterInsert {
                first_name: "Maria".into(),
                last_name: "Clara".into(),
                id_number: Some("2020-1234".into()),
                ..default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(err.conflict().unwrap().is_on("voter", "id_number"));
    }

    #[tokio::test]
    async fn test_course_names_are_unique() {
        let manager = MemoryManager::new();
        let mut db = manager.db().await.unwrap();
        CourseCommon::insert(&mut db, CourseInsert { name: "BSIT".into() }).await.unwrap();
        let err = CourseCommon::insert(&mut db, CourseInsert { name: "BSIT".into() }).await.unwrap_err();
        assert!(err.conflict().unwrap().is_on("course", "name"));
    }

    #[tokio::test]
    async fn test_staged_rows_hidden_until_commit() {
        let manager = MemoryManager::new();
        let mut tx = manager.tx().await.unwrap();
        PositionCommon::bulk_insert(&mut tx, vec![PositionInsert { name: "Auditor".into() }]).await.unwrap();
        assert_eq!(PositionCommon::list(&mut tx).await.unwrap().len(), 1);
        let mut db = manager.db().await.unwrap();
        assert!(PositionCommon::list(&mut db).await.unwrap().is_empty());

        tx.rollback().await.unwrap();
        assert!(manager.tables().positions.is_empty());
    }
}
