use crate::core::models::{
    candidate::{CandidateWithPosition, Insert as CandidateInsert},
    common::Pagination,
    election::{Election, ElectionCreate, ElectionDetail, Insert as ElectionInsert},
};
use crate::core::ports::repository::{CandidateCommon, ElectionCommon, Manager, Store, TxStore};
use crate::core::services::position::resolve_positions;
use crate::error::{Error, ValidationErrors};
use chrono::{DateTime, Utc};
use log::{info, warn};
use std::collections::{BTreeSet, HashMap, HashSet};

/// A candidate entry that passed validation. Text fields are trimmed and blank
/// optional fields are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateEntry {
    pub name: String,
    pub image: Option<String>,
    pub id_number: Option<String>,
    pub position: String,
}

/// An election submission that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElectionDraft {
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub candidates: Vec<CandidateEntry>,
}

impl ElectionDraft {
    pub fn position_names(&self) -> BTreeSet<String> {
        self.candidates.iter().map(|c| c.position.clone()).collect()
    }
}

// Width of the VARCHAR columns backing titles, names, positions and id numbers.
const MAX_LEN: usize = 255;

fn optional(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}

fn check_len(errs: &mut ValidationErrors, field: impl Into<String>, value: &str) {
    if value.chars().count() > MAX_LEN {
        errs.add(field, format!("must be at most {} characters", MAX_LEN));
    }
}

/// Checks the shape of a submission. Every problem is reported, each against
/// the field it concerns.
pub fn validate(payload: ElectionCreate) -> Result<ElectionDraft, Error> {
    let mut errs = ValidationErrors::new();
    let title = payload.title.trim().to_owned();
    if title.is_empty() {
        errs.add("title", "title must not be blank");
    }
    check_len(&mut errs, "title", &title);
    if payload.end_time <= payload.start_time {
        errs.add("end_time", "voting must end after it starts");
    }
    if payload.candidates.is_empty() {
        errs.add("candidates", "at least one candidate is required");
    }
    let mut id_numbers = HashSet::new();
    let mut candidates = Vec::with_capacity(payload.candidates.len());
    for (i, c) in payload.candidates.into_iter().enumerate() {
        let entry = CandidateEntry {
            name: c.name.trim().to_owned(),
            image: optional(c.image),
            id_number: optional(c.id_number),
            position: c.position.trim().to_owned(),
        };
        if entry.name.is_empty() {
            errs.add(format!("candidates[{}].name", i), "name must not be blank");
        }
        check_len(&mut errs, format!("candidates[{}].name", i), &entry.name);
        if entry.position.is_empty() {
            errs.add(format!("candidates[{}].position", i), "position must not be blank");
        }
        check_len(&mut errs, format!("candidates[{}].position", i), &entry.position);
        if let Some(num) = &entry.id_number {
            check_len(&mut errs, format!("candidates[{}].id_number", i), num);
            if !id_numbers.insert(num.clone()) {
                errs.add(format!("candidates[{}].id_number", i), format!("id number '{}' is used by another candidate", num));
            }
        }
        candidates.push(entry);
    }
    errs.into_result()?;
    Ok(ElectionDraft {
        title,
        start_time: payload.start_time,
        end_time: payload.end_time,
        candidates,
    })
}

/// Writes the election, its positions and its candidates through `storer`.
/// Nothing is committed here.
async fn assemble_in<T>(storer: &mut T, draft: &ElectionDraft) -> Result<ElectionDetail, Error>
where
    T: TxStore,
{
    let election = ElectionCommon::insert(
        storer,
        ElectionInsert {
            title: draft.title.clone(),
            start_time: draft.start_time,
            end_time: draft.end_time,
        },
    )
    .await?;
    let position_ids = resolve_positions(storer, &draft.position_names()).await?;
    let mut inserts = Vec::with_capacity(draft.candidates.len());
    for c in &draft.candidates {
        let position_id = *position_ids
            .get(&c.position)
            .ok_or_else(|| Error::NotFound(format!("position '{}'", c.position)))?;
        inserts.push(CandidateInsert {
            name: c.name.clone(),
            image: c.image.clone(),
            id_number: c.id_number.clone(),
            position_id,
            election_id: election.id,
        });
    }
    let created = CandidateCommon::bulk_insert(storer, inserts).await?;
    let position_names: HashMap<i32, &String> = position_ids.iter().map(|(name, id)| (*id, name)).collect();
    let candidates = created
        .into_iter()
        .map(|c| CandidateWithPosition {
            position: position_names.get(&c.position_id).map(|n| n.to_string()).unwrap_or_default(),
            id: c.id,
            name: c.name,
            image: c.image,
            id_number: c.id_number,
            position_id: c.position_id,
            election_id: c.election_id,
            created_at: c.created_at,
        })
        .collect();
    Ok(ElectionDetail { election, candidates })
}

/// Runs one assembly attempt inside `storer` and commits it, or rolls back
/// everything on failure.
pub async fn create_election<T>(mut storer: T, draft: &ElectionDraft) -> Result<ElectionDetail, Error>
where
    T: TxStore,
{
    match assemble_in(&mut storer, draft).await {
        Ok(detail) => {
            storer.commit().await?;
            Ok(detail)
        }
        Err(e) => {
            if let Err(rollback_err) = storer.rollback().await {
                warn!("rollback of election '{}' failed: {}", draft.title, rollback_err);
            }
            Err(e)
        }
    }
}

/// Creates an election with all of its candidates atomically.
///
/// A `position.name` conflict means another submission created one of our new
/// positions first; the whole assembly is retried once in a fresh transaction.
pub async fn assemble_election<'m, M, S, T>(manager: &'m M, payload: ElectionCreate) -> Result<ElectionDetail, Error>
where
    M: Manager<'m, S, T>,
    S: Store,
    T: TxStore,
{
    let draft = validate(payload)?;
    let mut retried = false;
    loop {
        let tx = manager.tx().await?;
        match create_election(tx, &draft).await {
            Ok(detail) => {
                info!(
                    "election {} '{}' created with {} candidates",
                    detail.election.id,
                    detail.election.title,
                    detail.candidates.len()
                );
                return Ok(detail);
            }
            Err(Error::Conflict(c)) if c.is_on("position", "name") && !retried => {
                warn!("position created concurrently while assembling '{}', retrying", draft.title);
                retried = true;
            }
            Err(e) => {
                if let Some(c) = e.conflict() {
                    warn!("election '{}' rejected: {}", draft.title, c);
                }
                return Err(e);
            }
        }
    }
}

pub async fn election_detail<S>(db: &mut S, id: i32) -> Result<ElectionDetail, Error>
where
    S: Store,
{
    let election = ElectionCommon::get(db, id).await?.ok_or_else(|| Error::NotFound(format!("election {}", id)))?;
    let candidates = CandidateCommon::query_by_election(db, id).await?;
    Ok(ElectionDetail { election, candidates })
}

pub async fn list_elections<S>(db: &mut S, pagination: Pagination) -> Result<(Vec<Election>, i64), Error>
where
    S: Store,
{
    let total = ElectionCommon::count(db).await?;
    let elections = ElectionCommon::query(db, pagination).await?;
    Ok((elections, total))
}
