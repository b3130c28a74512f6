use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One ballot cast by one voter for one candidate within one election.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Vote {
    pub id: i32,
    pub voter_id: i32,
    pub candidate_id: i32,
    pub election_id: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct VoteCast {
    pub voter_id: i32,
    pub candidate_id: i32,
    pub election_id: i32,
}

#[derive(Debug, Clone, Copy)]
pub struct Insert {
    pub voter_id: i32,
    pub candidate_id: i32,
    pub election_id: i32,
}

#[derive(Debug, Clone, Serialize, FromRow, PartialEq, Eq)]
pub struct CandidateTally {
    pub candidate_id: i32,
    pub name: String,
    pub position: String,
    pub votes: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PositionResult {
    pub position: String,
    pub candidates: Vec<CandidateTally>,
}
