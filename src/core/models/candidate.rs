use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow, PartialEq, Eq)]
pub struct Candidate {
    pub id: i32,
    pub name: String,
    pub image: Option<String>,
    pub id_number: Option<String>,
    pub position_id: i32,
    pub election_id: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, PartialEq, Eq)]
pub struct CandidateWithPosition {
    pub id: i32,
    pub name: String,
    pub image: Option<String>,
    pub id_number: Option<String>,
    pub position_id: i32,
    pub position: String,
    pub election_id: i32,
    pub created_at: DateTime<Utc>,
}

/// One candidate entry of an election submission. The position is named, not
/// referenced by id; it is resolved (or created) during assembly.
#[derive(Debug, Clone, Deserialize)]
pub struct CandidateCreate {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub id_number: Option<String>,
    #[serde(default)]
    pub position: String,
}

#[derive(Debug, Clone)]
pub struct Insert {
    pub name: String,
    pub image: Option<String>,
    pub id_number: Option<String>,
    pub position_id: i32,
    pub election_id: i32,
}
