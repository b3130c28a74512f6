use crate::core::models::candidate::{CandidateCreate, CandidateWithPosition};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow, PartialEq, Eq)]
pub struct Election {
    pub id: i32,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// The admin submission, already parsed out of whatever form produced it.
/// Missing text fields parse as blank so validation can report them by field.
#[derive(Debug, Clone, Deserialize)]
pub struct ElectionCreate {
    #[serde(default)]
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub candidates: Vec<CandidateCreate>,
}

#[derive(Debug, Clone)]
pub struct Insert {
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ElectionDetail {
    pub election: Election,
    pub candidates: Vec<CandidateWithPosition>,
}
