use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// A contested role such as "President". Names are shared across elections.
#[derive(Debug, Clone, Serialize, FromRow, PartialEq, Eq)]
pub struct Position {
    pub id: i32,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Insert {
    pub name: String,
}
