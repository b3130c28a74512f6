use crate::core::models::common::Pagination as PageWindow;
use serde::Deserialize;

fn first_page() -> i64 {
    1
}

fn default_size() -> i64 {
    20
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "first_page")]
    pub page: i64,
    #[serde(default = "default_size")]
    pub size: i64,
}

impl From<Pagination> for PageWindow {
    fn from(p: Pagination) -> Self {
        PageWindow::page(p.page, p.size)
    }
}

/// A ballot as submitted for an election given in the path.
#[derive(Debug, Deserialize)]
pub struct Ballot {
    pub voter_id: i32,
    pub candidate_id: i32,
}
