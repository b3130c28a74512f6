pub mod candidate;
pub mod common;
pub mod course;
pub mod election;
pub mod organization;
pub mod position;
pub mod vote;
pub mod voter;
