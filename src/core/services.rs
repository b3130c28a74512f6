pub mod election;
pub mod position;
pub mod tally;
pub mod vote;
