use crate::core::models::vote::PositionResult;
use crate::core::ports::repository::{Store, VoteCommon};
use crate::error::Error;
use itertools::Itertools;
use std::collections::BTreeMap;

/// Votes recorded for `candidate_id` within `election_id`. Unknown ids count 0.
pub async fn count_votes<S>(db: &mut S, election_id: i32, candidate_id: i32) -> Result<i64, Error>
where
    S: Store,
{
    VoteCommon::count(db, election_id, candidate_id).await
}

/// Vote count for every candidate of the election, including those with none.
pub async fn tally<S>(db: &mut S, election_id: i32) -> Result<BTreeMap<i32, i64>, Error>
where
    S: Store,
{
    let rows = VoteCommon::tally(db, election_id).await?;
    Ok(rows.into_iter().map(|r| (r.candidate_id, r.votes)).collect())
}

/// The tally grouped by position, leaders first within each position.
pub async fn election_results<S>(db: &mut S, election_id: i32) -> Result<Vec<PositionResult>, Error>
where
    S: Store,
{
    let rows = VoteCommon::tally(db, election_id).await?;
    let groups = rows.into_iter().group_by(|r| r.position.clone());
    let mut results = Vec::new();
    for (position, group) in &groups {
        let mut candidates: Vec<_> = group.collect();
        candidates.sort_by(|a, b| b.votes.cmp(&a.votes).then_with(|| a.name.cmp(&b.name)));
        results.push(PositionResult { position, candidates });
    }
    Ok(results)
}
