use crate::core::models::vote::{Insert as VoteInsert, VoteCast};
use crate::core::ports::repository::{CandidateCommon, TxStore, VoteCommon, VoterCommon};
use crate::error::{Error, ValidationErrors};
use log::{info, warn};

async fn insert_ballot<T>(storer: &mut T, cast: VoteCast) -> Result<i32, Error>
where
    T: TxStore,
{
    let candidate = CandidateCommon::get(storer, cast.candidate_id)
        .await?
        .ok_or_else(|| Error::Validation(ValidationErrors::single("candidate_id", "unknown candidate")))?;
    if candidate.election_id != cast.election_id {
        return Err(Error::Validation(ValidationErrors::single(
            "candidate_id",
            "candidate does not run in this election",
        )));
    }
    if VoterCommon::get(storer, cast.voter_id).await?.is_none() {
        return Err(Error::Validation(ValidationErrors::single("voter_id", "unknown voter")));
    }
    VoteCommon::insert(
        storer,
        VoteInsert {
            voter_id: cast.voter_id,
            candidate_id: cast.candidate_id,
            election_id: cast.election_id,
        },
    )
    .await
}

/// Records one ballot in its own transaction. Either the vote is stored or
/// nothing is.
///
/// The voting window and one-vote-per-position rules are left to the voting UI.
pub async fn record_vote<T>(mut storer: T, cast: VoteCast) -> Result<i32, Error>
where
    T: TxStore,
{
    match insert_ballot(&mut storer, cast).await {
        Ok(id) => {
            storer.commit().await?;
            info!("vote {} recorded for candidate {} in election {}", id, cast.candidate_id, cast.election_id);
            Ok(id)
        }
        Err(e) => {
            if let Err(rollback_err) = storer.rollback().await {
                warn!("rollback of vote failed: {}", rollback_err);
            }
            Err(e)
        }
    }
}
