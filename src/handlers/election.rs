use crate::core::models::{
    election::{Election, ElectionCreate, ElectionDetail},
    vote::{PositionResult, VoteCast},
};
use crate::core::services::{election, tally as tally_service, vote};
use crate::database::sqlx::{PgSqlxManager, PgStore, PgTxStore};
use crate::error::Error;
use crate::request::{Ballot, Pagination};
use crate::response::{Count, CreateResponse, List};
use actix_web::web::{Data, Json, Path, Query};
use actix_web::HttpResponse;
use std::collections::BTreeMap;

pub async fn create(manager: Data<PgSqlxManager>, Json(body): Json<ElectionCreate>) -> Result<HttpResponse, Error> {
    let detail = election::assemble_election::<_, PgStore, PgTxStore>(manager.get_ref(), body).await?;
    Ok(HttpResponse::Created().json(detail))
}

pub async fn list(manager: Data<PgSqlxManager>, Query(page): Query<Pagination>) -> Result<Json<List<Election>>, Error> {
    let mut db = manager.acquire().await?;
    let (elections, total) = election::list_elections(&mut db, page.into()).await?;
    Ok(Json(List::new(elections, total)))
}

pub async fn detail(manager: Data<PgSqlxManager>, path: Path<(i32,)>) -> Result<Json<ElectionDetail>, Error> {
    let (election_id,) = path.into_inner();
    let mut db = manager.acquire().await?;
    let detail = election::election_detail(&mut db, election_id).await?;
    Ok(Json(detail))
}

pub async fn tally(manager: Data<PgSqlxManager>, path: Path<(i32,)>) -> Result<Json<BTreeMap<i32, i64>>, Error> {
    let (election_id,) = path.into_inner();
    let mut db = manager.acquire().await?;
    let counts = tally_service::tally(&mut db, election_id).await?;
    Ok(Json(counts))
}

pub async fn results(manager: Data<PgSqlxManager>, path: Path<(i32,)>) -> Result<Json<Vec<PositionResult>>, Error> {
    let (election_id,) = path.into_inner();
    let mut db = manager.acquire().await?;
    let results = tally_service::election_results(&mut db, election_id).await?;
    Ok(Json(results))
}

pub async fn candidate_votes(manager: Data<PgSqlxManager>, path: Path<(i32, i32)>) -> Result<Json<Count>, Error> {
    let (election_id, candidate_id) = path.into_inner();
    let mut db = manager.acquire().await?;
    let count = tally_service::count_votes(&mut db, election_id, candidate_id).await?;
    Ok(Json(Count { count }))
}

pub async fn cast_vote(manager: Data<PgSqlxManager>, path: Path<(i32,)>, Json(ballot): Json<Ballot>) -> Result<HttpResponse, Error> {
    let (election_id,) = path.into_inner();
    let tx = manager.begin().await?;
    let id = vote::record_vote(
        tx,
        VoteCast {
            voter_id: ballot.voter_id,
            candidate_id: ballot.candidate_id,
            election_id,
        },
    )
    .await?;
    Ok(HttpResponse::Created().json(CreateResponse { id }))
}
