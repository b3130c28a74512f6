use crate::core::services::position::position_names;
use crate::database::sqlx::PgSqlxManager;
use crate::error::Error;
use actix_web::web::{Data, Json};

/// Known position names, used by the admin UI to suggest existing positions.
pub async fn list(manager: Data<PgSqlxManager>) -> Result<Json<Vec<String>>, Error> {
    let mut db = manager.acquire().await?;
    let names = position_names(&mut db).await?;
    Ok(Json(names))
}
