pub mod election;
pub mod position;

use crate::error::{Error, ValidationErrors};
use actix_web::error::JsonPayloadError;
use actix_web::web::{get, post, resource, scope, JsonConfig, ServiceConfig};
use actix_web::HttpRequest;

/// Reports unparseable JSON bodies in the same shape as validation failures.
fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    Error::Validation(ValidationErrors::single("body", err.to_string())).into()
}

/// Mounts the JSON endpoints. Callers are expected to have passed the admin
/// gate before reaching the write routes.
pub fn routes(cfg: &mut ServiceConfig) {
    cfg.app_data(JsonConfig::default().error_handler(json_error))
        .service(
            scope("/elections")
                .route("", post().to(election::create))
                .route("", get().to(election::list))
                .service(
                    scope("/{election_id}")
                        .route("", get().to(election::detail))
                        .route("/tally", get().to(election::tally))
                        .route("/results", get().to(election::results))
                        .route("/votes", post().to(election::cast_vote))
                        .route("/candidates/{candidate_id}/votes", get().to(election::candidate_votes)),
                ),
        )
        .service(resource("/positions").route(get().to(position::list)));
}
