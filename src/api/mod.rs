mod chain;
mod health;
mod mining;
pub mod models;
mod stats;

use actix_web::HttpResponse;
use actix_web::web::{self, ServiceConfig};

use crate::error::ChainError;

pub use models::AppState;

pub fn init_routes(cfg: &mut ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(health::health_check)
            .service(chain::get_chain)
            .service(chain::validate_chain)
            .service(chain::reset_chain)
            .service(mining::post_block)
            .service(mining::get_mining)
            .service(mining::cancel_mining)
            .service(stats::get_stats),
    );
}

/// Map an engine error onto an HTTP status.
fn error_response(err: &ChainError) -> HttpResponse {
    match err {
        ChainError::ConcurrentMiningRejected => HttpResponse::Conflict().body(err.to_string()),
        ChainError::MiningAborted => HttpResponse::Gone().body(err.to_string()),
        ChainError::InvalidBlock(_) | ChainError::MalformedSnapshot(_) => {
            HttpResponse::UnprocessableEntity().body(err.to_string())
        }
        ChainError::Store(_) | ChainError::Serialization(_) => {
            HttpResponse::InternalServerError().body(err.to_string())
        }
    }
}
