use actix_web::{HttpResponse, Responder, get, post, web};
use log::info;

use super::error_response;
use super::models::{AppState, ChainResponse, ValidateResponse};

/// Get the full blockchain.
#[get("/chain/")]
pub async fn get_chain(state: web::Data<AppState>) -> impl Responder {
    let bc = state.controller.snapshot();
    HttpResponse::Ok().json(ChainResponse {
        length: bc.len(),
        difficulty: bc.difficulty,
        is_valid: bc.is_valid,
        chain: &bc.chain,
    })
}

/// Validate the whole chain and point at the first bad block, if any.
#[get("/validate/")]
pub async fn validate_chain(state: web::Data<AppState>) -> impl Responder {
    let bc = state.controller.snapshot();
    let defect = bc.first_defect();
    let valid = !bc.chain.is_empty() && defect.is_none();
    HttpResponse::Ok().json(ValidateResponse {
        valid,
        length: bc.len(),
        difficulty: bc.difficulty,
        invalid_at: defect.map(|(i, _)| i),
        reason: defect.map(|(_, d)| d.to_string()),
    })
}

/// Discard every block and start over from a fresh genesis.
#[post("/reset/")]
pub async fn reset_chain(state: web::Data<AppState>) -> impl Responder {
    match state.controller.reset() {
        Ok(bc) => {
            info!("POST /reset/ - chain reset");
            HttpResponse::Ok().json(ChainResponse {
                length: bc.len(),
                difficulty: bc.difficulty,
                is_valid: bc.is_valid,
                chain: &bc.chain,
            })
        }
        Err(e) => error_response(&e),
    }
}
