use actix_web::{HttpResponse, Responder, get, web};

use super::models::{AppState, StatsResponse};
use crate::blockchain::target_prefix;

#[get("/stats/")]
pub async fn get_stats(state: web::Data<AppState>) -> impl Responder {
    let bc = state.controller.snapshot();

    let last_mining_time = bc
        .chain
        .last()
        .filter(|b| !b.is_genesis())
        .map(|b| b.mining_time());

    HttpResponse::Ok().json(StatsResponse {
        length: bc.len(),
        difficulty: bc.difficulty,
        target_prefix: target_prefix(bc.difficulty),
        is_valid: bc.is_valid,
        last_mining_time,
        total_mining_time: bc.total_mining_time(),
    })
}
