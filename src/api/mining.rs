use actix_web::{HttpResponse, Responder, delete, get, post, rt, web};
use log::{debug, info, warn};
use tokio::sync::mpsc::unbounded_channel;

use super::error_response;
use super::models::{AppState, MineAccepted, MiningStatusResponse, NewBlockRequest};
use crate::blockchain::target_prefix;

/// Start mining a block carrying `data`. The search runs in the background;
/// poll `/mining/` for progress.
#[post("/blocks/")]
pub async fn post_block(
    state: web::Data<AppState>,
    body: web::Json<NewBlockRequest>,
) -> impl Responder {
    let data = body.data.trim();
    if data.is_empty() {
        warn!("POST /blocks/ - rejected: empty data");
        return HttpResponse::BadRequest().body("data must not be empty");
    }

    let ticket = match state.controller.reserve(data) {
        Ok(t) => t,
        Err(e) => return error_response(&e),
    };
    let job_id = ticket.id();
    let index = ticket.base().last_block().index + 1;
    let difficulty = ticket.base().difficulty;
    state.start_job(job_id);

    let (tx, mut rx) = unbounded_channel();
    let progress_state = state.clone();
    rt::spawn(async move {
        while let Some(p) = rx.recv().await {
            progress_state.record_progress(job_id, p);
        }
    });
    rt::spawn(async move {
        match ticket.mine(Some(tx)).await {
            Ok(bc) => debug!("JOB {job_id} done, chain length {}", bc.len()),
            Err(e) => warn!("JOB {job_id} produced no block: {e}"),
        }
    });

    info!("POST /blocks/ - job {job_id} mining block #{index} (difficulty={difficulty})");
    HttpResponse::Accepted().json(MineAccepted {
        job_id,
        index,
        difficulty,
    })
}

/// Progress of the current (or most recent) mining job.
#[get("/mining/")]
pub async fn get_mining(state: web::Data<AppState>) -> impl Responder {
    let job = state.controller.current_job();
    let difficulty = state.controller.snapshot().difficulty;
    let status = state.mining_status.lock().expect("mutex poisoned").clone();

    HttpResponse::Ok().json(MiningStatusResponse {
        active: job.is_some(),
        job_id: job.as_ref().map(|j| j.id).or(status.job_id),
        data: job.as_ref().map(|j| j.data.clone()),
        elapsed_secs: job.as_ref().map(|j| j.elapsed_secs),
        nonce: status.nonce,
        hash: status.hash,
        found: status.found,
        target_prefix: target_prefix(difficulty),
    })
}

/// Abandon the in-flight search. The chain is left untouched.
#[delete("/mining/")]
pub async fn cancel_mining(state: web::Data<AppState>) -> impl Responder {
    if state.controller.cancel_mining() {
        HttpResponse::Accepted().finish()
    } else {
        HttpResponse::NotFound().body("no mining job in progress")
    }
}
