use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::blockchain::{Block, MiningProgress};
use crate::controller::ChainController;

/// Last progress report seen for a mining job.
#[derive(Debug, Clone, Default)]
pub struct MiningStatus {
    pub job_id: Option<Uuid>,
    pub nonce: u64,
    pub hash: String,
    pub found: bool,
}

/// Shared application state: the chain controller and the latest mining progress.
pub struct AppState {
    pub controller: Arc<ChainController>,
    pub mining_status: Mutex<MiningStatus>,
}

impl AppState {
    pub fn new(controller: Arc<ChainController>) -> Self {
        Self {
            controller,
            mining_status: Mutex::new(MiningStatus::default()),
        }
    }

    pub fn start_job(&self, job_id: Uuid) {
        let mut status = self.mining_status.lock().expect("mutex poisoned");
        *status = MiningStatus {
            job_id: Some(job_id),
            ..MiningStatus::default()
        };
    }

    /// Record a progress report; reports from a superseded job are ignored.
    pub fn record_progress(&self, job_id: Uuid, progress: MiningProgress) {
        let mut status = self.mining_status.lock().expect("mutex poisoned");
        if status.job_id == Some(job_id) {
            status.nonce = progress.nonce;
            status.hash = progress.hash;
            status.found = progress.found;
        }
    }
}

/* ---------- Chain API Models ---------- */

#[derive(Serialize)]
pub struct ChainResponse<'a> {
    pub length: usize,
    pub difficulty: u32,
    pub is_valid: bool,
    pub chain: &'a [Block],
}

#[derive(Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub length: usize,
    pub difficulty: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid_at: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/* ---------- Mining API Models ---------- */

#[derive(Deserialize)]
pub struct NewBlockRequest {
    pub data: String,
}

#[derive(Serialize)]
pub struct MineAccepted {
    pub job_id: Uuid,
    pub index: u64,
    pub difficulty: u32,
}

#[derive(Serialize)]
pub struct MiningStatusResponse {
    pub active: bool,
    pub job_id: Option<Uuid>,
    pub data: Option<String>,
    pub elapsed_secs: Option<f64>,
    pub nonce: u64,
    pub hash: String,
    pub found: bool,
    pub target_prefix: String,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub length: usize,
    pub difficulty: u32,
    pub target_prefix: String,
    pub is_valid: bool,
    pub last_mining_time: Option<f64>,
    pub total_mining_time: f64,
}
