//! Single-writer orchestration of mining, validation and persistence for one chain.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use log::{debug, info, warn};
use uuid::Uuid;

use crate::blockchain::{
    Block, Blockchain, CancelToken, MineOptions, ProgressSink, check_block, mine_block,
};
use crate::error::{ChainError, Result};
use crate::store::ChainStore;

/// The one mining operation allowed at a time.
#[derive(Debug, Clone)]
struct ActiveJob {
    id: Uuid,
    data: String,
    cancel: CancelToken,
    started: Instant,
}

/// Public view of the in-flight mining job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobInfo {
    pub id: Uuid,
    pub data: String,
    pub elapsed_secs: f64,
}

pub struct ChainController {
    current: Mutex<Arc<Blockchain>>,
    job: Mutex<Option<ActiveJob>>,
    store: Box<dyn ChainStore>,
    difficulty: u32,
    yield_every: u64,
}

impl ChainController {
    /// Load the stored chain, or start a fresh one when there is none or it is unreadable.
    pub fn open(store: Box<dyn ChainStore>, difficulty: u32, yield_every: u64) -> Self {
        let snapshot = match store.load() {
            Ok(s) => s,
            Err(e) => {
                warn!("could not read chain store: {e}");
                None
            }
        };
        let bc = Blockchain::load_or_initialize(snapshot.as_deref(), difficulty);
        if bc.difficulty != difficulty {
            info!(
                "stored chain keeps its difficulty {} (configured {})",
                bc.difficulty, difficulty
            );
        }

        let controller = Self {
            current: Mutex::new(Arc::new(bc)),
            job: Mutex::new(None),
            store,
            difficulty,
            yield_every,
        };
        controller.persist(&controller.snapshot());
        controller
    }

    /// Current chain snapshot. Later commits never change the returned value.
    pub fn snapshot(&self) -> Arc<Blockchain> {
        self.current.lock().expect("mutex poisoned").clone()
    }

    /// Re-run the validator over the current chain.
    pub fn validate(&self) -> bool {
        self.snapshot().validate()
    }

    pub fn is_mining(&self) -> bool {
        self.job.lock().expect("mutex poisoned").is_some()
    }

    pub fn current_job(&self) -> Option<JobInfo> {
        self.job
            .lock()
            .expect("mutex poisoned")
            .as_ref()
            .map(|j| JobInfo {
                id: j.id,
                data: j.data.clone(),
                elapsed_secs: j.started.elapsed().as_secs_f64(),
            })
    }

    /// Claim the mining slot for `data`.
    pub fn reserve(self: &Arc<Self>, data: impl Into<String>) -> Result<MiningTicket> {
        let data = data.into();
        let mut slot = self.job.lock().expect("mutex poisoned");
        if let Some(active) = slot.as_ref() {
            warn!("append rejected: job {} still mining", active.id);
            return Err(ChainError::ConcurrentMiningRejected);
        }

        let job = ActiveJob {
            id: Uuid::new_v4(),
            data: data.clone(),
            cancel: CancelToken::new(),
            started: Instant::now(),
        };
        let ticket = MiningTicket {
            controller: Arc::clone(self),
            id: job.id,
            data,
            cancel: job.cancel.clone(),
            base: self.snapshot(),
        };
        debug!("JOB {} reserved", job.id);
        *slot = Some(job);
        Ok(ticket)
    }

    /// Mine `data` on top of the current chain and commit it.
    pub async fn add_block(
        self: &Arc<Self>,
        data: impl Into<String>,
        progress: Option<ProgressSink>,
    ) -> Result<Arc<Blockchain>> {
        self.reserve(data)?.mine(progress).await
    }

    /// Request cancellation of the in-flight job. Returns false if none is running.
    pub fn cancel_mining(&self) -> bool {
        match self.job.lock().expect("mutex poisoned").as_ref() {
            Some(job) => {
                info!("JOB {} cancellation requested", job.id);
                job.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Replace the chain with a fresh genesis-only one.
    pub fn reset(&self) -> Result<Arc<Blockchain>> {
        // Held across the swap so no job can be reserved mid-reset.
        let slot = self.job.lock().expect("mutex poisoned");
        if slot.is_some() {
            return Err(ChainError::ConcurrentMiningRejected);
        }

        let fresh = Arc::new(Blockchain::new(self.difficulty));
        *self.current.lock().expect("mutex poisoned") = Arc::clone(&fresh);

        info!("chain reset to genesis (difficulty={})", self.difficulty);
        self.persist(&fresh);
        drop(slot);
        Ok(fresh)
    }

    /// Append `block` if `job` still owns the slot, was not cancelled, and the
    /// block still extends the current tip. The slot is freed on success.
    fn commit(&self, job: Uuid, block: Block) -> Result<Arc<Blockchain>> {
        // Lock order: job slot, then chain (same as `reset`).
        let mut slot = self.job.lock().expect("mutex poisoned");
        match slot.as_ref() {
            Some(active) if active.id == job && !active.cancel.is_cancelled() => {}
            _ => {
                info!(
                    "JOB {job} no longer active at commit, block #{} dropped",
                    block.index
                );
                return Err(ChainError::MiningAborted);
            }
        }
        let mut current = self.current.lock().expect("mutex poisoned");

        if let Err(defect) = check_block(&block, current.last_block(), current.difficulty) {
            warn!(
                "JOB {job} block #{} rejected before commit: {defect}",
                block.index
            );
            return Err(ChainError::InvalidBlock(defect));
        }
        let next = Arc::new(current.append(block));
        *current = Arc::clone(&next);
        drop(current);

        info!(
            "JOB {job} committed block #{} (length={}, valid={})",
            next.last_block().index,
            next.len(),
            next.is_valid
        );
        // Saved under the slot lock so a following reset is always written last.
        self.persist(&next);
        *slot = None;
        Ok(next)
    }

    fn release(&self, job: Uuid) {
        let mut slot = self.job.lock().expect("mutex poisoned");
        if slot.as_ref().is_some_and(|j| j.id == job) {
            *slot = None;
            debug!("JOB {job} released");
        }
    }

    fn persist(&self, bc: &Blockchain) {
        if let Err(e) = self.store.save(bc) {
            warn!("failed to persist chain: {e}");
        }
    }
}

/// Exclusive right to mine the next block. Dropping it frees the slot.
pub struct MiningTicket {
    controller: Arc<ChainController>,
    id: Uuid,
    data: String,
    cancel: CancelToken,
    base: Arc<Blockchain>,
}

impl MiningTicket {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Chain the block will be mined on top of.
    pub fn base(&self) -> &Blockchain {
        &self.base
    }

    /// Run the nonce search and commit the block. Nothing is written on failure.
    pub async fn mine(self, progress: Option<ProgressSink>) -> Result<Arc<Blockchain>> {
        let opts = MineOptions {
            yield_every: self.controller.yield_every,
            cancel: self.cancel.clone(),
        };
        info!(
            "JOB {} mining block #{} (difficulty={})",
            self.id,
            self.base.last_block().index + 1,
            self.base.difficulty
        );

        let block = match mine_block(&self.base, &self.data, progress.as_ref(), &opts).await {
            Ok(b) => b,
            Err(e) => {
                info!("JOB {} ended without a block: {e}", self.id);
                return Err(e);
            }
        };
        self.controller.commit(self.id, block)
    }
}

impl Drop for MiningTicket {
    fn drop(&mut self) {
        self.controller.release(self.id);
    }
}
