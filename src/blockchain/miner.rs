use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use log::{debug, info};
use tokio::sync::mpsc::UnboundedSender;

use super::hasher::meets_difficulty;
use super::{Block, Blockchain, Candidate, DEFAULT_YIELD_EVERY, Proof};
use crate::error::{ChainError, Result};

/// One hash attempt, as reported to a progress sink.
#[derive(Debug, Clone, PartialEq)]
pub struct MiningProgress {
    pub nonce: u64,
    pub hash: String,
    /// True only on the attempt that satisfied the target.
    pub found: bool,
}

pub type ProgressSink = UnboundedSender<MiningProgress>;

/// Shared flag used to abandon an in-flight search.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Knobs for a single nonce search.
#[derive(Debug, Clone)]
pub struct MineOptions {
    /// Hash attempts between cooperative yields to the scheduler.
    pub yield_every: u64,
    pub cancel: CancelToken,
}

impl Default for MineOptions {
    fn default() -> Self {
        Self {
            yield_every: DEFAULT_YIELD_EVERY,
            cancel: CancelToken::new(),
        }
    }
}

/// Search nonces 0, 1, 2, … until the candidate's hash meets `difficulty`.
///
/// No upper bound: an unsatisfiable difficulty searches until cancelled.
pub async fn find_proof(
    candidate: &Candidate,
    difficulty: u32,
    progress: Option<&ProgressSink>,
    opts: &MineOptions,
) -> Result<Proof> {
    let started = Instant::now();
    let yield_every = opts.yield_every.max(1);
    let mut nonce: u64 = 0;

    loop {
        if opts.cancel.is_cancelled() {
            debug!(
                "MINER - search for block #{} cancelled at nonce {}",
                candidate.index, nonce
            );
            return Err(ChainError::MiningAborted);
        }

        let hash = candidate.hash_with(nonce);
        let found = meets_difficulty(&hash, difficulty);

        if let Some(sink) = progress {
            // A dropped receiver only means nobody is watching.
            let _ = sink.send(MiningProgress {
                nonce,
                hash: hash.clone(),
                found,
            });
        }

        if found {
            let elapsed_secs = started.elapsed().as_secs_f64();
            info!(
                "MINER - block #{} sealed (nonce={}, hash={}, {:.3}s)",
                candidate.index, nonce, hash, elapsed_secs
            );
            return Ok(Proof {
                nonce,
                hash,
                elapsed_secs,
            });
        }

        nonce += 1;
        if nonce % yield_every == 0 {
            tokio::task::yield_now().await;
        }
    }
}

/// Mine the block that would extend `blockchain` with `data`.
///
/// `blockchain` is only read; committing the result is the caller's job.
pub async fn mine_block(
    blockchain: &Blockchain,
    data: &str,
    progress: Option<&ProgressSink>,
    opts: &MineOptions,
) -> Result<Block> {
    let candidate = Candidate::next(blockchain.last_block(), data);
    debug!(
        "MINER - searching block #{} at difficulty {}",
        candidate.index, blockchain.difficulty
    );
    let proof = find_proof(&candidate, blockchain.difficulty, progress, opts).await?;
    Ok(candidate.seal(proof))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::validate_block;
    use tokio::sync::mpsc::unbounded_channel;

    #[actix_web::test]
    async fn mined_block_meets_difficulty_and_rehashes() {
        let bc = Blockchain::new(2);
        let block = mine_block(&bc, "hello", None, &MineOptions::default())
            .await
            .unwrap();
        assert!(block.hash.starts_with("00"));
        assert_eq!(block.hash, block.compute_hash());
        assert_eq!(block.index, 1);
        assert!(validate_block(&block, bc.last_block(), 2));
        assert_eq!(bc.len(), 1);
    }

    #[actix_web::test]
    async fn progress_is_reported_for_every_attempt_in_order() {
        let bc = Blockchain::new(2);
        let (tx, mut rx) = unbounded_channel();
        let block = mine_block(&bc, "watched", Some(&tx), &MineOptions::default())
            .await
            .unwrap();
        drop(tx);

        let mut seen = Vec::new();
        while let Some(p) = rx.recv().await {
            seen.push(p);
        }
        assert_eq!(seen.len() as u64, block.nonce + 1);
        for (i, p) in seen.iter().enumerate() {
            assert_eq!(p.nonce, i as u64);
        }
        let last = seen.last().unwrap();
        assert!(last.found);
        assert_eq!(last.hash, block.hash);
        assert!(seen[..seen.len() - 1].iter().all(|p| !p.found));
    }

    #[actix_web::test]
    async fn cancelled_search_returns_aborted() {
        let bc = Blockchain::new(64);
        let opts = MineOptions {
            yield_every: 16,
            cancel: CancelToken::new(),
        };
        opts.cancel.cancel();
        let res = mine_block(&bc, "never", None, &opts).await;
        assert!(matches!(res, Err(ChainError::MiningAborted)));
    }

    #[actix_web::test]
    async fn cancellation_is_observed_mid_search() {
        let bc = Blockchain::new(64);
        let opts = MineOptions {
            yield_every: 8,
            cancel: CancelToken::new(),
        };
        let (tx, mut rx) = unbounded_channel::<MiningProgress>();
        let cancel = opts.cancel.clone();

        let watcher = async move {
            while let Some(p) = rx.recv().await {
                if p.nonce >= 100 {
                    cancel.cancel();
                    break;
                }
            }
        };
        let (res, _) = tokio::join!(mine_block(&bc, "stop me", Some(&tx), &opts), watcher);
        assert!(matches!(res, Err(ChainError::MiningAborted)));
    }

    #[actix_web::test]
    async fn closed_progress_receiver_does_not_stop_mining() {
        let bc = Blockchain::new(1);
        let (tx, rx) = unbounded_channel();
        drop(rx);
        let block = mine_block(&bc, "orphan", Some(&tx), &MineOptions::default())
            .await
            .unwrap();
        assert!(block.hash.starts_with('0'));
    }
}
