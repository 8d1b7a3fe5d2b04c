use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::hasher::calculate_hash;
use super::{GENESIS_DATA, GENESIS_PREVIOUS_HASH};

/// How a block came to exist.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BlockKind {
    /// First block of a chain, exempt from proof-of-work.
    Genesis,
    /// Produced by the miner; `mining_time` is the search duration in seconds.
    Mined { mining_time: f64 },
}

/// A single, immutable block in the chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "BlockRecord", into = "BlockRecord")]
pub struct Block {
    pub index: u64,
    pub timestamp: i64, // milliseconds since the Unix epoch (UTC)
    pub data: String,
    pub nonce: u64,
    pub previous_hash: String,
    pub hash: String,
    pub kind: BlockKind,
}

impl Block {
    /// Create the genesis block (first block in the chain).
    pub fn genesis() -> Self {
        Self::genesis_at(Utc::now().timestamp_millis())
    }

    pub fn genesis_at(timestamp: i64) -> Self {
        let hash = calculate_hash(0, timestamp, GENESIS_DATA, 0, GENESIS_PREVIOUS_HASH);
        Self {
            index: 0,
            timestamp,
            data: GENESIS_DATA.to_string(),
            nonce: 0,
            previous_hash: GENESIS_PREVIOUS_HASH.to_string(),
            hash,
            kind: BlockKind::Genesis,
        }
    }

    /// Recompute the digest from this block's own fields (ignores `hash`).
    pub fn compute_hash(&self) -> String {
        calculate_hash(
            self.index,
            self.timestamp,
            &self.data,
            self.nonce,
            &self.previous_hash,
        )
    }

    pub fn is_genesis(&self) -> bool {
        matches!(self.kind, BlockKind::Genesis)
    }

    /// Seconds spent searching for this block's nonce; zero for genesis.
    pub fn mining_time(&self) -> f64 {
        match self.kind {
            BlockKind::Genesis => 0.0,
            BlockKind::Mined { mining_time } => mining_time,
        }
    }
}

/// Proposed next block, fixed before the nonce search starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub index: u64,
    pub timestamp: i64,
    pub data: String,
    pub previous_hash: String,
}

impl Candidate {
    /// Prepare the block that would follow `tip`, stamped with the current time.
    pub fn next(tip: &Block, data: impl Into<String>) -> Self {
        Self {
            index: tip.index + 1,
            timestamp: Utc::now().timestamp_millis(),
            data: data.into(),
            previous_hash: tip.hash.clone(),
        }
    }

    pub fn hash_with(&self, nonce: u64) -> String {
        calculate_hash(
            self.index,
            self.timestamp,
            &self.data,
            nonce,
            &self.previous_hash,
        )
    }

    /// Turn the candidate into a block using a discovered proof.
    pub fn seal(self, proof: Proof) -> Block {
        Block {
            index: self.index,
            timestamp: self.timestamp,
            data: self.data,
            nonce: proof.nonce,
            previous_hash: self.previous_hash,
            hash: proof.hash,
            kind: BlockKind::Mined {
                mining_time: proof.elapsed_secs,
            },
        }
    }
}

/// Winning result of a nonce search.
#[derive(Debug, Clone, PartialEq)]
pub struct Proof {
    pub nonce: u64,
    pub hash: String,
    pub elapsed_secs: f64,
}

/// Persisted shape of a block. `miningTime` doubles as the legacy genesis
/// marker in stored data, so the kind is recovered from the index instead.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlockRecord {
    index: u64,
    timestamp: i64,
    data: String,
    nonce: u64,
    previous_hash: String,
    hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mining_time: Option<f64>,
}

impl From<BlockRecord> for Block {
    fn from(r: BlockRecord) -> Self {
        let kind = if r.index == 0 {
            BlockKind::Genesis
        } else {
            BlockKind::Mined {
                mining_time: r.mining_time.unwrap_or(0.0),
            }
        };
        Self {
            index: r.index,
            timestamp: r.timestamp,
            data: r.data,
            nonce: r.nonce,
            previous_hash: r.previous_hash,
            hash: r.hash,
            kind,
        }
    }
}

impl From<Block> for BlockRecord {
    fn from(b: Block) -> Self {
        Self {
            index: b.index,
            timestamp: b.timestamp,
            mining_time: Some(b.mining_time()),
            data: b.data,
            nonce: b.nonce,
            previous_hash: b.previous_hash,
            hash: b.hash,
        }
    }
}
