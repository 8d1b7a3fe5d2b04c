pub mod block;
pub mod hasher;
pub mod miner;
pub mod model;
pub mod validator;

pub use block::{Block, BlockKind, Candidate, Proof};
pub use hasher::{calculate_hash, meets_difficulty, target_prefix};
pub use miner::{CancelToken, MineOptions, MiningProgress, ProgressSink, find_proof, mine_block};
pub use model::Blockchain;
pub use validator::{BlockDefect, check_block, validate_block, validate_chain};

/// Default Proof-of-Work difficulty (number of leading zero hex characters).
pub const DEFAULT_DIFFICULTY: u32 = 4;

/// A SHA-256 hex digest has 64 characters; more cannot be required.
pub const MAX_DIFFICULTY: u32 = 64;

/// Payload of every genesis block.
pub const GENESIS_DATA: &str = "Genesis Block";

/// Stand-in for the missing predecessor of genesis.
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// Hash attempts between scheduler yields while mining.
pub const DEFAULT_YIELD_EVERY: u64 = 1000;

/// Upper bound for the yield interval.
pub const MAX_YIELD_EVERY: u64 = 4096;
