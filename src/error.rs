use thiserror::Error;

use crate::blockchain::BlockDefect;

/// Errors surfaced by the chain engine and its collaborators.
#[derive(Debug, Error)]
pub enum ChainError {
    /// Stored snapshot could not be parsed or is missing required fields.
    #[error("malformed snapshot: {0}")]
    MalformedSnapshot(String),

    /// The nonce search was cancelled before a proof was found.
    #[error("mining aborted")]
    MiningAborted,

    /// Another mining operation is already in flight on this chain.
    #[error("a block is already being mined")]
    ConcurrentMiningRejected,

    /// A freshly mined block failed the pre-commit check.
    #[error("mined block rejected: {0}")]
    InvalidBlock(BlockDefect),

    #[error("store I/O error: {0}")]
    Store(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ChainError>;
