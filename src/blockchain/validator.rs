use thiserror::Error;

use super::Block;
use super::hasher::meets_difficulty;

/// The first check a block failed against its predecessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BlockDefect {
    #[error("index does not follow the previous block")]
    IndexGap,
    #[error("previous hash does not match the previous block")]
    BrokenLink,
    #[error("stored hash does not match the block contents")]
    HashMismatch,
    #[error("hash does not meet the difficulty target")]
    InsufficientWork,
}

/// Check linkage, hash integrity and proof-of-work of `block` against `previous`.
pub fn check_block(block: &Block, previous: &Block, difficulty: u32) -> Result<(), BlockDefect> {
    if block.index != previous.index + 1 {
        return Err(BlockDefect::IndexGap);
    }
    if block.previous_hash != previous.hash {
        return Err(BlockDefect::BrokenLink);
    }
    if block.compute_hash() != block.hash {
        return Err(BlockDefect::HashMismatch);
    }
    if !meets_difficulty(&block.hash, difficulty) {
        return Err(BlockDefect::InsufficientWork);
    }
    Ok(())
}

pub fn validate_block(block: &Block, previous: &Block, difficulty: u32) -> bool {
    check_block(block, previous, difficulty).is_ok()
}

/// Position and reason of the first invalid block, if any.
///
/// Genesis is never checked: it has no predecessor and carries no proof.
pub fn first_defect(chain: &[Block], difficulty: u32) -> Option<(usize, BlockDefect)> {
    chain
        .windows(2)
        .enumerate()
        .find_map(|(i, pair)| {
            check_block(&pair[1], &pair[0], difficulty)
                .err()
                .map(|defect| (i + 1, defect))
        })
}

/// Whole-chain scan. An empty chain is invalid; genesis alone is always valid.
pub fn validate_chain(chain: &[Block], difficulty: u32) -> bool {
    !chain.is_empty() && first_defect(chain, difficulty).is_none()
}
