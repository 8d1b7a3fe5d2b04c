use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::Block;
use super::MAX_DIFFICULTY;
use super::validator::{BlockDefect, first_defect, validate_chain};
use crate::error::{ChainError, Result};

/// Snapshot of a proof-of-work chain. Never edited in place: every change
/// produces a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blockchain {
    pub chain: Vec<Block>,
    pub difficulty: u32,
    /// Cached result of the last full validation of `chain`.
    #[serde(default)]
    pub is_valid: bool,
}

impl Blockchain {
    /// Initialize a new blockchain with a genesis block.
    pub fn new(difficulty: u32) -> Self {
        Self {
            chain: vec![Block::genesis()],
            difficulty,
            is_valid: true,
        }
    }

    /// Parse a stored snapshot. The stored `isValid` is ignored and recomputed.
    pub fn from_snapshot(json: &str) -> Result<Self> {
        let mut bc: Self = serde_json::from_str(json)
            .map_err(|e| ChainError::MalformedSnapshot(e.to_string()))?;

        if !(1..=MAX_DIFFICULTY).contains(&bc.difficulty) {
            return Err(ChainError::MalformedSnapshot(format!(
                "difficulty must be 1..={MAX_DIFFICULTY}, got {}",
                bc.difficulty
            )));
        }
        match bc.chain.first() {
            None => {
                return Err(ChainError::MalformedSnapshot("chain is empty".into()));
            }
            Some(first) if !first.is_genesis() => {
                return Err(ChainError::MalformedSnapshot(
                    "chain does not start with a genesis block".into(),
                ));
            }
            Some(_) => {}
        }

        bc.is_valid = bc.validate();
        Ok(bc)
    }

    /// Restore from `snapshot` when it parses, otherwise start a fresh chain.
    pub fn load_or_initialize(snapshot: Option<&str>, difficulty: u32) -> Self {
        let Some(json) = snapshot else {
            info!("no stored chain, initializing genesis (difficulty={difficulty})");
            return Self::new(difficulty);
        };
        match Self::from_snapshot(json) {
            Ok(bc) => {
                if !bc.is_valid {
                    warn!("stored chain loaded but failed validation");
                }
                info!(
                    "restored chain: length={} difficulty={} valid={}",
                    bc.len(),
                    bc.difficulty,
                    bc.is_valid
                );
                bc
            }
            Err(e) => {
                warn!("discarding stored chain: {e}");
                Self::new(difficulty)
            }
        }
    }

    pub fn to_snapshot(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Return the last block in the chain.
    pub fn last_block(&self) -> &Block {
        self.chain
            .last()
            .expect("Blockchain should always have at least the genesis block")
    }

    /// New snapshot with `block` appended and validity recomputed.
    pub fn append(&self, block: Block) -> Self {
        let mut chain = Vec::with_capacity(self.chain.len() + 1);
        chain.extend_from_slice(&self.chain);
        chain.push(block);
        let is_valid = validate_chain(&chain, self.difficulty);
        Self {
            chain,
            difficulty: self.difficulty,
            is_valid,
        }
    }

    /// Run the full validator over `chain` (does not touch `is_valid`).
    pub fn validate(&self) -> bool {
        validate_chain(&self.chain, self.difficulty)
    }

    pub fn first_defect(&self) -> Option<(usize, BlockDefect)> {
        first_defect(&self.chain, self.difficulty)
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Sum of recorded search times across all mined blocks.
    pub fn total_mining_time(&self) -> f64 {
        self.chain.iter().map(Block::mining_time).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::{MineOptions, mine_block};

    async fn grow(bc: Blockchain, items: &[&str]) -> Blockchain {
        let mut bc = bc;
        for data in items {
            let block = mine_block(&bc, data, None, &MineOptions::default())
                .await
                .unwrap();
            bc = bc.append(block);
        }
        bc
    }

    #[test]
    fn new_chain_is_genesis_only_and_valid() {
        let bc = Blockchain::new(4);
        assert_eq!(bc.len(), 1);
        assert!(bc.is_valid);
        assert!(bc.last_block().is_genesis());
        assert!(bc.validate());
    }

    #[actix_web::test]
    async fn append_returns_new_snapshot() {
        let bc = Blockchain::new(1);
        let before = bc.clone();
        let block = mine_block(&bc, "hello", None, &MineOptions::default())
            .await
            .unwrap();
        let next = bc.append(block.clone());
        assert_eq!(next.len(), bc.len() + 1);
        assert_eq!(bc, before);
        assert_eq!(next.chain[..1], before.chain[..]);
        assert_eq!(next.last_block(), &block);
        assert!(next.is_valid);
    }

    #[actix_web::test]
    async fn tampering_after_mining_invalidates_chain() {
        let bc = Blockchain::new(1);
        let block = mine_block(&bc, "hello", None, &MineOptions::default())
            .await
            .unwrap();
        assert!(block.hash.starts_with('0'));

        let bc = bc.append(block);
        assert_eq!(bc.len(), 2);
        assert!(bc.is_valid);

        let mut tampered = bc.clone();
        tampered.chain[1].data = "hello!".into();
        assert!(!tampered.validate());
        assert_eq!(tampered.first_defect(), Some((1, BlockDefect::HashMismatch)));
    }

    #[actix_web::test]
    async fn snapshot_round_trip_preserves_chain() {
        let bc = grow(Blockchain::new(2), &["a", "b"]).await;
        assert_eq!(bc.len(), 3);

        let json = bc.to_snapshot().unwrap();
        let restored = Blockchain::from_snapshot(&json).unwrap();
        assert!(restored.is_valid);
        assert_eq!(restored, bc);
    }

    #[actix_web::test]
    async fn stored_validity_flag_is_not_trusted() {
        let bc = grow(Blockchain::new(1), &["a"]).await;
        let mut v = serde_json::to_value(&bc).unwrap();
        v["chain"][1]["data"] = "forged".into();
        v["isValid"] = true.into();

        let restored = Blockchain::from_snapshot(&v.to_string()).unwrap();
        assert!(!restored.is_valid);
    }

    #[test]
    fn malformed_snapshots_are_rejected() {
        for bad in [
            "not json",
            r#"{"difficulty":4,"isValid":true}"#,
            r#"{"chain":[],"difficulty":4,"isValid":true}"#,
            r#"{"chain":[{"index":0,"timestamp":1,"data":"g","nonce":0,"previousHash":"0","hash":"h"}],"difficulty":0,"isValid":true}"#,
            r#"{"chain":[{"index":0,"timestamp":1,"data":"g","nonce":0,"previousHash":"0","hash":"h"}],"difficulty":65,"isValid":true}"#,
            r#"{"chain":[{"index":1,"timestamp":1,"data":"g","nonce":0,"previousHash":"0","hash":"h"}],"difficulty":4,"isValid":true}"#,
        ] {
            assert!(
                matches!(
                    Blockchain::from_snapshot(bad),
                    Err(ChainError::MalformedSnapshot(_))
                ),
                "{bad}"
            );
        }
    }

    #[test]
    fn hardest_storable_difficulty_is_accepted() {
        let json = r#"{"chain":[{"index":0,"timestamp":1,"data":"g","nonce":0,"previousHash":"0","hash":"h"}],"difficulty":64,"isValid":false}"#;
        let bc = Blockchain::from_snapshot(json).unwrap();
        assert_eq!(bc.difficulty, 64);
        assert!(bc.is_valid);

        let too_hard = json.replace("\"difficulty\":64", "\"difficulty\":65");
        let bc = Blockchain::load_or_initialize(Some(&too_hard), 4);
        assert_eq!(bc.difficulty, 4);
        assert_eq!(bc.len(), 1);
    }

    #[test]
    fn load_or_initialize_recovers_from_garbage() {
        let bc = Blockchain::load_or_initialize(Some("{garbage"), 3);
        assert_eq!(bc.len(), 1);
        assert_eq!(bc.difficulty, 3);
        assert!(bc.is_valid);

        let fresh = Blockchain::load_or_initialize(None, 5);
        assert_eq!(fresh.difficulty, 5);
    }

    #[test]
    fn genesis_with_unmined_hash_is_still_valid() {
        let mut bc = Blockchain::new(4);
        bc.chain[0].hash = "f".repeat(64);
        let json = bc.to_snapshot().unwrap();
        assert!(Blockchain::from_snapshot(&json).unwrap().is_valid);
    }
}
