//! Durable snapshot storage for a single chain.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use log::debug;

use crate::blockchain::Blockchain;
use crate::error::Result;

/// Where a chain snapshot lives between process runs.
pub trait ChainStore: Send + Sync {
    /// Raw snapshot text, or `None` when nothing has been stored yet.
    fn load(&self) -> Result<Option<String>>;
    fn save(&self, blockchain: &Blockchain) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

impl<S: ChainStore + ?Sized> ChainStore for Arc<S> {
    fn load(&self) -> Result<Option<String>> {
        (**self).load()
    }

    fn save(&self, blockchain: &Blockchain) -> Result<()> {
        (**self).save(blockchain)
    }

    fn clear(&self) -> Result<()> {
        (**self).clear()
    }
}

/// JSON snapshot kept in one file.
#[derive(Debug, Clone)]
pub struct FileChainStore {
    path: PathBuf,
}

impl FileChainStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ChainStore for FileChainStore {
    fn load(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, blockchain: &Blockchain) -> Result<()> {
        let json = blockchain.to_snapshot()?;
        // Write-then-rename so a crash never leaves half a snapshot behind.
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        debug!(
            "STORE - saved {} blocks to {}",
            blockchain.len(),
            self.path.display()
        );
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process store, handy for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryChainStore {
    slot: Mutex<Option<String>>,
}

impl MemoryChainStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a pre-existing snapshot text.
    pub fn with_snapshot(json: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(json.into())),
        }
    }
}

impl ChainStore for MemoryChainStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.slot.lock().expect("mutex poisoned").clone())
    }

    fn save(&self, blockchain: &Blockchain) -> Result<()> {
        let json = blockchain.to_snapshot()?;
        *self.slot.lock().expect("mutex poisoned") = Some(json);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.slot.lock().expect("mutex poisoned") = None;
        Ok(())
    }
}
