//! Educational proof-of-work ledger: hashing, mining, validation and a
//! single-writer controller, served over HTTP by the binary.

pub mod api;
pub mod blockchain;
pub mod config;
pub mod controller;
pub mod error;
pub mod store;

pub use blockchain::{Block, Blockchain};
pub use controller::ChainController;
pub use error::{ChainError, Result};
