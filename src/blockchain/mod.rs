//! Access node integration subsystem.
//!
//! # Data Flow
//! ```text
//! flow.json / wallet.json records
//!     → wallet.rs (key decoding, signing)
//!     → transaction.rs (build, envelope message, signatures)
//!     → client.rs (REST access node, timeouts, failover)
//!     → seal.rs (poll until sealed)
//! ```
//!
//! # Security Constraints
//! - Private keys are only read from local JSON files
//! - Never log private keys or signatures
//! - Every access node call has a deadline

pub mod cadence;
pub mod client;
pub mod seal;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use cadence::CadenceValue;
pub use client::{AccessApi, HttpAccessClient, TransactionResultSource};
pub use seal::{SealPolicy, SealWaiter};
pub use transaction::Transaction;
pub use types::{
    Account, AccountKey, Address, BlockHeader, BlockchainError, BlockchainResult, Event, HashAlgorithm, Identifier,
    SignatureAlgorithm, TransactionResult, TransactionStatus,
};
pub use wallet::{AccountRecord, InMemorySigner, TransactionSigner};
