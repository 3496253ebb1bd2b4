//! Errors surfaced by the tooling facade.

use std::path::PathBuf;

use thiserror::Error;

use crate::blockchain::types::{Address, BlockchainError, Identifier};
use crate::config::loader::ConfigError;
use crate::tooling::paths::CodeKind;

#[derive(Debug, Error)]
pub enum ToolingError {
    /// Talking to the access node failed, or the transaction never sealed.
    #[error(transparent)]
    Blockchain(#[from] BlockchainError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A Cadence source file could not be read.
    #[error("Could not read {kind} file from path={}: {source}", path.display())]
    MissingCode {
        kind: CodeKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The transaction sealed, but its execution failed.
    #[error("Transaction {tx_id} failed: {message}")]
    Execution { tx_id: Identifier, message: String },

    /// The chain created a different address than the wallet expects.
    #[error("The address for account={name} in the wallet is {expected}, but the chain created {actual}")]
    AddressMismatch {
        name: String,
        expected: Address,
        actual: String,
    },

    #[error("Need at least one signer to sign")]
    NoSigners,

    /// The account has no unrevoked key for the record's private key.
    #[error("Account {0} has no usable key")]
    NoUsableKey(Address),
}

/// Result type for tooling operations.
pub type ToolingResult<T> = Result<T, ToolingError>;
