//! Chain-specific types and error definitions.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur during access node operations.
#[derive(Debug, Error)]
pub enum BlockchainError {
    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// The node refused the request (4xx).
    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The requested resource does not exist on the node.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The node answered with a payload we could not interpret.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Malformed Flow address.
    #[error("Invalid address '{0}'")]
    InvalidAddress(String),

    /// Malformed transaction or block identifier.
    #[error("Invalid identifier '{0}'")]
    InvalidIdentifier(String),

    /// Invalid private key format or signing failure.
    #[error("Key error: {0}")]
    Key(String),

    /// Transaction is missing a field required for signing or submission.
    #[error("Incomplete transaction: {0}")]
    IncompleteTransaction(String),

    /// Algorithm name not supported by this tool.
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Transaction was not sealed before the deadline.
    #[error("Transaction {tx_id} not sealed after {waited:?}")]
    SealTimeout { tx_id: Identifier, waited: Duration },

    /// Polling stopped after the configured number of attempts.
    #[error("Transaction {tx_id} not sealed after {attempts} status checks")]
    SealAttemptsExhausted { tx_id: Identifier, attempts: u32 },

    /// Transaction expired before it could be sealed.
    #[error("Transaction {0} expired")]
    Expired(Identifier),

    /// The wait was cancelled by the caller.
    #[error("Wait for transaction {0} cancelled")]
    Cancelled(Identifier),
}

impl BlockchainError {
    /// Failures worth retrying against another access node.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Rpc(_) | Self::Timeout(_))
    }
}

/// Result type for access node operations.
pub type BlockchainResult<T> = Result<T, BlockchainError>;

/// An 8-byte Flow account address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(pub [u8; 8]);

impl Address {
    /// Hex encoding without the `0x` prefix, as the REST API expects it.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl FromStr for Address {
    type Err = BlockchainError;

    /// Parses hex with or without `0x`. Short addresses are left padded,
    /// so `0x01` and `0000000000000001` are the same account.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        if digits.is_empty() || digits.len() > 16 {
            return Err(BlockchainError::InvalidAddress(s.to_string()));
        }
        let padded = format!("{:0>16}", digits);
        let bytes = hex::decode(&padded).map_err(|_| BlockchainError::InvalidAddress(s.to_string()))?;
        let mut out = [0u8; 8];
        out.copy_from_slice(&bytes);
        Ok(Self(out))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

/// 32-byte identifier of a transaction or block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Identifier(pub [u8; 32]);

impl Identifier {
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl FromStr for Identifier {
    type Err = BlockchainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let bytes = hex::decode(digits).map_err(|_| BlockchainError::InvalidIdentifier(s.to_string()))?;
        let array: [u8; 32] = bytes
            .try_into()
            .map_err(|_| BlockchainError::InvalidIdentifier(s.to_string()))?;
        Ok(Self(array))
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Lifecycle status of a submitted transaction as reported by the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionStatus {
    Unknown,
    Pending,
    Finalized,
    Executed,
    Sealed,
    Expired,
}

impl TransactionStatus {
    /// `Sealed` and `Expired` never change again.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Sealed | Self::Expired)
    }
}

impl FromStr for TransactionStatus {
    type Err = BlockchainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Unknown" | "" => Ok(Self::Unknown),
            "Pending" => Ok(Self::Pending),
            "Finalized" => Ok(Self::Finalized),
            "Executed" => Ok(Self::Executed),
            "Sealed" => Ok(Self::Sealed),
            "Expired" => Ok(Self::Expired),
            other => Err(BlockchainError::Decode(format!("unknown transaction status '{}'", other))),
        }
    }
}

/// An event emitted by a transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Fully qualified event type, e.g. `flow.AccountCreated`.
    pub event_type: String,
    pub transaction_id: Identifier,
    pub transaction_index: u32,
    pub event_index: u32,
    /// Decoded JSON-Cadence payload.
    pub payload: serde_json::Value,
}

impl Event {
    pub const ACCOUNT_CREATED: &'static str = "flow.AccountCreated";

    /// Look up a field of the event payload by name.
    ///
    /// Returns the JSON-Cadence encoded field value.
    pub fn field(&self, name: &str) -> Option<&serde_json::Value> {
        self.payload
            .get("value")?
            .get("fields")?
            .as_array()?
            .iter()
            .find(|f| f.get("name").and_then(|n| n.as_str()) == Some(name))?
            .get("value")
    }

    /// Address of the new account, if this is an account-created event.
    pub fn created_address(&self) -> Option<Address> {
        if self.event_type != Self::ACCOUNT_CREATED {
            return None;
        }
        self.field("address")?
            .get("value")?
            .as_str()?
            .parse()
            .ok()
    }
}

/// Snapshot of a transaction's state on the node.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionResult {
    pub status: TransactionStatus,
    pub status_code: u32,
    /// Execution error message, present when the transaction failed.
    pub error: Option<String>,
    /// Events in emission order.
    pub events: Vec<Event>,
    pub block_id: Option<Identifier>,
    pub computation_used: u64,
}

impl TransactionResult {
    /// A result with the given status and nothing else.
    pub fn with_status(status: TransactionStatus) -> Self {
        Self {
            status,
            status_code: 0,
            error: None,
            events: Vec::new(),
            block_id: None,
            computation_used: 0,
        }
    }

    pub fn is_sealed(&self) -> bool {
        self.status == TransactionStatus::Sealed
    }

    /// Iterate over events of one type.
    pub fn events_of<'a>(&'a self, event_type: &'a str) -> impl Iterator<Item = &'a Event> + 'a {
        self.events.iter().filter(move |e| e.event_type == event_type)
    }
}

/// Signature algorithms understood by the signer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureAlgorithm {
    EcdsaP256,
    EcdsaSecp256k1,
}

impl SignatureAlgorithm {
    /// Raw value used by Cadence's `SignatureAlgorithm` enum.
    pub fn cadence_raw_value(self) -> u8 {
        match self {
            Self::EcdsaP256 => 1,
            Self::EcdsaSecp256k1 => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::EcdsaP256 => "ECDSA_P256",
            Self::EcdsaSecp256k1 => "ECDSA_secp256k1",
        }
    }
}

impl FromStr for SignatureAlgorithm {
    type Err = BlockchainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ECDSA_P256" | "P256" => Ok(Self::EcdsaP256),
            "ECDSA_SECP256K1" | "SECP256K1" => Ok(Self::EcdsaSecp256k1),
            _ => Err(BlockchainError::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hash algorithms understood by the signer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Sha2_256,
    Sha3_256,
}

impl HashAlgorithm {
    /// Raw value used by Cadence's `HashAlgorithm` enum.
    pub fn cadence_raw_value(self) -> u8 {
        match self {
            Self::Sha2_256 => 1,
            Self::Sha3_256 => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sha2_256 => "SHA2_256",
            Self::Sha3_256 => "SHA3_256",
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = BlockchainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SHA2_256" => Ok(Self::Sha2_256),
            "SHA3_256" => Ok(Self::Sha3_256),
            _ => Err(BlockchainError::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A public key registered on an account.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountKey {
    pub index: u32,
    /// Hex encoded public key.
    pub public_key: String,
    pub sig_algo: SignatureAlgorithm,
    pub hash_algo: HashAlgorithm,
    /// Next proposal sequence number for this key.
    pub sequence_number: u64,
    pub weight: u32,
    pub revoked: bool,
}

/// On-chain view of an account.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub address: Address,
    pub balance: u64,
    pub keys: Vec<AccountKey>,
    /// Deployed contracts by name.
    pub contracts: BTreeMap<String, String>,
}

impl Account {
    /// Unrevoked key registered for `public_key` (hex, with or without `0x`).
    pub fn signing_key(&self, public_key: &str) -> Option<&AccountKey> {
        let wanted = public_key.trim_start_matches("0x");
        self.keys.iter().find(|k| {
            !k.revoked && k.public_key.trim_start_matches("0x").eq_ignore_ascii_case(wanted)
        })
    }
}

/// Header of a block.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockHeader {
    pub id: Identifier,
    pub parent_id: Identifier,
    pub height: u64,
}
