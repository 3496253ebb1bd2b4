//! Account records and transaction signing.
//!
//! # Security
//! - Private keys come only from local JSON files (`flow.json`, `wallet.json`)
//! - Keys are never logged or serialized back out
//! - `Debug` output of records and signers is redacted

use std::fmt;

use p256::ecdsa::signature::hazmat::PrehashSigner;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sha3::Sha3_256;

use crate::blockchain::types::{Address, BlockchainError, BlockchainResult, HashAlgorithm, SignatureAlgorithm};

/// Something that can produce an envelope signature.
///
/// The message is the full domain-tagged envelope; the signer hashes it
/// with its own hash algorithm before signing.
pub trait TransactionSigner: Send + Sync {
    fn sign(&self, message: &[u8]) -> BlockchainResult<Vec<u8>>;
}

fn default_sig_algorithm() -> String {
    SignatureAlgorithm::EcdsaP256.as_str().to_string()
}

fn default_hash_algorithm() -> String {
    HashAlgorithm::Sha3_256.as_str().to_string()
}

/// A named account as stored in `flow.json` / `wallet.json`.
#[derive(Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct AccountRecord {
    pub address: String,

    #[serde(rename = "privateKey", alias = "private_key", alias = "key")]
    pub private_key: String,

    #[serde(rename = "sigAlgorithm", alias = "sig_algorithm", default = "default_sig_algorithm")]
    pub sig_algorithm: String,

    #[serde(rename = "hashAlgorithm", alias = "hash_algorithm", default = "default_hash_algorithm")]
    pub hash_algorithm: String,
}

impl AccountRecord {
    pub fn address(&self) -> BlockchainResult<Address> {
        self.address.parse()
    }

    pub fn sig_algorithm(&self) -> BlockchainResult<SignatureAlgorithm> {
        self.sig_algorithm.parse()
    }

    pub fn hash_algorithm(&self) -> BlockchainResult<HashAlgorithm> {
        self.hash_algorithm.parse()
    }

    /// Decode the key material into a signer.
    pub fn signer(&self) -> BlockchainResult<InMemorySigner> {
        InMemorySigner::from_record(self)
    }
}

impl fmt::Debug for AccountRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountRecord")
            .field("address", &self.address)
            .field("private_key", &"<redacted>")
            .field("sig_algorithm", &self.sig_algorithm)
            .field("hash_algorithm", &self.hash_algorithm)
            .finish()
    }
}

#[derive(Clone)]
enum SigningKey {
    P256(p256::ecdsa::SigningKey),
    Secp256k1(k256::ecdsa::SigningKey),
}

/// Signer holding a decoded private key in memory.
#[derive(Clone)]
pub struct InMemorySigner {
    key: SigningKey,
    hash_algo: HashAlgorithm,
}

impl InMemorySigner {
    /// Create a signer from a hex-encoded private key.
    ///
    /// # Arguments
    /// * `private_key_hex` - Hex string (with or without 0x prefix)
    /// * `sig_algo` - Curve the key belongs to
    /// * `hash_algo` - Hash applied to messages before signing
    pub fn from_private_key(
        private_key_hex: &str,
        sig_algo: SignatureAlgorithm,
        hash_algo: HashAlgorithm,
    ) -> BlockchainResult<Self> {
        let key_hex = private_key_hex.trim();
        let key_hex = key_hex.strip_prefix("0x").unwrap_or(key_hex);
        let bytes = hex::decode(key_hex)
            .map_err(|e| BlockchainError::Key(format!("Invalid private key format: {}", e)))?;

        let key = match sig_algo {
            SignatureAlgorithm::EcdsaP256 => p256::ecdsa::SigningKey::from_slice(&bytes)
                .map(SigningKey::P256)
                .map_err(|e| BlockchainError::Key(format!("Invalid private key for {}: {}", sig_algo, e)))?,
            SignatureAlgorithm::EcdsaSecp256k1 => k256::ecdsa::SigningKey::from_slice(&bytes)
                .map(SigningKey::Secp256k1)
                .map_err(|e| BlockchainError::Key(format!("Invalid private key for {}: {}", sig_algo, e)))?,
        };

        Ok(Self { key, hash_algo })
    }

    /// Create a signer from a stored account record.
    pub fn from_record(record: &AccountRecord) -> BlockchainResult<Self> {
        Self::from_private_key(&record.private_key, record.sig_algorithm()?, record.hash_algorithm()?)
    }

    /// Use a different hash algorithm, e.g. the one registered on chain for the key.
    pub fn with_hash_algorithm(mut self, hash_algo: HashAlgorithm) -> Self {
        self.hash_algo = hash_algo;
        self
    }

    pub fn sig_algorithm(&self) -> SignatureAlgorithm {
        match self.key {
            SigningKey::P256(_) => SignatureAlgorithm::EcdsaP256,
            SigningKey::Secp256k1(_) => SignatureAlgorithm::EcdsaSecp256k1,
        }
    }

    pub fn hash_algorithm(&self) -> HashAlgorithm {
        self.hash_algo
    }

    /// Uncompressed public key without the leading `04` tag, hex encoded.
    pub fn public_key_hex(&self) -> String {
        let point = match &self.key {
            SigningKey::P256(k) => k.verifying_key().to_encoded_point(false).as_bytes().to_vec(),
            SigningKey::Secp256k1(k) => k.verifying_key().to_encoded_point(false).as_bytes().to_vec(),
        };
        hex::encode(&point[1..])
    }

    fn digest(&self, message: &[u8]) -> Vec<u8> {
        match self.hash_algo {
            HashAlgorithm::Sha2_256 => Sha256::digest(message).to_vec(),
            HashAlgorithm::Sha3_256 => Sha3_256::digest(message).to_vec(),
        }
    }
}

impl TransactionSigner for InMemorySigner {
    /// Returns the 64-byte `r || s` signature.
    fn sign(&self, message: &[u8]) -> BlockchainResult<Vec<u8>> {
        let digest = self.digest(message);
        match &self.key {
            SigningKey::P256(k) => {
                let signature: p256::ecdsa::Signature = k
                    .sign_prehash(&digest)
                    .map_err(|e| BlockchainError::Key(format!("Signing failed: {}", e)))?;
                Ok(signature.to_bytes().to_vec())
            }
            SigningKey::Secp256k1(k) => {
                let signature: k256::ecdsa::Signature = k
                    .sign_prehash(&digest)
                    .map_err(|e| BlockchainError::Key(format!("Signing failed: {}", e)))?;
                Ok(signature.to_bytes().to_vec())
            }
        }
    }
}

impl fmt::Debug for InMemorySigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemorySigner")
            .field("sig_algo", &self.sig_algorithm())
            .field("hash_algo", &self.hash_algo)
            .field("public_key", &self.public_key_hex())
            .finish()
    }
}
