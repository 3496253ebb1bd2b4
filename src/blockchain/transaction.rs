//! Transaction building and envelope signing.
//!
//! # Responsibilities
//! - Hold the transaction body (script, arguments, keys, payer, authorizers)
//! - Produce the canonical, domain-tagged envelope message
//! - Attach payload and envelope signatures from any [`TransactionSigner`]

use alloy_rlp::{BufMut, Encodable, Header};

use crate::blockchain::cadence::CadenceValue;
use crate::blockchain::types::{Address, BlockchainError, BlockchainResult, Identifier};
use crate::blockchain::wallet::TransactionSigner;

/// Domain tag prepended to every transaction message before signing.
pub const TRANSACTION_DOMAIN_TAG: &str = "FLOW-V0.0-transaction";

/// Gas limit used when nothing else is configured.
pub const DEFAULT_GAS_LIMIT: u64 = 9999;

/// Key that proposes the transaction and whose sequence number it consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProposalKey {
    pub address: Address,
    pub key_index: u32,
    pub sequence_number: u64,
}

/// One signature over the payload or the envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionSignature {
    pub address: Address,
    /// Position of `address` among the transaction's signers.
    pub signer_index: u32,
    pub key_index: u32,
    pub signature: Vec<u8>,
}

/// A Flow transaction under construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub script: Vec<u8>,
    pub arguments: Vec<CadenceValue>,
    pub reference_block_id: Identifier,
    pub gas_limit: u64,
    pub proposal_key: Option<ProposalKey>,
    pub payer: Option<Address>,
    pub authorizers: Vec<Address>,
    pub payload_signatures: Vec<TransactionSignature>,
    pub envelope_signatures: Vec<TransactionSignature>,
}

impl Default for Transaction {
    fn default() -> Self {
        Self {
            script: Vec::new(),
            arguments: Vec::new(),
            reference_block_id: Identifier::default(),
            gas_limit: DEFAULT_GAS_LIMIT,
            proposal_key: None,
            payer: None,
            authorizers: Vec::new(),
            payload_signatures: Vec::new(),
            envelope_signatures: Vec::new(),
        }
    }
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(mut self, script: impl Into<Vec<u8>>) -> Self {
        self.script = script.into();
        self
    }

    pub fn with_argument(mut self, argument: CadenceValue) -> Self {
        self.arguments.push(argument);
        self
    }

    pub fn with_arguments(mut self, arguments: impl IntoIterator<Item = CadenceValue>) -> Self {
        self.arguments.extend(arguments);
        self
    }

    pub fn with_reference_block(mut self, id: Identifier) -> Self {
        self.reference_block_id = id;
        self
    }

    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    pub fn with_proposal_key(mut self, address: Address, key_index: u32, sequence_number: u64) -> Self {
        self.proposal_key = Some(ProposalKey {
            address,
            key_index,
            sequence_number,
        });
        self
    }

    pub fn with_payer(mut self, payer: Address) -> Self {
        self.payer = Some(payer);
        self
    }

    /// Add an authorizer; repeated addresses are ignored.
    pub fn with_authorizer(mut self, authorizer: Address) -> Self {
        if !self.authorizers.contains(&authorizer) {
            self.authorizers.push(authorizer);
        }
        self
    }

    /// Distinct signer addresses in signing order: proposer, payer, authorizers.
    pub fn signers(&self) -> Vec<Address> {
        let mut out: Vec<Address> = Vec::new();
        let candidates = self
            .proposal_key
            .map(|k| k.address)
            .into_iter()
            .chain(self.payer)
            .chain(self.authorizers.iter().copied());
        for address in candidates {
            if !out.contains(&address) {
                out.push(address);
            }
        }
        out
    }

    fn signer_index(&self, address: Address) -> BlockchainResult<u32> {
        self.signers()
            .iter()
            .position(|a| *a == address)
            .map(|i| i as u32)
            .ok_or_else(|| {
                BlockchainError::IncompleteTransaction(format!("{} is not a signer of this transaction", address))
            })
    }

    fn payload_item(&self) -> BlockchainResult<Rlp> {
        let proposal = self
            .proposal_key
            .ok_or_else(|| BlockchainError::IncompleteTransaction("missing proposal key".to_string()))?;
        let payer = self
            .payer
            .ok_or_else(|| BlockchainError::IncompleteTransaction("missing payer".to_string()))?;

        Ok(Rlp::List(vec![
            Rlp::Bytes(self.script.clone()),
            Rlp::List(self.arguments.iter().map(|a| Rlp::Bytes(a.to_argument_bytes())).collect()),
            Rlp::Bytes(self.reference_block_id.as_bytes().to_vec()),
            Rlp::Uint(self.gas_limit),
            Rlp::Bytes(proposal.address.as_bytes().to_vec()),
            Rlp::Uint(proposal.key_index as u64),
            Rlp::Uint(proposal.sequence_number),
            Rlp::Bytes(payer.as_bytes().to_vec()),
            Rlp::List(
                self.authorizers
                    .iter()
                    .map(|a| Rlp::Bytes(a.as_bytes().to_vec()))
                    .collect(),
            ),
        ]))
    }

    /// The bytes a payload signer signs: domain tag followed by the RLP
    /// encoding of the payload.
    pub fn payload_message(&self) -> BlockchainResult<Vec<u8>> {
        let mut out = domain_tag();
        self.payload_item()?.encode(&mut out);
        Ok(out)
    }

    /// The bytes an envelope signer signs: domain tag followed by
    /// the RLP encoding of `[payload, payload_signatures]`.
    pub fn envelope_message(&self) -> BlockchainResult<Vec<u8>> {
        let signatures = Rlp::List(
            self.payload_signatures
                .iter()
                .map(|s| {
                    Rlp::List(vec![
                        Rlp::Uint(s.signer_index as u64),
                        Rlp::Uint(s.key_index as u64),
                        Rlp::Bytes(s.signature.clone()),
                    ])
                })
                .collect(),
        );
        let envelope = Rlp::List(vec![self.payload_item()?, signatures]);

        let mut out = domain_tag();
        envelope.encode(&mut out);
        Ok(out)
    }

    /// Sign the payload as `address` using key `key_index`.
    ///
    /// Proposers and authorizers other than the payer sign the payload.
    /// Payload signatures must be in place before the envelope is signed.
    pub fn sign_payload(
        &mut self,
        address: Address,
        key_index: u32,
        signer: &dyn TransactionSigner,
    ) -> BlockchainResult<()> {
        let signer_index = self.signer_index(address)?;
        let signature = signer.sign(&self.payload_message()?)?;

        self.payload_signatures
            .retain(|s| !(s.address == address && s.key_index == key_index));
        self.payload_signatures.push(TransactionSignature {
            address,
            signer_index,
            key_index,
            signature,
        });
        self.payload_signatures.sort_by_key(|s| (s.signer_index, s.key_index));

        tracing::debug!(address = %address, key_index, "Payload signed");
        Ok(())
    }

    /// Sign the envelope as `address` using key `key_index`.
    ///
    /// A second signature for the same address and key replaces the first.
    pub fn sign_envelope(
        &mut self,
        address: Address,
        key_index: u32,
        signer: &dyn TransactionSigner,
    ) -> BlockchainResult<()> {
        let signer_index = self.signer_index(address)?;
        let message = self.envelope_message()?;
        let signature = signer.sign(&message)?;

        self.envelope_signatures
            .retain(|s| !(s.address == address && s.key_index == key_index));
        self.envelope_signatures.push(TransactionSignature {
            address,
            signer_index,
            key_index,
            signature,
        });

        tracing::debug!(address = %address, key_index, "Envelope signed");
        Ok(())
    }
}

fn domain_tag() -> Vec<u8> {
    let mut tag = TRANSACTION_DOMAIN_TAG.as_bytes().to_vec();
    tag.resize(32, 0);
    tag
}

/// Minimal RLP tree for the canonical transaction encoding.
enum Rlp {
    Bytes(Vec<u8>),
    Uint(u64),
    List(Vec<Rlp>),
}

impl Rlp {
    fn payload_length(items: &[Rlp]) -> usize {
        items.iter().map(Encodable::length).sum()
    }
}

impl Encodable for Rlp {
    fn encode(&self, out: &mut dyn BufMut) {
        match self {
            Rlp::Bytes(b) => b.as_slice().encode(out),
            Rlp::Uint(v) => v.encode(out),
            Rlp::List(items) => {
                Header {
                    list: true,
                    payload_length: Self::payload_length(items),
                }
                .encode(out);
                for item in items {
                    item.encode(out);
                }
            }
        }
    }

    fn length(&self) -> usize {
        match self {
            Rlp::Bytes(b) => b.as_slice().length(),
            Rlp::Uint(v) => v.length(),
            Rlp::List(items) => {
                let payload_length = Self::payload_length(items);
                alloy_rlp::length_of_length(payload_length) + payload_length
            }
        }
    }
}
