//! Access node client with timeout and failover handling.
//!
//! # Responsibilities
//! - Define the access API the rest of the crate talks to
//! - Implement it over the node's REST interface
//! - Bound every call with a timeout and fall over to secondary nodes
//!   on transport failures

use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use url::Url;

use crate::blockchain::cadence::CadenceValue;
use crate::blockchain::transaction::{Transaction, TransactionSignature};
use crate::blockchain::types::{
    Account, AccountKey, Address, BlockHeader, BlockchainError, BlockchainResult, Event, Identifier,
    TransactionResult,
};
use crate::config::schema::NetworkConfig;
use crate::observability::metrics;

/// Anything that can report the current result of a transaction.
#[async_trait]
pub trait TransactionResultSource: Send + Sync {
    async fn get_transaction_result(&self, id: &Identifier) -> BlockchainResult<TransactionResult>;
}

/// Operations offered by a Flow access node.
#[async_trait]
pub trait AccessApi: TransactionResultSource {
    /// Fetch an account with its keys and contracts.
    async fn get_account(&self, address: &Address) -> BlockchainResult<Account>;

    /// Latest sealed (or merely finalized) block header.
    async fn get_latest_block_header(&self, sealed: bool) -> BlockchainResult<BlockHeader>;

    /// Submit a signed transaction, returning its identifier.
    async fn send_transaction(&self, tx: &Transaction) -> BlockchainResult<Identifier>;

    /// Run a read-only script against the latest sealed block.
    async fn execute_script_at_latest_block(
        &self,
        script: &[u8],
        arguments: &[CadenceValue],
    ) -> BlockchainResult<CadenceValue>;
}

/// REST access client with failover support.
#[derive(Clone)]
pub struct HttpAccessClient {
    /// Primary endpoint followed by failovers.
    endpoints: Vec<Url>,
    http: reqwest::Client,
    config: NetworkConfig,
    timeout_duration: Duration,
}

impl HttpAccessClient {
    /// Create a client for the configured network.
    ///
    /// Invalid failover URLs are skipped with a warning; an invalid
    /// primary URL is an error.
    pub fn new(config: &NetworkConfig) -> BlockchainResult<Self> {
        let mut endpoints = vec![parse_endpoint(&config.access_url).map_err(|e| {
            BlockchainError::Rpc(format!("Invalid access URL '{}': {}", config.access_url, e))
        })?];

        for url_str in &config.failover_urls {
            match parse_endpoint(url_str) {
                Ok(url) => endpoints.push(url),
                Err(_) => tracing::warn!(url = %url_str, "Ignoring invalid failover access URL"),
            }
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("flow-tooling/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BlockchainError::Rpc(format!("Failed to build HTTP client: {}", e)))?;

        tracing::debug!(
            access_url = %config.access_url,
            failovers = endpoints.len() - 1,
            timeout_secs = config.rpc_timeout_secs,
            "Access client initialized"
        );

        Ok(Self {
            endpoints,
            http,
            config: config.clone(),
            timeout_duration: Duration::from_secs(config.rpc_timeout_secs),
        })
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Check that the node answers a latest-block query.
    pub async fn is_healthy(&self) -> bool {
        self.get_latest_block_header(true).await.is_ok()
    }

    /// Run `call` against each endpoint in turn until one succeeds.
    ///
    /// Only transport failures move on to the next endpoint; anything the
    /// node itself answered is returned straight away.
    async fn with_failover<T, F, Fut>(&self, op: &str, call: F) -> BlockchainResult<T>
    where
        F: Fn(Url) -> Fut,
        Fut: Future<Output = BlockchainResult<T>>,
    {
        let mut last_error = None;
        for (i, endpoint) in self.endpoints.iter().enumerate() {
            match timeout(self.timeout_duration, call(endpoint.clone())).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) if e.is_transport() => {
                    tracing::warn!(endpoint_idx = i, op, error = %e, "Access node error, trying next endpoint");
                    last_error = Some(e);
                }
                Ok(Err(e)) => return Err(e),
                Err(_) => {
                    tracing::warn!(endpoint_idx = i, op, "Access node timeout, trying next endpoint");
                    last_error = Some(BlockchainError::Timeout(self.config.rpc_timeout_secs));
                }
            }
        }
        let detail = last_error.map(|e| e.to_string()).unwrap_or_default();
        Err(BlockchainError::Rpc(format!("All access nodes failed to {}: {}", op, detail)))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> BlockchainResult<T> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| BlockchainError::Rpc(e.to_string()))?;
        decode_response(response).await
    }

    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(&self, url: Url, body: &B) -> BlockchainResult<T> {
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| BlockchainError::Rpc(e.to_string()))?;
        decode_response(response).await
    }
}

#[async_trait]
impl TransactionResultSource for HttpAccessClient {
    async fn get_transaction_result(&self, id: &Identifier) -> BlockchainResult<TransactionResult> {
        let path = format!("v1/transaction_results/{}", id.to_hex());
        let dto: TransactionResultDto = self
            .with_failover("get transaction result", |base| {
                let path = path.clone();
                async move { self.get_json(join(&base, &path)?).await }
            })
            .await?;
        dto.try_into()
    }
}

#[async_trait]
impl AccessApi for HttpAccessClient {
    async fn get_account(&self, address: &Address) -> BlockchainResult<Account> {
        let path = format!("v1/accounts/{}?expand=keys,contracts", address.to_hex());
        let dto: AccountDto = self
            .with_failover("get account", |base| {
                let path = path.clone();
                async move { self.get_json(join(&base, &path)?).await }
            })
            .await?;
        dto.try_into()
    }

    async fn get_latest_block_header(&self, sealed: bool) -> BlockchainResult<BlockHeader> {
        let path = if sealed { "v1/blocks?height=sealed" } else { "v1/blocks?height=final" };
        let blocks: Vec<BlockDto> = self
            .with_failover("get latest block", |base| async move {
                self.get_json(join(&base, path)?).await
            })
            .await?;
        blocks
            .into_iter()
            .next()
            .ok_or_else(|| BlockchainError::Decode("node returned no blocks".to_string()))?
            .header
            .try_into()
    }

    async fn send_transaction(&self, tx: &Transaction) -> BlockchainResult<Identifier> {
        let body = TransactionRequestDto::try_from(tx)?;
        let response: TransactionResponseDto = self
            .with_failover("send transaction", |base| {
                let body = &body;
                async move { self.post_json(join(&base, "v1/transactions")?, body).await }
            })
            .await?;

        let id: Identifier = response.id.parse()?;
        metrics::record_transaction_submitted();
        tracing::info!(tx_id = %id, "Transaction submitted");
        Ok(id)
    }

    async fn execute_script_at_latest_block(
        &self,
        script: &[u8],
        arguments: &[CadenceValue],
    ) -> BlockchainResult<CadenceValue> {
        let body = ScriptRequestDto {
            script: BASE64.encode(script),
            arguments: arguments.iter().map(|a| BASE64.encode(a.to_argument_bytes())).collect(),
        };
        let encoded: String = self
            .with_failover("execute script", |base| {
                let body = &body;
                async move { self.post_json(join(&base, "v1/scripts?block_height=sealed")?, body).await }
            })
            .await?;

        metrics::record_script_executed();
        let raw = decode_base64("script result", &encoded)?;
        CadenceValue::from_slice(&raw)
    }
}

impl std::fmt::Debug for HttpAccessClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpAccessClient")
            .field("network", &self.config.name)
            .field("access_url", &self.config.access_url)
            .field("timeout_secs", &self.config.rpc_timeout_secs)
            .finish()
    }
}

fn parse_endpoint(raw: &str) -> Result<Url, url::ParseError> {
    // A trailing slash keeps `join` from dropping the last path segment.
    if raw.ends_with('/') {
        Url::parse(raw)
    } else {
        Url::parse(&format!("{}/", raw))
    }
}

fn join(base: &Url, path: &str) -> BlockchainResult<Url> {
    base.join(path)
        .map_err(|e| BlockchainError::Rpc(format!("Invalid request path '{}': {}", path, e)))
}

async fn decode_response<T: DeserializeOwned>(response: reqwest::Response) -> BlockchainResult<T> {
    let status = response.status();
    if status.is_success() {
        return response
            .json()
            .await
            .map_err(|e| BlockchainError::Decode(format!("invalid response body: {}", e)));
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorDto>(&body)
        .map(|e| e.message)
        .unwrap_or(body);

    if status == reqwest::StatusCode::NOT_FOUND {
        Err(BlockchainError::NotFound(message))
    } else if status.is_client_error() {
        Err(BlockchainError::Rejected {
            status: status.as_u16(),
            message,
        })
    } else {
        Err(BlockchainError::Rpc(format!("{}: {}", status, message)))
    }
}

fn parse_u64(field: &str, raw: &str) -> BlockchainResult<u64> {
    if raw.is_empty() {
        return Ok(0);
    }
    raw.parse()
        .map_err(|_| BlockchainError::Decode(format!("invalid {} '{}'", field, raw)))
}

fn parse_u32(field: &str, raw: &str) -> BlockchainResult<u32> {
    u32::try_from(parse_u64(field, raw)?)
        .map_err(|_| BlockchainError::Decode(format!("{} out of range '{}'", field, raw)))
}

fn decode_base64(field: &str, raw: &str) -> BlockchainResult<Vec<u8>> {
    BASE64
        .decode(raw.trim())
        .map_err(|e| BlockchainError::Decode(format!("invalid base64 in {}: {}", field, e)))
}

// REST wire types. Integers travel as decimal strings.

#[derive(Debug, Deserialize)]
struct ErrorDto {
    message: String,
}

#[derive(Debug, Deserialize)]
struct AccountDto {
    address: String,
    #[serde(default)]
    balance: String,
    #[serde(default)]
    keys: Vec<AccountKeyDto>,
    #[serde(default)]
    contracts: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct AccountKeyDto {
    index: String,
    public_key: String,
    signing_algorithm: String,
    hashing_algorithm: String,
    sequence_number: String,
    weight: String,
    #[serde(default)]
    revoked: bool,
}

impl TryFrom<AccountDto> for Account {
    type Error = BlockchainError;

    fn try_from(dto: AccountDto) -> BlockchainResult<Self> {
        let keys = dto
            .keys
            .into_iter()
            .map(|k| {
                Ok(AccountKey {
                    index: parse_u32("key index", &k.index)?,
                    public_key: k.public_key.trim_start_matches("0x").to_string(),
                    sig_algo: k.signing_algorithm.parse()?,
                    hash_algo: k.hashing_algorithm.parse()?,
                    sequence_number: parse_u64("sequence number", &k.sequence_number)?,
                    weight: parse_u32("key weight", &k.weight)?,
                    revoked: k.revoked,
                })
            })
            .collect::<BlockchainResult<Vec<_>>>()?;

        let contracts = dto
            .contracts
            .into_iter()
            .map(|(name, code)| {
                let code = decode_base64("contract code", &code)?;
                Ok((name, String::from_utf8_lossy(&code).into_owned()))
            })
            .collect::<BlockchainResult<BTreeMap<_, _>>>()?;

        Ok(Account {
            address: dto.address.parse()?,
            balance: parse_u64("balance", &dto.balance)?,
            keys,
            contracts,
        })
    }
}

#[derive(Debug, Deserialize)]
struct BlockDto {
    header: BlockHeaderDto,
}

#[derive(Debug, Deserialize)]
struct BlockHeaderDto {
    id: String,
    parent_id: String,
    height: String,
}

impl TryFrom<BlockHeaderDto> for BlockHeader {
    type Error = BlockchainError;

    fn try_from(dto: BlockHeaderDto) -> BlockchainResult<Self> {
        Ok(BlockHeader {
            id: dto.id.parse()?,
            parent_id: dto.parent_id.parse()?,
            height: parse_u64("height", &dto.height)?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct TransactionResultDto {
    #[serde(default)]
    block_id: String,
    status: String,
    #[serde(default)]
    status_code: u32,
    #[serde(default)]
    error_message: String,
    #[serde(default)]
    computation_used: String,
    #[serde(default)]
    events: Vec<EventDto>,
}

#[derive(Debug, Deserialize)]
struct EventDto {
    #[serde(rename = "type")]
    event_type: String,
    transaction_id: String,
    transaction_index: String,
    event_index: String,
    payload: String,
}

impl TryFrom<TransactionResultDto> for TransactionResult {
    type Error = BlockchainError;

    fn try_from(dto: TransactionResultDto) -> BlockchainResult<Self> {
        let events = dto
            .events
            .into_iter()
            .map(|e| {
                let payload = decode_base64("event payload", &e.payload)?;
                Ok(Event {
                    event_type: e.event_type,
                    transaction_id: e.transaction_id.parse()?,
                    transaction_index: parse_u32("transaction index", &e.transaction_index)?,
                    event_index: parse_u32("event index", &e.event_index)?,
                    payload: serde_json::from_slice(&payload)
                        .map_err(|err| BlockchainError::Decode(format!("invalid event payload: {}", err)))?,
                })
            })
            .collect::<BlockchainResult<Vec<_>>>()?;

        let block_id = if dto.block_id.is_empty() || dto.block_id.chars().all(|c| c == '0') {
            None
        } else {
            Some(dto.block_id.parse()?)
        };

        Ok(TransactionResult {
            status: dto.status.parse()?,
            status_code: dto.status_code,
            error: Some(dto.error_message).filter(|m| !m.is_empty()),
            events,
            block_id,
            computation_used: parse_u64("computation used", &dto.computation_used)?,
        })
    }
}

#[derive(Debug, Serialize)]
struct ProposalKeyDto {
    address: String,
    key_index: String,
    sequence_number: String,
}

#[derive(Debug, Serialize)]
struct SignatureDto {
    address: String,
    key_index: String,
    signature: String,
}

impl From<&TransactionSignature> for SignatureDto {
    fn from(sig: &TransactionSignature) -> Self {
        Self {
            address: sig.address.to_hex(),
            key_index: sig.key_index.to_string(),
            signature: BASE64.encode(&sig.signature),
        }
    }
}

#[derive(Debug, Serialize)]
struct TransactionRequestDto {
    script: String,
    arguments: Vec<String>,
    reference_block_id: String,
    gas_limit: String,
    payer: String,
    proposal_key: ProposalKeyDto,
    authorizers: Vec<String>,
    payload_signatures: Vec<SignatureDto>,
    envelope_signatures: Vec<SignatureDto>,
}

impl TryFrom<&Transaction> for TransactionRequestDto {
    type Error = BlockchainError;

    fn try_from(tx: &Transaction) -> BlockchainResult<Self> {
        let proposal = tx
            .proposal_key
            .ok_or_else(|| BlockchainError::IncompleteTransaction("missing proposal key".to_string()))?;
        let payer = tx
            .payer
            .ok_or_else(|| BlockchainError::IncompleteTransaction("missing payer".to_string()))?;
        if tx.envelope_signatures.is_empty() {
            return Err(BlockchainError::IncompleteTransaction("envelope is not signed".to_string()));
        }

        Ok(Self {
            script: BASE64.encode(&tx.script),
            arguments: tx.arguments.iter().map(|a| BASE64.encode(a.to_argument_bytes())).collect(),
            reference_block_id: tx.reference_block_id.to_hex(),
            gas_limit: tx.gas_limit.to_string(),
            payer: payer.to_hex(),
            proposal_key: ProposalKeyDto {
                address: proposal.address.to_hex(),
                key_index: proposal.key_index.to_string(),
                sequence_number: proposal.sequence_number.to_string(),
            },
            authorizers: tx.authorizers.iter().map(Address::to_hex).collect(),
            payload_signatures: tx.payload_signatures.iter().map(SignatureDto::from).collect(),
            envelope_signatures: tx.envelope_signatures.iter().map(SignatureDto::from).collect(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct TransactionResponseDto {
    id: String,
}

#[derive(Debug, Serialize)]
struct ScriptRequestDto {
    script: String,
    arguments: Vec<String>,
}
