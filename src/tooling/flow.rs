//! The operations a project runs against a Flow network.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::blockchain::cadence::CadenceValue;
use crate::blockchain::client::{AccessApi, HttpAccessClient};
use crate::blockchain::seal::{SealPolicy, SealWaiter};
use crate::blockchain::transaction::Transaction;
use crate::blockchain::types::{Account, Address, Event, Identifier, TransactionResult};
use crate::blockchain::wallet::{AccountRecord, InMemorySigner};
use crate::config::accounts::Wallet;
use crate::config::loader::{load_flow_json, load_wallet, resolve_path, ConfigError};
use crate::config::schema::ToolingConfig;
use crate::tooling::error::{ToolingError, ToolingResult};
use crate::tooling::paths::{read_code, CodeKind};
use crate::tooling::templates;

/// An account ready to sign: its on-chain key and a matching signer.
struct ResolvedSigner {
    address: Address,
    key_index: u32,
    sequence_number: u64,
    signer: InMemorySigner,
}

/// Convenience layer over an access node, a service account and a wallet
/// of named accounts.
pub struct FlowTooling {
    config: ToolingConfig,
    client: Arc<dyn AccessApi>,
    service: Option<AccountRecord>,
    wallet: Wallet,
    cancel: CancellationToken,
}

impl FlowTooling {
    /// Create a facade with no service account and an empty wallet.
    pub fn new(config: ToolingConfig, client: Arc<dyn AccessApi>) -> Self {
        let wallet = Wallet {
            source: resolve_path(&config.project.root, &config.project.wallet_json),
            ..Wallet::default()
        };
        Self {
            config,
            client,
            service: None,
            wallet,
            cancel: CancellationToken::new(),
        }
    }

    /// Connect to the configured network and read the project's account files.
    ///
    /// Missing account files are tolerated here; operations that need an
    /// account report it when they run.
    pub fn connect(config: ToolingConfig) -> ToolingResult<Self> {
        let client = HttpAccessClient::new(&config.network)?;
        tracing::info!(
            network = %config.network.name,
            access_url = %config.network.access_url,
            "Using access node"
        );

        let flow_json = resolve_path(&config.project.root, &config.project.flow_json);
        let service = if flow_json.exists() {
            load_flow_json(&flow_json)?
                .service_account(&config.project.service_account)
                .cloned()
        } else {
            tracing::debug!(path = %flow_json.display(), "No flow.json found");
            None
        };

        let wallet_json = resolve_path(&config.project.root, &config.project.wallet_json);
        let wallet = if wallet_json.exists() {
            Some(load_wallet(&wallet_json)?)
        } else {
            tracing::debug!(path = %wallet_json.display(), "No wallet.json found");
            None
        };

        let mut tooling = Self::new(config, Arc::new(client));
        tooling.service = service;
        if let Some(wallet) = wallet {
            tooling.wallet = wallet;
        }
        Ok(tooling)
    }

    pub fn with_service_account(mut self, service: AccountRecord) -> Self {
        self.service = Some(service);
        self
    }

    pub fn with_wallet(mut self, wallet: Wallet) -> Self {
        self.wallet = wallet;
        self
    }

    /// Abort seal waits once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn config(&self) -> &ToolingConfig {
        &self.config
    }

    pub fn wallet(&self) -> &Wallet {
        &self.wallet
    }

    pub fn client(&self) -> &Arc<dyn AccessApi> {
        &self.client
    }

    fn root(&self) -> &std::path::Path {
        &self.config.project.root
    }

    fn service(&self) -> ToolingResult<&AccountRecord> {
        self.service.as_ref().ok_or_else(|| {
            ToolingError::Config(ConfigError::UnknownAccount {
                name: self.config.project.service_account.clone(),
                path: self.flow_json_path(),
            })
        })
    }

    fn flow_json_path(&self) -> PathBuf {
        resolve_path(self.root(), &self.config.project.flow_json)
    }

    fn seal_waiter(&self) -> SealWaiter {
        SealWaiter::new(SealPolicy::from(&self.config.seal)).with_cancellation(self.cancel.clone())
    }

    /// Create the wallet account `name` with no contracts.
    pub async fn create_account(&self, name: &str) -> ToolingResult<Address> {
        let address = self.apply(name, BTreeMap::new()).await?;
        tracing::info!(account = name, address = %address, "Account created");
        Ok(address)
    }

    /// Create the wallet account `name` with the contract of the same name
    /// from `contracts/<name>.cdc` deployed to it.
    pub async fn deploy_contract(&self, name: &str) -> ToolingResult<Address> {
        let code = read_code(self.root(), CodeKind::Contract, name)?;
        let mut contracts = BTreeMap::new();
        contracts.insert(name.to_string(), code);

        let address = self.apply(name, contracts).await?;
        tracing::info!(contract = name, address = %address, "Contract deployed");
        Ok(address)
    }

    /// Run the account creation template paid for by the service account
    /// and check that the chain agrees with the wallet about the address.
    async fn apply(&self, name: &str, contracts: BTreeMap<String, Vec<u8>>) -> ToolingResult<Address> {
        let user = self.wallet.get(name)?;
        let expected = user.address()?;
        let user_signer = user.signer()?;

        let service = self.resolve_signer(self.service()?).await?;
        let arguments = templates::create_account_arguments(
            &user_signer.public_key_hex(),
            user.sig_algorithm()?,
            user.hash_algorithm()?,
            &contracts,
        );

        let tx = self
            .new_transaction(templates::CREATE_ACCOUNT.as_bytes().to_vec(), arguments, &service)
            .await?
            .with_authorizer(service.address);
        let tx = self.sign(tx, std::slice::from_ref(&service))?;
        let result = self.submit_and_wait(&tx).await?;

        let created = result
            .events_of(Event::ACCOUNT_CREATED)
            .filter_map(Event::created_address)
            .last();
        match created {
            Some(actual) if actual == expected => Ok(actual),
            other => Err(ToolingError::AddressMismatch {
                name: name.to_string(),
                expected,
                actual: other.map(|a| a.to_string()).unwrap_or_else(|| "no account".to_string()),
            }),
        }
    }

    /// Send `transactions/<filename>.cdc` signed by the named wallet accounts.
    ///
    /// The first signer proposes and pays; every signer authorizes.
    pub async fn send_transaction(
        &self,
        filename: &str,
        signers: &[&str],
        arguments: Vec<CadenceValue>,
    ) -> ToolingResult<TransactionResult> {
        if signers.is_empty() {
            return Err(ToolingError::NoSigners);
        }
        let code = read_code(self.root(), CodeKind::Transaction, filename)?;

        let mut resolved = Vec::with_capacity(signers.len());
        for name in signers {
            resolved.push(self.resolve_signer(self.wallet.get(name)?).await?);
        }

        let mut tx = self.new_transaction(code, arguments, &resolved[0]).await?;
        for signer in &resolved {
            tx = tx.with_authorizer(signer.address);
        }
        let tx = self.sign(tx, &resolved)?;
        let result = self.submit_and_wait(&tx).await?;

        tracing::info!(
            transaction = filename,
            signer = signers[0],
            address = %resolved[0].address,
            "Transaction successfully applied"
        );
        Ok(result)
    }

    /// Execute `scripts/<filename>.cdc` against the latest sealed block.
    pub async fn run_script(&self, filename: &str, arguments: Vec<CadenceValue>) -> ToolingResult<CadenceValue> {
        let code = read_code(self.root(), CodeKind::Script, filename)?;
        tracing::debug!(script = filename, arguments = arguments.len(), "Executing script");

        let value = self.client.execute_script_at_latest_block(&code, &arguments).await?;
        tracing::info!(script = filename, result = %value, "Script executed");
        Ok(value)
    }

    /// Fetch the on-chain view of the wallet account `name`.
    pub async fn get_account(&self, name: &str) -> ToolingResult<Account> {
        let address = self.find_address(name)?;
        Ok(self.client.get_account(&address).await?)
    }

    /// Address of the wallet account `name`.
    pub fn find_address(&self, name: &str) -> ToolingResult<Address> {
        Ok(self.wallet.get(name)?.address()?)
    }

    /// Wait for `tx_id` to seal. A sealed transaction whose execution
    /// failed is reported as [`ToolingError::Execution`].
    pub async fn wait_for_seal(&self, tx_id: &Identifier) -> ToolingResult<TransactionResult> {
        let result = self.seal_waiter().wait(self.client.as_ref(), tx_id).await?;
        match result.error {
            Some(ref message) => Err(ToolingError::Execution {
                tx_id: *tx_id,
                message: message.clone(),
            }),
            None => Ok(result),
        }
    }

    async fn resolve_signer(&self, record: &AccountRecord) -> ToolingResult<ResolvedSigner> {
        let address = record.address()?;
        let signer = record.signer()?;
        let account = self.client.get_account(&address).await?;
        let key = account
            .signing_key(&signer.public_key_hex())
            .ok_or(ToolingError::NoUsableKey(address))?;

        // Sign with the hash the key was registered with on chain.
        let signer = signer.with_hash_algorithm(key.hash_algo);
        Ok(ResolvedSigner {
            address,
            key_index: key.index,
            sequence_number: key.sequence_number,
            signer,
        })
    }

    async fn new_transaction(
        &self,
        script: Vec<u8>,
        arguments: Vec<CadenceValue>,
        proposer: &ResolvedSigner,
    ) -> ToolingResult<Transaction> {
        let block = self.client.get_latest_block_header(true).await?;
        Ok(Transaction::new()
            .with_script(script)
            .with_arguments(arguments)
            .with_reference_block(block.id)
            .with_gas_limit(self.config.transaction.gas_limit)
            .with_proposal_key(proposer.address, proposer.key_index, proposer.sequence_number)
            .with_payer(proposer.address))
    }

    /// Payload signatures from everyone except the payer, then the payer's
    /// envelope signature. The payer is `signers[0]`.
    fn sign(&self, mut tx: Transaction, signers: &[ResolvedSigner]) -> ToolingResult<Transaction> {
        let (payer, others) = signers.split_first().ok_or(ToolingError::NoSigners)?;
        for signer in others.iter().filter(|s| s.address != payer.address) {
            tx.sign_payload(signer.address, signer.key_index, &signer.signer)?;
        }
        tx.sign_envelope(payer.address, payer.key_index, &payer.signer)?;
        Ok(tx)
    }

    async fn submit_and_wait(&self, tx: &Transaction) -> ToolingResult<TransactionResult> {
        let tx_id = self.client.send_transaction(tx).await?;
        self.wait_for_seal(&tx_id).await
    }
}

impl std::fmt::Debug for FlowTooling {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowTooling")
            .field("network", &self.config.network.name)
            .field("root", &self.config.project.root)
            .field("has_service_account", &self.service.is_some())
            .field("wallet_accounts", &self.wallet.accounts.len())
            .finish()
    }
}
