//! Flow tooling command line
//!
//! Creates accounts, deploys contracts, sends transactions and runs
//! scripts for a project laid out as
//!
//! ```text
//! <root>/
//! ├── flow.json          service account
//! ├── wallet.json        named project accounts
//! ├── contracts/<name>.cdc
//! ├── transactions/<name>.cdc
//! └── scripts/<name>.cdc
//! ```
//!
//! Every command that submits a transaction waits for it to be sealed.
//! Ctrl+C stops the wait.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use flow_tooling::blockchain::{CadenceValue, Identifier};
use flow_tooling::config::loader::load_config_or_default;
use flow_tooling::config::{Network, NetworkConfig, ToolingConfig};
use flow_tooling::observability::logging;
use flow_tooling::tooling::{FlowTooling, ToolingResult};

#[derive(Parser)]
#[command(name = "flow-tooling")]
#[command(about = "Convenience commands for Flow projects", long_about = None)]
struct Cli {
    /// Settings file; defaults apply when it does not exist
    #[arg(short, long, env = "FLOW_TOOLING_CONFIG", default_value = "flow-tooling.toml")]
    config: PathBuf,

    /// Network preset (emulator, testnet, mainnet). Naming the network the
    /// settings file already configures keeps its endpoints; another network
    /// switches to the preset access URL without failover URLs.
    #[arg(short, long)]
    network: Option<Network>,

    /// Project root holding flow.json, wallet.json and the Cadence sources
    #[arg(long)]
    root: Option<PathBuf>,

    /// Log JSON lines instead of human-readable output
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the wallet account with this name
    CreateAccount { name: String },
    /// Create the wallet account with this name and deploy contracts/<name>.cdc to it
    Deploy { name: String },
    /// Send transactions/<file>.cdc
    Send {
        file: String,
        /// Wallet account signing the transaction; the first one pays
        #[arg(short, long = "signer", required = true)]
        signers: Vec<String>,
        /// Argument as Type:value, e.g. UInt64:42
        #[arg(short, long = "arg")]
        args: Vec<CadenceValue>,
    },
    /// Run scripts/<file>.cdc and print the result
    Script {
        file: String,
        #[arg(short, long = "arg")]
        args: Vec<CadenceValue>,
    },
    /// Wait until a submitted transaction is sealed
    Wait { tx_id: Identifier },
    /// Show the on-chain account of a wallet entry
    Account { name: String },
    /// Print the address of a wallet entry
    Address { name: String },
}

fn apply_overrides(cli: &Cli, config: &mut ToolingConfig) {
    if let Some(network) = cli.network {
        if config.network.name != network.as_str() {
            let timeout = config.network.rpc_timeout_secs;
            config.network = NetworkConfig::preset(network);
            config.network.rpc_timeout_secs = timeout;
        }
    }
    if let Some(root) = &cli.root {
        config.project.root = root.clone();
    }
    if cli.json_logs {
        config.observability.json_logs = true;
    }
}

async fn run(command: Commands, config: ToolingConfig, cancel: CancellationToken) -> ToolingResult<()> {
    let flow = FlowTooling::connect(config)?.with_cancellation(cancel);

    match command {
        Commands::CreateAccount { name } => {
            let address = flow.create_account(&name).await?;
            println!("{}", address);
        }
        Commands::Deploy { name } => {
            let address = flow.deploy_contract(&name).await?;
            println!("{}", address);
        }
        Commands::Send { file, signers, args } => {
            let signers: Vec<&str> = signers.iter().map(String::as_str).collect();
            let result = flow.send_transaction(&file, &signers, args).await?;
            for event in &result.events {
                println!("{} {}", event.event_type, event.payload);
            }
        }
        Commands::Script { file, args } => {
            let value = flow.run_script(&file, args).await?;
            println!("{}", value);
        }
        Commands::Wait { tx_id } => {
            let result = flow.wait_for_seal(&tx_id).await?;
            println!("{:?} ({} events)", result.status, result.events.len());
        }
        Commands::Account { name } => {
            let account = flow.get_account(&name).await?;
            println!("Address: {}", account.address);
            println!("Balance: {}", account.balance);
            println!("Keys: {}", account.keys.len());
            for contract in account.contracts.keys() {
                println!("Contract: {}", contract);
            }
        }
        Commands::Address { name } => {
            println!("{}", flow.find_address(&name)?);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = load_config_or_default(&cli.config);
    let mut config = match &loaded {
        Ok(config) => config.clone(),
        Err(_) => ToolingConfig::default(),
    };
    apply_overrides(&cli, &mut config);
    logging::init(&config.observability);

    if let Err(e) = loaded {
        tracing::error!(path = %cli.config.display(), error = %e, "Failed to load configuration");
        return ExitCode::FAILURE;
    }

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping");
            on_signal.cancel();
        }
    });

    match run(cli.command, config, cancel).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            ExitCode::FAILURE
        }
    }
}
