//! Print the keys and contracts of an on-chain account.

use std::process::ExitCode;

use clap::Parser;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, ContentArrangement, Table};

use flow_tooling::blockchain::{AccessApi, Account, Address, HttpAccessClient};
use flow_tooling::config::{Network, NetworkConfig};
use flow_tooling::config::schema::ObservabilityConfig;
use flow_tooling::observability::logging;

#[derive(Parser)]
#[command(name = "flow-keyinfo")]
#[command(about = "Show the keys of a Flow account", long_about = None)]
struct Cli {
    /// Account address, with or without 0x
    address: Address,

    /// Network preset (emulator, testnet, mainnet)
    #[arg(short, long, default_value = "emulator")]
    network: Network,

    /// Access node URL, overrides the network preset
    #[arg(long)]
    access_url: Option<String>,
}

fn key_table(account: &Account) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            ["Key", "Weight", "SigAlgo", "HashAlgo", "Revoked", "PublicKey"]
                .into_iter()
                .map(|h| Cell::new(h).add_attribute(Attribute::Bold)),
        );

    for key in &account.keys {
        table.add_row(vec![
            Cell::new(key.index),
            Cell::new(key.weight),
            Cell::new(key.sig_algo),
            Cell::new(key.hash_algo),
            Cell::new(key.revoked),
            Cell::new(&key.public_key),
        ]);
    }
    table
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(&ObservabilityConfig {
        log_level: "warn".to_string(),
        json_logs: false,
    });

    let mut network = NetworkConfig::preset(cli.network);
    if let Some(url) = cli.access_url {
        network.access_url = url;
    }

    let client = match HttpAccessClient::new(&network) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "Could not create access client");
            return ExitCode::FAILURE;
        }
    };

    let account = match client.get_account(&cli.address).await {
        Ok(account) => account,
        Err(e) => {
            tracing::error!(address = %cli.address, error = %e, "Could not get account");
            return ExitCode::FAILURE;
        }
    };

    println!("Account: {}", account.address);
    println!("Balance: {}", account.balance);
    println!("{}", key_table(&account));

    if account.contracts.is_empty() {
        println!("No code deployed");
    }
    for (name, code) in &account.contracts {
        println!("Contract {}:\n{}", name, code);
    }
    ExitCode::SUCCESS
}
