//! Configuration schema definitions.
//!
//! This module defines the settings file for the tool. All types derive
//! Serde traits for deserialization from TOML, and every field has a
//! default so an empty file (or no file at all) targets the local emulator.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::loader::ConfigError;

/// Root configuration for the tool.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ToolingConfig {
    /// Which access node to talk to.
    pub network: NetworkConfig,

    /// Transaction defaults.
    pub transaction: TransactionConfig,

    /// Where account files and Cadence sources live.
    pub project: ProjectConfig,

    /// Seal polling policy.
    pub seal: SealConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,
}

/// Well-known networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Emulator,
    Testnet,
    Mainnet,
}

impl Network {
    /// REST endpoint of the public access node for this network.
    pub fn access_url(self) -> &'static str {
        match self {
            Network::Emulator => "http://127.0.0.1:8888",
            Network::Testnet => "https://rest-testnet.onflow.org",
            Network::Mainnet => "https://rest-mainnet.onflow.org",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Network::Emulator => "emulator",
            Network::Testnet => "testnet",
            Network::Mainnet => "mainnet",
        }
    }
}

impl FromStr for Network {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "emulator" | "local" | "localhost" => Ok(Network::Emulator),
            "testnet" => Ok(Network::Testnet),
            "mainnet" => Ok(Network::Mainnet),
            other => Err(ConfigError::UnknownNetwork(other.to_string())),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Access node configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct NetworkConfig {
    /// Network name, used for logging.
    pub name: String,

    /// REST access API base URL.
    pub access_url: String,

    /// Secondary access nodes, tried in order when the primary fails.
    pub failover_urls: Vec<String>,

    /// Per-request timeout in seconds.
    pub rpc_timeout_secs: u64,
}

impl NetworkConfig {
    /// Settings for a well-known network.
    pub fn preset(network: Network) -> Self {
        Self {
            name: network.as_str().to_string(),
            access_url: network.access_url().to_string(),
            failover_urls: Vec::new(),
            rpc_timeout_secs: 10,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::preset(Network::Emulator)
    }
}

/// Transaction defaults.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TransactionConfig {
    /// Computation limit attached to every transaction.
    pub gas_limit: u64,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self { gas_limit: 9999 }
    }
}

/// Project layout.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ProjectConfig {
    /// Directory holding `contracts/`, `transactions/` and `scripts/`.
    pub root: PathBuf,

    /// Path of the file with the service account, relative to `root`
    /// unless absolute or starting with `~/`.
    pub flow_json: PathBuf,

    /// Path of the named accounts file, resolved like `flow_json`.
    pub wallet_json: PathBuf,

    /// Name of the service account inside `flow_json`.
    pub service_account: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            flow_json: PathBuf::from("flow.json"),
            wallet_json: PathBuf::from("wallet.json"),
            service_account: "service".to_string(),
        }
    }
}

/// Seal polling settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SealConfig {
    /// Delay between status checks in milliseconds.
    pub poll_interval_ms: u64,

    /// Overall deadline in seconds; 0 waits forever.
    pub timeout_secs: u64,

    /// Maximum number of status checks; 0 means no cap.
    pub max_attempts: u32,

    /// Back off exponentially instead of polling at a fixed rate.
    pub backoff: bool,

    /// Cap for a single backoff delay in milliseconds.
    pub max_backoff_ms: u64,
}

impl Default for SealConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            timeout_secs: 300,
            max_attempts: 0,
            backoff: false,
            max_backoff_ms: 30_000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON lines instead of human-readable logs.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}
