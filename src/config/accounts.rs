//! Account files: `flow.json` and `wallet.json`.
//!
//! Both map account names to [`AccountRecord`]s under a top-level
//! `accounts` key. `flow.json` holds the service account that pays for
//! account creation; `wallet.json` holds the accounts a project creates
//! and signs with.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::blockchain::wallet::AccountRecord;
use crate::config::loader::{ConfigError, ConfigResult};

/// Name newer `flow.json` files use for the emulator service account.
const EMULATOR_ACCOUNT: &str = "emulator-account";

/// Contents of a `flow.json` file. Unknown sections are ignored.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct FlowJson {
    #[serde(default, alias = "Accounts")]
    pub accounts: BTreeMap<String, AccountRecord>,
}

impl FlowJson {
    /// The service account, looked up by `name` with a fallback to the
    /// emulator's default account name.
    pub fn service_account(&self, name: &str) -> Option<&AccountRecord> {
        self.accounts
            .get(name)
            .or_else(|| self.accounts.get(EMULATOR_ACCOUNT))
    }
}

/// Named accounts of a project.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Wallet {
    #[serde(default, alias = "Accounts")]
    pub accounts: BTreeMap<String, AccountRecord>,

    /// File the wallet was read from, for error messages.
    #[serde(skip)]
    pub source: PathBuf,
}

impl Wallet {
    pub fn get(&self, name: &str) -> ConfigResult<&AccountRecord> {
        self.accounts.get(name).ok_or_else(|| ConfigError::UnknownAccount {
            name: name.to_string(),
            path: self.source.clone(),
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.accounts.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_account_lookup() {
        let flow: FlowJson = serde_json::from_str(
            r#"{
                "emulators": { "default": { "port": 3569 } },
                "accounts": {
                    "service": {
                        "address": "f8d6e0586b0a20c7",
                        "privateKey": "aa",
                        "sigAlgorithm": "ECDSA_P256",
                        "hashAlgorithm": "SHA3_256"
                    }
                }
            }"#,
        )
        .unwrap();
        assert_eq!(flow.service_account("service").unwrap().address, "f8d6e0586b0a20c7");
    }

    #[test]
    fn test_emulator_account_fallback() {
        let flow: FlowJson = serde_json::from_str(
            r#"{ "accounts": { "emulator-account": { "address": "f8d6e0586b0a20c7", "key": "bb" } } }"#,
        )
        .unwrap();
        let service = flow.service_account("service").unwrap();
        assert_eq!(service.private_key, "bb");
    }

    #[test]
    fn test_capitalized_accounts_key() {
        let wallet: Wallet = serde_json::from_str(
            r#"{ "Accounts": { "ft": { "address": "01", "privateKey": "aa" } } }"#,
        )
        .unwrap();
        assert_eq!(wallet.names().collect::<Vec<_>>(), vec!["ft"]);
    }

    #[test]
    fn test_unknown_account() {
        let wallet = Wallet {
            source: PathBuf::from("wallet.json"),
            ..Wallet::default()
        };
        let err = wallet.get("nft").unwrap_err();
        assert_eq!(err.to_string(), "No account named 'nft' in wallet.json");
    }
}
