//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::accounts::{FlowJson, Wallet};
use crate::config::schema::ToolingConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(toml::de::Error),
    Json { path: PathBuf, source: serde_json::Error },
    Validation(Vec<ValidationError>),
    UnknownAccount { name: String, path: PathBuf },
    UnknownNetwork(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io { path, source } => write!(f, "Could not read {}: {}", path.display(), source),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Json { path, source } => write!(f, "Could not decode {}: {}", path.display(), source),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
            ConfigError::UnknownAccount { name, path } => {
                write!(f, "No account named '{}' in {}", name, path.display())
            }
            ConfigError::UnknownNetwork(name) => write!(f, "Unknown network '{}'", name),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Json { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

fn read(path: &Path) -> ConfigResult<String> {
    fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> ConfigResult<ToolingConfig> {
    let content = read(path)?;
    let config: ToolingConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Load and validate configuration, falling back to defaults when the
/// file does not exist.
pub fn load_config_or_default(path: &Path) -> ConfigResult<ToolingConfig> {
    if path.exists() {
        load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "No config file, using defaults");
        Ok(ToolingConfig::default())
    }
}

/// Read a `flow.json` style file.
pub fn load_flow_json(path: &Path) -> ConfigResult<FlowJson> {
    let content = read(path)?;
    serde_json::from_str(&content).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Read a `wallet.json` file.
pub fn load_wallet(path: &Path) -> ConfigResult<Wallet> {
    let content = read(path)?;
    let mut wallet: Wallet = serde_json::from_str(&content).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    wallet.source = path.to_path_buf();
    Ok(wallet)
}

/// Resolve `path` against the project root.
///
/// Absolute paths are kept, and a leading `~/` expands to the home directory.
pub fn resolve_path(root: &Path, path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_config() {
        let file = write_temp(
            r#"
            [network]
            name = "testnet"
            access_url = "https://rest-testnet.onflow.org"

            [transaction]
            gas_limit = 1000
            "#,
        );
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.network.name, "testnet");
        assert_eq!(config.transaction.gas_limit, 1000);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let file = write_temp(
            r#"
            [transaction]
            gas_limit = 0
            "#,
        );
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("gas_limit"));
    }

    #[test]
    fn test_missing_config_falls_back() {
        let config = load_config_or_default(Path::new("/definitely/not/here.toml")).unwrap();
        assert_eq!(config, ToolingConfig::default());
    }

    #[test]
    fn test_missing_flow_json() {
        let err = load_flow_json(Path::new("/definitely/not/flow.json")).unwrap_err();
        assert!(err.to_string().contains("Could not read"));
    }

    #[test]
    fn test_bad_wallet_json() {
        let file = write_temp("{ not json");
        let err = load_wallet(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Json { .. }));
    }

    #[test]
    fn test_load_wallet_remembers_source() {
        let file = write_temp(
            r#"{ "accounts": { "nft": { "address": "01cf0e2f2f715450", "privateKey": "aa" } } }"#,
        );
        let wallet = load_wallet(file.path()).unwrap();
        assert_eq!(wallet.source, file.path());
        assert!(wallet.get("nft").is_ok());
    }

    #[test]
    fn test_resolve_path() {
        let root = Path::new("/work/project");
        assert_eq!(resolve_path(root, Path::new("flow.json")), PathBuf::from("/work/project/flow.json"));
        assert_eq!(resolve_path(root, Path::new("/etc/flow.json")), PathBuf::from("/etc/flow.json"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(resolve_path(root, Path::new("~/.flow-dev.json")), home.join(".flow-dev.json"));
        }
    }
}
