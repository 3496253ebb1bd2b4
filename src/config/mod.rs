//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! flow-tooling.toml (optional)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ToolingConfig (validated, immutable)
//!
//! flow.json, wallet.json
//!     → loader.rs (read, decode)
//!     → accounts.rs (named AccountRecords)
//! ```
//!
//! # Design Decisions
//! - Config is read once per process and passed by reference
//! - All fields have defaults; no file means the local emulator
//! - Validation separates syntactic (serde) from semantic checks

pub mod accounts;
pub mod loader;
pub mod schema;
pub mod validation;

pub use accounts::{FlowJson, Wallet};
pub use loader::{ConfigError, ConfigResult};
pub use schema::{Network, NetworkConfig, SealConfig, ToolingConfig};
