//! Flow blockchain tooling library

pub mod blockchain;
pub mod config;
pub mod observability;
pub mod resilience;
pub mod tooling;

pub use blockchain::{SealPolicy, SealWaiter};
pub use config::schema::ToolingConfig;
pub use tooling::FlowTooling;
