//! Resilience helpers.
//!
//! # Data Flow
//! ```text
//! Seal waiter, after a non-terminal status:
//!     → backoff.rs (next delay, when backoff is enabled)
//!     → fixed poll interval otherwise
//! ```
//!
//! # Design Decisions
//! - Transport errors are never retried here; they surface to the caller
//! - Access node failover lives in the client, not in this module

pub mod backoff;

pub use backoff::backoff_delay;
