//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! blockchain client, seal waiter, tooling facade produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, histograms via the metrics facade)
//!
//! Consumers:
//!     → stderr (pretty or JSON lines)
//!     → whichever metrics recorder the embedding process installs
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - The library never installs a metrics recorder; without one, updates are no-ops

pub mod logging;
pub mod metrics;
