//! Project-level operations.
//!
//! # Data Flow
//! ```text
//! account name / file name + arguments
//!     → paths.rs (read <root>/<kind>/<name>.cdc)
//!     → flow.rs (resolve signers, build, sign, submit)
//!     → blockchain::seal (wait until sealed)
//!     → sealed result, or ToolingError::Execution when it failed
//! ```

pub mod error;
pub mod flow;
pub mod paths;
pub mod templates;

pub use error::{ToolingError, ToolingResult};
pub use flow::FlowTooling;
pub use paths::CodeKind;
