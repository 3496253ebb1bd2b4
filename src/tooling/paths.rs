//! Project layout: where Cadence sources live under the project root.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::tooling::error::{ToolingError, ToolingResult};

/// Kinds of Cadence source files, each with its own directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeKind {
    Contract,
    Transaction,
    Script,
}

impl CodeKind {
    pub fn dir(self) -> &'static str {
        match self {
            CodeKind::Contract => "contracts",
            CodeKind::Transaction => "transactions",
            CodeKind::Script => "scripts",
        }
    }
}

impl fmt::Display for CodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CodeKind::Contract => "contract",
            CodeKind::Transaction => "transaction",
            CodeKind::Script => "script",
        })
    }
}

/// `<root>/<dir>/<name>.cdc`
pub fn code_path(root: &Path, kind: CodeKind, name: &str) -> PathBuf {
    root.join(kind.dir()).join(format!("{}.cdc", name))
}

/// Read the source of `name`.
pub fn read_code(root: &Path, kind: CodeKind, name: &str) -> ToolingResult<Vec<u8>> {
    let path = code_path(root, kind, name);
    std::fs::read(&path).map_err(|source| ToolingError::MissingCode { kind, path, source })
}
