use thiserror::Error;

use crate::graph::CycleError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("API request failed: {0}")]
    Api(#[from] reqwest::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Formula not found: {0}")]
    FormulaNotFound(String),

    #[error("Alias '{alias}' is ambiguous: resolves to both {first} and {second}")]
    AmbiguousAlias {
        alias: String,
        first: String,
        second: String,
    },

    #[error("{0}")]
    DependencyCycle(#[from] CycleError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Error: {0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Recoverable per-package install failures. These never abort a batch:
/// the failed package is reported and dropped, siblings proceed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InstallError {
    #[error("cannot install: {0}")]
    CannotInstall(String),

    #[error("unsatisfied requirements: {0}")]
    UnsatisfiedRequirements(String),

    #[error("download failed: {0}")]
    Download(String),

    #[error("checksum mismatch: {0}")]
    ChecksumMismatch(String),

    #[error("build failed: {0}")]
    Build(String),
}

impl InstallError {
    /// Build failures mark the whole run as failed for exit-code purposes
    /// even though remaining packages are still attempted.
    pub fn is_build_failure(&self) -> bool {
        matches!(self, InstallError::Build(_))
    }
}
