//! Error taxonomy for the install pipeline
//!
//! Every variant is fatal: the orchestrator aborts the run on the first error
//! and the message is shown to the user as-is.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InstallError {
    #[error("unsupported platform: {os} (supported: Darwin, Linux)")]
    UnsupportedPlatform { os: String },

    #[error("unsupported architecture: {arch} (supported: x86_64, arm64/aarch64)")]
    UnsupportedArchitecture { arch: String },

    #[error("could not resolve the latest release tag from {url}")]
    TagResolutionFailed { url: String },

    #[error("release lookup failed for {url}: {status}")]
    ReleaseLookupFailed { url: String, status: String },

    #[error("malformed release listing from {url}: {reason}")]
    MalformedResponse { url: String, reason: String },

    #[error("no release asset matching '{filter}' found for target {triple}")]
    AssetNotFound { filter: String, triple: String },

    #[error("download failed for {url}: {status}")]
    DownloadFailed { url: String, status: String },

    #[error("failed to extract {}: {reason}", path.display())]
    ExtractionFailed { path: PathBuf, reason: String },

    #[error("no executable named '{name}' found in {}", dir.display())]
    BinaryNotFound { name: String, dir: PathBuf },

    #[error("install failed at {}", path.display())]
    InstallIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("request to {url} failed")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid configuration: {reason}")]
    Config { reason: String },
}

impl InstallError {
    pub(crate) fn install_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::InstallIo {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn extraction(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::ExtractionFailed {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, InstallError>;
