//! Installer for pre-built `oracle` binaries
//!
//! Detects the running platform, resolves the matching release asset on
//! GitHub, downloads and unpacks it in a temporary workspace, and installs
//! the executable into a user-local bin directory.

pub mod binary_staging;
pub mod config;
pub mod download;
pub mod environment;
pub mod error;
pub mod orchestration;

pub use config::{InstallConfig, Strategy};
pub use error::InstallError;
pub use orchestration::{InstallReport, Workspace, run};
