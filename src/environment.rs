//! PATH inspection for post-install guidance
//!
//! Read-only: shell configuration is never edited, the user is only told
//! what to add.

use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};

/// Whether the install directory is reachable through PATH
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathStatus {
    Configured { install_dir: PathBuf },
    Missing { install_dir: PathBuf },
}

impl PathStatus {
    /// Check the current process's PATH
    pub fn check(install_dir: &Path) -> Self {
        Self::check_in(install_dir, std::env::var_os("PATH").as_deref())
    }

    /// Check against an explicit PATH value
    pub fn check_in(install_dir: &Path, path_var: Option<&OsStr>) -> Self {
        let install_dir = install_dir.to_path_buf();
        let canonical = install_dir.canonicalize().ok();

        let present = path_var
            .map(|paths| {
                std::env::split_paths(paths).any(|entry| {
                    // Relative entries depend on the caller's cwd; only absolute ones count.
                    entry == install_dir
                        || (canonical.is_some()
                            && entry.is_absolute()
                            && entry.canonicalize().ok() == canonical)
                })
            })
            .unwrap_or(false);

        if present {
            Self::Configured { install_dir }
        } else {
            Self::Missing { install_dir }
        }
    }

    pub fn is_configured(&self) -> bool {
        matches!(self, Self::Configured { .. })
    }

    /// The shell line that puts the directory on PATH
    pub fn export_line(install_dir: &Path) -> String {
        format!("export PATH=\"{}:$PATH\"", install_dir.display())
    }
}

impl fmt::Display for PathStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configured { install_dir } => {
                write!(f, "{} is already on your PATH.", install_dir.display())
            }
            Self::Missing { install_dir } => {
                writeln!(
                    f,
                    "{} is not on your PATH. Add it to your shell profile:",
                    install_dir.display()
                )?;
                write!(f, "  {}", Self::export_line(install_dir))
            }
        }
    }
}
