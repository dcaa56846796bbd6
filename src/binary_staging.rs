//! Locating the extracted executable and installing it
//!
//! The install is an overwrite: the new binary is written next to the
//! destination and renamed over it, so a running copy can be replaced and a
//! failed write never leaves a truncated file behind.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use walkdir::WalkDir;

use crate::download::Extracted;
use crate::error::{InstallError, Result};

/// A binary copied out of the workspace into the install directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledBinary {
    /// Inside the workspace; gone once the run ends
    pub source_path: PathBuf,
    pub destination_path: PathBuf,
}

/// Find a regular, executable file named exactly `expected_name` under `extracted_dir`
///
/// Entries are visited in file-name order, so the first match is deterministic.
pub fn locate_binary(extracted_dir: &Path, expected_name: &str) -> Result<PathBuf> {
    WalkDir::new(extracted_dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!("Skipping unreadable entry: {e}");
                None
            }
        })
        .find(|entry| {
            entry.file_type().is_file()
                && entry.file_name() == expected_name
                && is_executable(entry.path())
        })
        .map(|entry| entry.into_path())
        .ok_or_else(|| InstallError::BinaryNotFound {
            name: expected_name.to_string(),
            dir: extracted_dir.to_path_buf(),
        })
}

/// Locate the binary in an extraction result and install it as `install_dir/expected_name`
pub fn locate_and_install(
    extracted_dir: &Path,
    extracted: &Extracted,
    expected_name: &str,
    install_dir: &Path,
) -> Result<InstalledBinary> {
    let source_path = match extracted {
        Extracted::Tree => locate_binary(extracted_dir, expected_name)?,
        Extracted::Bare(path) => path.clone(),
    };
    info!("Found {}", source_path.display());

    let destination_path = install_binary(&source_path, install_dir, expected_name)?;
    warn_if_shadowed(expected_name, &destination_path);

    Ok(InstalledBinary {
        source_path,
        destination_path,
    })
}

/// Copy `source` to `install_dir/name` with mode 755, replacing any existing file
pub fn install_binary(source: &Path, install_dir: &Path, name: &str) -> Result<PathBuf> {
    fs::create_dir_all(install_dir).map_err(|e| InstallError::install_io(install_dir, e))?;

    let dest_path = install_dir.join(name);
    let mut staged = tempfile::Builder::new()
        .prefix(&format!(".{name}."))
        .tempfile_in(install_dir)
        .map_err(|e| InstallError::install_io(install_dir, e))?;

    let mut input = fs::File::open(source).map_err(|e| InstallError::install_io(source, e))?;
    std::io::copy(&mut input, staged.as_file_mut())
        .and_then(|_| staged.as_file_mut().flush())
        .map_err(|e| InstallError::install_io(staged.path(), e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(staged.path(), fs::Permissions::from_mode(0o755))
            .map_err(|e| InstallError::install_io(staged.path(), e))?;
    }

    staged
        .persist(&dest_path)
        .map_err(|e| InstallError::install_io(&dest_path, e.error))?;

    info!("Installed {} to {}", source.display(), dest_path.display());
    Ok(dest_path)
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path)
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(_path: &Path) -> bool {
    true
}

/// Warn when PATH resolves `name` to something other than what was just installed
fn warn_if_shadowed(name: &str, installed: &Path) {
    let Ok(found) = which::which(name) else {
        return;
    };
    let same = match (found.canonicalize(), installed.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => found == installed,
    };
    if !same {
        warn!(
            "'{name}' on your PATH resolves to {}, which shadows {}",
            found.display(),
            installed.display()
        );
    }
}
