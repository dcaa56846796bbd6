//! Archive extraction, dispatched on the declared asset name
//!
//! Handles `.tar.gz`/`.tgz`, `.zip`, and bare executables published without
//! an archive wrapper. Extraction is synchronous; the pipeline has nothing
//! else to do while it runs.

use std::fs::File;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use log::{debug, info};
use tar::Archive;
use zip::ZipArchive;

use crate::error::{InstallError, Result};

/// Archive format chosen from the asset name suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    TarGz,
    Zip,
    /// Not an archive: the file is the executable itself
    Bare,
}

impl ArchiveKind {
    pub fn from_name(declared_name: &str) -> Self {
        let name = declared_name.to_ascii_lowercase();
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Self::TarGz
        } else if name.ends_with(".zip") {
            Self::Zip
        } else {
            Self::Bare
        }
    }
}

/// What extraction left behind in the output directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted {
    /// An unpacked archive tree to search
    Tree,
    /// The payload copied verbatim
    Bare(PathBuf),
}

pub fn extract(file_path: &Path, declared_name: &str, output_dir: &Path) -> Result<Extracted> {
    let kind = ArchiveKind::from_name(declared_name);
    info!("Extracting {declared_name} ({kind:?})");

    match kind {
        ArchiveKind::TarGz => extract_tar_gz(file_path, output_dir).map(|()| Extracted::Tree),
        ArchiveKind::Zip => extract_zip(file_path, output_dir).map(|()| Extracted::Tree),
        ArchiveKind::Bare => place_bare(file_path, declared_name, output_dir).map(Extracted::Bare),
    }
}

fn extract_tar_gz(file_path: &Path, output_dir: &Path) -> Result<()> {
    let tar_gz = File::open(file_path).map_err(|e| InstallError::extraction(file_path, e))?;
    let mut archive = Archive::new(GzDecoder::new(tar_gz));
    archive.set_preserve_permissions(true);
    archive
        .unpack(output_dir)
        .map_err(|e| InstallError::extraction(file_path, e))?;
    debug!("Unpacked tarball into {}", output_dir.display());
    Ok(())
}

fn extract_zip(file_path: &Path, output_dir: &Path) -> Result<()> {
    let zip_file = File::open(file_path).map_err(|e| InstallError::extraction(file_path, e))?;
    let mut archive = ZipArchive::new(zip_file).map_err(|e| InstallError::extraction(file_path, e))?;
    archive
        .extract(output_dir)
        .map_err(|e| InstallError::extraction(file_path, e))?;
    debug!(
        "Unpacked {} zip entries into {}",
        archive.len(),
        output_dir.display()
    );
    Ok(())
}

fn place_bare(file_path: &Path, declared_name: &str, output_dir: &Path) -> Result<PathBuf> {
    let file_name = Path::new(declared_name)
        .file_name()
        .ok_or_else(|| InstallError::extraction(file_path, "asset name has no file component"))?;
    let dest = output_dir.join(file_name);

    std::fs::copy(file_path, &dest).map_err(|e| InstallError::extraction(file_path, e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&dest, std::fs::Permissions::from_mode(0o755))
            .map_err(|e| InstallError::extraction(&dest, e))?;
    }

    debug!("Treating {declared_name} as a bare executable");
    Ok(dest)
}
