//! Install pipeline: detect → resolve → fetch → extract → install
//!
//! Strictly sequential; the first error aborts the run. The temporary
//! workspace is owned here and removed on drop, whichever way the run ends.

use std::fmt;
use std::path::{Path, PathBuf};

use log::info;
use tempfile::TempDir;

use crate::binary_staging::{self, InstalledBinary};
use crate::config::InstallConfig;
use crate::download::{self, AssetResolver, ReleaseSelector, TargetTriple};
use crate::environment::PathStatus;
use crate::error::{InstallError, Result};

/// Exclusively owned scratch space for one run
#[derive(Debug)]
pub struct Workspace {
    root: TempDir,
    download_dir: PathBuf,
    extract_dir: PathBuf,
}

impl Workspace {
    pub fn create() -> Result<Self> {
        let root = tempfile::Builder::new()
            .prefix("oracle-install-")
            .tempdir()
            .map_err(|e| InstallError::install_io(std::env::temp_dir(), e))?;

        let download_dir = root.path().join("download");
        let extract_dir = root.path().join("extract");
        for dir in [&download_dir, &extract_dir] {
            std::fs::create_dir(dir).map_err(|e| InstallError::install_io(dir, e))?;
        }

        Ok(Self {
            root,
            download_dir,
            extract_dir,
        })
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    pub fn extract_dir(&self) -> &Path {
        &self.extract_dir
    }
}

/// Outcome of a successful run, rendered to stdout by the binary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub binary_name: String,
    pub installed: InstalledBinary,
    pub version: Option<String>,
    pub path_status: PathStatus,
}

impl fmt::Display for InstallReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dest = self.installed.destination_path.display();
        match &self.version {
            Some(version) => writeln!(f, "Installed {} {version} to {dest}", self.binary_name)?,
            None => writeln!(f, "Installed {} to {dest}", self.binary_name)?,
        }
        write!(f, "{}", self.path_status)
    }
}

/// Run the whole pipeline in a fresh workspace
pub async fn run(config: &InstallConfig) -> Result<InstallReport> {
    let workspace = Workspace::create()?;
    info!("Workspace at {}", workspace.path().display());
    run_in(config, &workspace).await
}

/// Run the pipeline inside a caller-owned workspace
pub async fn run_in(config: &InstallConfig, workspace: &Workspace) -> Result<InstallReport> {
    let target = TargetTriple::detect(config.target.as_deref())?;
    info!("Target: {target}");

    let client = download::http_client()?;
    let resolver = AssetResolver::from_config(config, client.clone());
    let selector = ReleaseSelector::from_config(config);
    info!(
        "Resolving {}/{} at {} ({} strategy)",
        selector.owner, selector.repo, selector.tag, config.strategy
    );
    let asset = resolver.resolve(&target, &selector).await?;

    let archive_path = workspace
        .download_dir()
        .join(staging_file_name(&asset.asset_file_name));
    download::fetch(&client, &asset.download_url, &archive_path).await?;

    let extracted = download::extract(
        &archive_path,
        &asset.asset_file_name,
        workspace.extract_dir(),
    )?;

    let installed = binary_staging::locate_and_install(
        workspace.extract_dir(),
        &extracted,
        &config.binary_name,
        &config.install_dir,
    )?;

    Ok(InstallReport {
        binary_name: config.binary_name.clone(),
        installed,
        version: Some(asset.version_label).filter(|v| !v.is_empty()),
        path_status: PathStatus::check(&config.install_dir),
    })
}

/// Asset names come from the network; keep only the final component
fn staging_file_name(asset_file_name: &str) -> &str {
    Path::new(asset_file_name)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("asset")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Strategy;
    use crate::download::extract::tests::write_tar_gz;
    use mockito::Server;

    fn config_for(server_url: &str, install_dir: &Path) -> InstallConfig {
        let mut config = InstallConfig::from_sources(
            |_| None,
            Some(PathBuf::from("/home/tester")),
            None,
        )
        .unwrap();
        config.owner = "acme".to_string();
        config.repo = "oracle".to_string();
        config.install_dir = install_dir.to_path_buf();
        config.target = Some("x86_64-unknown-linux-gnu".to_string());
        config.api_url = server_url.to_string();
        config.web_url = server_url.to_string();
        config
    }

    fn release_tarball(payload: &[u8]) -> Vec<u8> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("release.tar.gz");
        write_tar_gz(&path, &[("oracle-v1.2.3/oracle", 0o755, payload)]);
        std::fs::read(path).unwrap()
    }

    #[test]
    fn staging_name_strips_directories() {
        assert_eq!(staging_file_name("a.tar.gz"), "a.tar.gz");
        assert_eq!(staging_file_name("../../etc/a.tar.gz"), "a.tar.gz");
        assert_eq!(staging_file_name(""), "asset");
    }

    #[test]
    fn workspace_is_removed_on_drop() {
        let workspace = Workspace::create().unwrap();
        let root = workspace.path().to_path_buf();
        assert!(workspace.download_dir().is_dir());
        assert!(workspace.extract_dir().is_dir());
        drop(workspace);
        assert!(!root.exists());
    }

    #[test]
    fn report_mentions_version_and_path_status() {
        let report = InstallReport {
            binary_name: "oracle".to_string(),
            installed: InstalledBinary {
                source_path: PathBuf::from("/tmp/ws/extract/oracle"),
                destination_path: PathBuf::from("/opt/bin/oracle"),
            },
            version: Some("v1.2.3".to_string()),
            path_status: PathStatus::Missing {
                install_dir: PathBuf::from("/opt/bin"),
            },
        };
        let text = report.to_string();
        assert!(text.starts_with("Installed oracle v1.2.3 to /opt/bin/oracle\n"));
        assert!(text.contains("export PATH=\"/opt/bin:$PATH\""));

        let report = InstallReport {
            version: None,
            ..report
        };
        assert!(report.to_string().starts_with("Installed oracle to /opt/bin/oracle\n"));
    }

    #[tokio::test]
    async fn convention_pipeline_installs_binary() {
        let mut server = Server::new_async().await;
        let payload = b"#!/bin/sh\necho oracle\n";
        let _asset = server
            .mock(
                "GET",
                "/acme/oracle/releases/download/v1.2.3/oracle-v1.2.3-x86_64-unknown-linux-gnu.tar.gz",
            )
            .with_status(200)
            .with_body(release_tarball(payload))
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let install_dir = dir.path().join("bin");
        let mut config = config_for(&server.url(), &install_dir);
        config.strategy = Strategy::Convention;
        config.tag = "v1.2.3".to_string();

        let report = run(&config).await.unwrap();
        assert_eq!(report.version.as_deref(), Some("v1.2.3"));
        assert_eq!(report.installed.destination_path, install_dir.join("oracle"));
        assert_eq!(std::fs::read(install_dir.join("oracle")).unwrap(), payload);
    }

    #[tokio::test]
    async fn failure_after_download_still_cleans_workspace() {
        let mut server = Server::new_async().await;
        let release = format!(
            r#"{{"tag_name": "v1.2.3", "assets": [{{"name": "oracle-x86_64-unknown-linux-gnu.tar.gz", "browser_download_url": "{}/dl/oracle.tar.gz"}}]}}"#,
            server.url()
        );
        let _api = server
            .mock("GET", "/repos/acme/oracle/releases/latest")
            .with_status(200)
            .with_body(release)
            .create_async()
            .await;
        let _asset = server
            .mock("GET", "/dl/oracle.tar.gz")
            .with_status(200)
            .with_body("definitely not gzip")
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let config = config_for(&server.url(), &dir.path().join("bin"));

        let workspace = Workspace::create().unwrap();
        let root = workspace.path().to_path_buf();
        let err = run_in(&config, &workspace).await.unwrap_err();
        assert!(matches!(err, InstallError::ExtractionFailed { .. }), "{err}");
        assert!(root.join("download/oracle-x86_64-unknown-linux-gnu.tar.gz").exists());

        drop(workspace);
        assert!(!root.exists());
        assert!(!dir.path().join("bin/oracle").exists());
    }
}
