//! Installer configuration
//!
//! Built once at start-up from defaults, an optional TOML file and the
//! environment (in increasing precedence), then passed down by reference.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{InstallError, Result};

pub const DEFAULT_OWNER: &str = "oracle-mcp";
pub const DEFAULT_REPO: &str = "oracle";
pub const DEFAULT_BINARY_NAME: &str = "oracle";
pub const LATEST_TAG: &str = "latest";
pub const GITHUB_API_URL: &str = "https://api.github.com";
pub const GITHUB_WEB_URL: &str = "https://github.com";

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_VAR: &str = "ORACLE_INSTALL_CONFIG";

/// Which asset resolution strategy a deployment commits to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Query the releases API and fuzzy-match an asset name
    #[default]
    Api,
    /// Build the asset URL from the release naming template
    Convention,
}

impl FromStr for Strategy {
    type Err = InstallError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "api" => Ok(Self::Api),
            "convention" => Ok(Self::Convention),
            other => Err(InstallError::Config {
                reason: format!("unknown strategy '{other}' (expected 'api' or 'convention')"),
            }),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Api => write!(f, "api"),
            Self::Convention => write!(f, "convention"),
        }
    }
}

/// Fully resolved installer configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallConfig {
    pub owner: String,
    pub repo: String,
    /// Executable name searched for in the archive and used at the destination
    pub binary_name: String,
    pub install_dir: PathBuf,
    /// Target triple override, bypasses platform detection
    pub target: Option<String>,
    /// Substring override for API asset matching
    pub asset_filter: Option<String>,
    pub tag: String,
    /// Exact asset name override for convention resolution
    pub asset_name: Option<String>,
    pub strategy: Strategy,
    pub api_url: String,
    pub web_url: String,
    pub github_token: Option<String>,
}

/// On-disk form, every key optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    owner: Option<String>,
    repo: Option<String>,
    binary_name: Option<String>,
    install_dir: Option<String>,
    target: Option<String>,
    asset_filter: Option<String>,
    tag: Option<String>,
    asset_name: Option<String>,
    strategy: Option<Strategy>,
    api_url: Option<String>,
    web_url: Option<String>,
}

impl InstallConfig {
    /// Load configuration from the process environment and the user's config directory
    pub fn load() -> Result<Self> {
        Self::from_sources(
            |key| std::env::var(key).ok(),
            dirs::home_dir(),
            dirs::config_dir(),
        )
    }

    /// Load configuration with an injectable variable lookup
    pub fn from_sources<F>(
        lookup: F,
        home: Option<PathBuf>,
        config_dir: Option<PathBuf>,
    ) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let file = match var(CONFIG_PATH_VAR) {
            Some(explicit) => read_file_config(Path::new(&explicit), true)?,
            None => match &config_dir {
                Some(dir) => read_file_config(&dir.join("oracle").join("install.toml"), false)?,
                None => FileConfig::default(),
            },
        };

        let strategy = match var("ORACLE_INSTALL_STRATEGY") {
            Some(name) => name.parse()?,
            None => file.strategy.unwrap_or_default(),
        };

        let install_dir = match var("ORACLE_INSTALL_DIR").or(file.install_dir) {
            Some(dir) => expand_home(&dir, home.as_deref()),
            None => home
                .as_ref()
                .map(|h| h.join(".local").join("bin"))
                .ok_or_else(|| InstallError::Config {
                    reason: "could not determine home directory; set ORACLE_INSTALL_DIR"
                        .to_string(),
                })?,
        };

        Ok(Self {
            owner: var("ORACLE_OWNER")
                .or(file.owner)
                .unwrap_or_else(|| DEFAULT_OWNER.to_string()),
            repo: var("ORACLE_REPO")
                .or(file.repo)
                .unwrap_or_else(|| DEFAULT_REPO.to_string()),
            binary_name: var("ORACLE_BINARY_NAME")
                .or(file.binary_name)
                .unwrap_or_else(|| DEFAULT_BINARY_NAME.to_string()),
            install_dir,
            target: var("ORACLE_TARGET").or(file.target),
            asset_filter: var("ORACLE_ASSET_FILTER").or(file.asset_filter),
            tag: var("ORACLE_TAG")
                .or_else(|| var("ORACLE_VERSION"))
                .or(file.tag)
                .unwrap_or_else(|| LATEST_TAG.to_string()),
            asset_name: var("ORACLE_ASSET_NAME").or(file.asset_name),
            strategy,
            api_url: var("ORACLE_GITHUB_API_URL")
                .or(file.api_url)
                .unwrap_or_else(|| GITHUB_API_URL.to_string()),
            web_url: var("ORACLE_GITHUB_URL")
                .or(file.web_url)
                .unwrap_or_else(|| GITHUB_WEB_URL.to_string()),
            github_token: var("GITHUB_TOKEN"),
        })
    }
}

fn read_file_config(path: &Path, required: bool) -> Result<FileConfig> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => {
            return Ok(FileConfig::default());
        }
        Err(e) => {
            return Err(InstallError::Config {
                reason: format!("failed to read {}: {e}", path.display()),
            });
        }
    };

    log::debug!("Using config file {}", path.display());
    toml::from_str(&contents).map_err(|e| InstallError::Config {
        reason: format!("failed to parse {}: {e}", path.display()),
    })
}

fn expand_home(dir: &str, home: Option<&Path>) -> PathBuf {
    match (dir.strip_prefix("~/"), home) {
        (Some(rest), Some(home)) => home.join(rest),
        _ if dir == "~" => home.map_or_else(|| PathBuf::from(dir), Path::to_path_buf),
        _ => PathBuf::from(dir),
    }
}
