//! Asset resolution: one capability, two strategies
//!
//! Callers hold an [`AssetResolver`] and call [`AssetResolver::resolve`]; which
//! strategy backs it is decided once from configuration.

use reqwest::Client;
use url::Url;

use super::convention::ConventionResolver;
use super::github::GithubApiResolver;
use super::platform::TargetTriple;
use crate::config::{InstallConfig, Strategy};
use crate::error::{InstallError, Result};

/// Which published release to install
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseSelector {
    pub owner: String,
    pub repo: String,
    /// Concrete tag, or `latest`
    pub tag: String,
}

impl ReleaseSelector {
    pub fn from_config(config: &InstallConfig) -> Self {
        Self {
            owner: config.owner.clone(),
            repo: config.repo.clone(),
            tag: config.tag.clone(),
        }
    }

    pub fn is_latest(&self) -> bool {
        self.tag == crate::config::LATEST_TAG
    }
}

/// A fully resolved download; never partially populated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    pub download_url: String,
    pub asset_file_name: String,
    pub version_label: String,
}

#[derive(Debug, Clone)]
pub enum AssetResolver {
    Api(GithubApiResolver),
    Convention(ConventionResolver),
}

impl AssetResolver {
    pub fn from_config(config: &InstallConfig, client: Client) -> Self {
        match config.strategy {
            Strategy::Api => Self::Api(GithubApiResolver::new(
                client,
                &config.api_url,
                &config.binary_name,
                config.asset_filter.clone(),
                config.github_token.clone(),
            )),
            Strategy::Convention => Self::Convention(ConventionResolver::new(
                client,
                &config.web_url,
                config.asset_name.clone(),
            )),
        }
    }

    pub async fn resolve(
        &self,
        target: &TargetTriple,
        selector: &ReleaseSelector,
    ) -> Result<ResolvedAsset> {
        match self {
            Self::Api(resolver) => resolver.resolve(target, selector).await,
            Self::Convention(resolver) => resolver.resolve(target, selector).await,
        }
    }
}

/// Append path segments to a base URL, percent-encoding each one
pub(crate) fn join_segments(base: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(base).map_err(|e| InstallError::Config {
        reason: format!("invalid base URL '{base}': {e}"),
    })?;
    url.path_segments_mut()
        .map_err(|()| InstallError::Config {
            reason: format!("base URL '{base}' cannot carry a path"),
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
