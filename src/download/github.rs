//! GitHub releases API resolution

use log::{debug, info};
use reqwest::Client;
use reqwest::header::ACCEPT;
use serde::Deserialize;

use super::platform::TargetTriple;
use super::resolver::{ReleaseSelector, ResolvedAsset, join_segments};
use crate::error::{InstallError, Result};

/// GitHub release metadata from API
#[derive(Deserialize, Debug)]
pub struct GitHubRelease {
    pub tag_name: String,
    pub assets: Vec<GitHubAsset>,
}

/// GitHub release asset metadata
#[derive(Deserialize, Debug)]
pub struct GitHubAsset {
    pub name: String,
    pub browser_download_url: String,
    #[serde(default)]
    pub size: Option<u64>,
}

/// Resolves assets by querying the releases API and matching names by substring
#[derive(Debug, Clone)]
pub struct GithubApiResolver {
    client: Client,
    api_url: String,
    /// Token every asset of this project carries in its name
    marker: String,
    filter_override: Option<String>,
    token: Option<String>,
}

impl GithubApiResolver {
    pub fn new(
        client: Client,
        api_url: &str,
        marker: &str,
        filter_override: Option<String>,
        token: Option<String>,
    ) -> Self {
        Self {
            client,
            api_url: api_url.to_string(),
            marker: marker.to_string(),
            filter_override,
            token,
        }
    }

    pub async fn resolve(
        &self,
        target: &TargetTriple,
        selector: &ReleaseSelector,
    ) -> Result<ResolvedAsset> {
        let filter = self
            .filter_override
            .clone()
            .unwrap_or_else(|| target.to_string());

        let release = self.fetch_release(selector).await?;
        debug!(
            "Release {} lists {} assets",
            release.tag_name,
            release.assets.len()
        );

        let asset = select_asset(&release.assets, &filter, &self.marker).ok_or_else(|| {
            InstallError::AssetNotFound {
                filter: filter.clone(),
                triple: target.to_string(),
            }
        })?;

        info!("Selected asset {} from release {}", asset.name, release.tag_name);
        Ok(ResolvedAsset {
            download_url: asset.browser_download_url.clone(),
            asset_file_name: asset.name.clone(),
            version_label: release.tag_name.clone(),
        })
    }

    async fn fetch_release(&self, selector: &ReleaseSelector) -> Result<GitHubRelease> {
        let url = release_endpoint(&self.api_url, selector)?;
        info!("Querying {url}");

        let mut request = self
            .client
            .get(url.clone())
            .header(ACCEPT, "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let url = url.to_string();
        let response = request.send().await.map_err(|source| InstallError::Http {
            url: url.clone(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(InstallError::ReleaseLookupFailed {
                url,
                status: status.to_string(),
            });
        }

        let body = response.text().await.map_err(|source| InstallError::Http {
            url: url.clone(),
            source,
        })?;
        parse_release(&url, &body)
    }
}

/// Endpoint for one release; `latest` maps to the newest-release route
pub fn release_endpoint(api_url: &str, selector: &ReleaseSelector) -> Result<url::Url> {
    let (owner, repo) = (selector.owner.as_str(), selector.repo.as_str());
    if selector.is_latest() {
        join_segments(api_url, &["repos", owner, repo, "releases", "latest"])
    } else {
        join_segments(
            api_url,
            &["repos", owner, repo, "releases", "tags", selector.tag.as_str()],
        )
    }
}

/// Parse a release listing body
pub fn parse_release(url: &str, body: &str) -> Result<GitHubRelease> {
    if body.trim().is_empty() {
        return Err(InstallError::MalformedResponse {
            url: url.to_string(),
            reason: "empty body".to_string(),
        });
    }
    serde_json::from_str(body).map_err(|e| InstallError::MalformedResponse {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

/// First asset, in listing order, whose name contains both the filter and the marker
/// (case-insensitive)
pub fn select_asset<'a>(
    assets: &'a [GitHubAsset],
    filter: &str,
    marker: &str,
) -> Option<&'a GitHubAsset> {
    let filter = filter.to_lowercase();
    let marker = marker.to_lowercase();
    assets.iter().find(|asset| {
        let name = asset.name.to_lowercase();
        name.contains(&filter) && name.contains(&marker)
    })
}
