//! Convention-based resolution: asset names follow `{repo}-{tag}-{triple}.tar.gz`
//!
//! No API call is made for asset discovery. The only network request is the
//! redirect lookup that turns `latest` into a concrete tag.

use log::{debug, info};
use reqwest::Client;

use super::platform::TargetTriple;
use super::resolver::{ReleaseSelector, ResolvedAsset, join_segments};
use crate::error::{InstallError, Result};

#[derive(Debug, Clone)]
pub struct ConventionResolver {
    client: Client,
    web_url: String,
    asset_name_override: Option<String>,
}

impl ConventionResolver {
    pub fn new(client: Client, web_url: &str, asset_name_override: Option<String>) -> Self {
        Self {
            client,
            web_url: web_url.to_string(),
            asset_name_override,
        }
    }

    pub async fn resolve(
        &self,
        target: &TargetTriple,
        selector: &ReleaseSelector,
    ) -> Result<ResolvedAsset> {
        let tag = if selector.is_latest() {
            self.resolve_latest_tag(selector).await?
        } else {
            selector.tag.clone()
        };

        let asset_file_name = self
            .asset_name_override
            .clone()
            .unwrap_or_else(|| asset_file_name(&selector.repo, &tag, target));
        let download_url = download_url(&self.web_url, selector, &tag, &asset_file_name)?;

        info!("Using release {tag} asset {asset_file_name}");
        Ok(ResolvedAsset {
            download_url,
            asset_file_name,
            version_label: tag,
        })
    }

    /// Follow the host's latest-release redirect and read the tag off the final URL
    async fn resolve_latest_tag(&self, selector: &ReleaseSelector) -> Result<String> {
        let url = join_segments(
            &self.web_url,
            &[
                selector.owner.as_str(),
                selector.repo.as_str(),
                "releases",
                "latest",
            ],
        )?
        .to_string();
        info!("Resolving latest release via {url}");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| InstallError::Http {
                url: url.clone(),
                source,
            })?;

        let final_url = response.url().clone();
        debug!("Latest release redirected to {final_url}");

        if !response.status().is_success() {
            return Err(InstallError::TagResolutionFailed { url });
        }

        tag_from_release_url(&final_url).ok_or(InstallError::TagResolutionFailed { url })
    }
}

/// Deterministic asset name for a release built by the project's pipeline
pub fn asset_file_name(repo: &str, tag: &str, target: &TargetTriple) -> String {
    format!("{repo}-{tag}-{target}.tar.gz")
}

/// `{web}/{owner}/{repo}/releases/download/{tag}/{asset}`
pub fn download_url(
    web_url: &str,
    selector: &ReleaseSelector,
    tag: &str,
    asset_file_name: &str,
) -> Result<String> {
    join_segments(
        web_url,
        &[
            selector.owner.as_str(),
            selector.repo.as_str(),
            "releases",
            "download",
            tag,
            asset_file_name,
        ],
    )
    .map(String::from)
}

/// Tag from a `.../releases/tag/<tag>` landing URL
///
/// Anything else (no redirect, or the release index of a repo with no
/// releases) yields `None`.
fn tag_from_release_url(url: &url::Url) -> Option<String> {
    let segments: Vec<&str> = url
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .collect();
    match segments.as_slice() {
        [.., "releases", "tag", tag] if *tag != crate::config::LATEST_TAG => {
            Some((*tag).to_string())
        }
        _ => None,
    }
}
