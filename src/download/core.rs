//! HTTP client and single-file download with progress tracking

use std::path::Path;
use std::time::Duration;

use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tokio::time::timeout;

use crate::error::{InstallError, Result};

const DOWNLOAD_CONNECT_TIMEOUT: Duration = Duration::from_secs(30); // Initial connection
const DOWNLOAD_INACTIVITY_TIMEOUT: Duration = Duration::from_secs(300); // 5 min no data

const USER_AGENT: &str = concat!("oracle-install/", env!("CARGO_PKG_VERSION"));

/// Build the one client shared by every request in a run
pub fn http_client() -> Result<Client> {
    Client::builder()
        .connect_timeout(DOWNLOAD_CONNECT_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| InstallError::Config {
            reason: format!("failed to build HTTP client: {e}"),
        })
}

/// Download `url` to `destination`, following redirects
///
/// All-or-nothing: any transport error, non-success status or stalled stream
/// fails the whole download. Returns the number of bytes written.
pub async fn fetch(client: &Client, url: &str, destination: &Path) -> Result<u64> {
    let failed = |status: String| InstallError::DownloadFailed {
        url: url.to_string(),
        status,
    };

    info!("Downloading {url}");
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| failed(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(failed(status.to_string()));
    }

    let total_bytes = response.content_length();
    let progress = progress_bar(total_bytes);

    let mut file = tokio::fs::File::create(destination)
        .await
        .map_err(|e| InstallError::install_io(destination, e))?;
    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;

    loop {
        let chunk = match timeout(DOWNLOAD_INACTIVITY_TIMEOUT, stream.next()).await {
            Ok(Some(Ok(chunk))) => chunk,
            Ok(Some(Err(e))) => {
                progress.abandon();
                return Err(failed(e.to_string()));
            }
            Ok(None) => break,
            Err(_) => {
                progress.abandon();
                return Err(failed(format!(
                    "timeout: no data received for {} seconds after {downloaded} bytes",
                    DOWNLOAD_INACTIVITY_TIMEOUT.as_secs()
                )));
            }
        };

        file.write_all(&chunk)
            .await
            .map_err(|e| InstallError::install_io(destination, e))?;
        downloaded += chunk.len() as u64;
        progress.set_position(downloaded);
    }

    file.flush()
        .await
        .map_err(|e| InstallError::install_io(destination, e))?;
    progress.finish_and_clear();

    debug!("Wrote {downloaded} bytes to {}", destination.display());
    Ok(downloaded)
}

fn progress_bar(total_bytes: Option<u64>) -> ProgressBar {
    match total_bytes {
        Some(len) => {
            let pb = ProgressBar::new(len);
            if let Ok(style) =
                ProgressStyle::default_bar().template("   [{bar:40.green/blue}] {bytes}/{total_bytes}")
            {
                pb.set_style(style.progress_chars("█▓░"));
            }
            pb
        }
        None => {
            let pb = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::default_spinner().template("   {spinner} {bytes}") {
                pb.set_style(style);
            }
            pb
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[tokio::test]
    async fn writes_full_body() {
        let mut server = Server::new_async().await;
        let body = vec![7u8; 300 * 1024];
        let _mock = server
            .mock("GET", "/asset.bin")
            .with_status(200)
            .with_body(&body)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("asset.bin");
        let client = http_client().unwrap();
        let written = fetch(&client, &format!("{}/asset.bin", server.url()), &dest)
            .await
            .unwrap();

        assert_eq!(written, body.len() as u64);
        assert_eq!(std::fs::read(&dest).unwrap(), body);
    }

    #[tokio::test]
    async fn follows_redirects() {
        let mut server = Server::new_async().await;
        let base = server.url();
        let _redirect = server
            .mock("GET", "/releases/download/v1/a.tar.gz")
            .with_status(302)
            .with_header("location", &format!("{base}/objects/a.tar.gz"))
            .create_async()
            .await;
        let _object = server
            .mock("GET", "/objects/a.tar.gz")
            .with_status(200)
            .with_body("payload")
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("a.tar.gz");
        let client = http_client().unwrap();
        fetch(&client, &format!("{base}/releases/download/v1/a.tar.gz"), &dest)
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "payload");
    }

    #[tokio::test]
    async fn missing_asset_is_download_failure() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/missing.tar.gz")
            .with_status(404)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let url = format!("{}/missing.tar.gz", server.url());
        let client = http_client().unwrap();
        let err = fetch(&client, &url, &dir.path().join("missing.tar.gz"))
            .await
            .unwrap_err();

        match err {
            InstallError::DownloadFailed { url: failed_url, status } => {
                assert_eq!(failed_url, url);
                assert!(status.contains("404"), "{status}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn unreachable_host_is_download_failure() {
        let dir = tempfile::tempdir().unwrap();
        let client = http_client().unwrap();
        let err = fetch(&client, "http://127.0.0.1:9/x", &dir.path().join("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, InstallError::DownloadFailed { .. }), "{err}");
    }
}
