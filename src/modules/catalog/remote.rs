//! HTTP client for the published library snapshot and its sync hook.

use std::time::Duration;

use async_trait::async_trait;

use super::error::{SnapshotError, SyncError};
use super::loader::SnapshotSource;
use super::models::Book;
use super::sync::SyncEndpoint;

/// Snapshot document served under the remote base URL.
pub const SNAPSHOT_PATH: &str = "library_data.json";
/// Accepts an empty POST and regenerates the snapshot.
pub const SYNC_PATH: &str = "sync";

#[derive(Clone)]
pub struct RemoteLibrary {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteLibrary {
    pub fn new(base_url: &str, timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn snapshot_url(&self) -> String {
        format!("{}/{SNAPSHOT_PATH}", self.base_url)
    }

    pub fn sync_url(&self) -> String {
        format!("{}/{SYNC_PATH}", self.base_url)
    }
}

#[async_trait]
impl SnapshotSource for RemoteLibrary {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn fetch(&self) -> Result<Vec<Book>, SnapshotError> {
        let url = self.snapshot_url();
        tracing::debug!(%url, "fetching remote snapshot");

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(SnapshotError::Status(response.status()));
        }
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl SyncEndpoint for RemoteLibrary {
    async fn request_refresh(&self) -> Result<(), SyncError> {
        let response = self
            .client
            .post(self.sync_url())
            .send()
            .await
            .map_err(|e| SyncError::Unreachable(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(SyncError::Rejected(response.status()))
        }
    }
}
