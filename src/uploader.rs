use anyhow::Result;
use std::time::Duration;

use crate::positioning::Fix;

/// Collaborator persisting accepted fixes on the backend. Uploads are
/// best-effort: the tracker logs failures and keeps going, there is no retry
/// and no rollback of local state.
pub trait LocationUploader: Send + Sync {
    fn upload(&self, fix: &Fix) -> Result<()>;
}

/// Used when no ingestion endpoint is configured.
pub struct DisabledUploader;

impl LocationUploader for DisabledUploader {
    fn upload(&self, _fix: &Fix) -> Result<()> {
        Ok(())
    }
}

pub struct HttpUploader {
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl HttpUploader {
    pub fn new(endpoint: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(HttpUploader {
            endpoint: endpoint.to_string(),
            client,
        })
    }
}

impl LocationUploader for HttpUploader {
    fn upload(&self, fix: &Fix) -> Result<()> {
        let response = self.client.post(&self.endpoint).json(fix).send()?;
        if !response.status().is_success() {
            bail!("location update rejected: {}", response.status());
        }
        Ok(())
    }
}
