use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use ll_core::{EngineConfig, EngineError, EngineResult};

use crate::ports::ListFetcher;

/// Fetches the filter list from a fixed HTTP(S) endpoint.
pub struct HttpListFetcher {
    client: reqwest::Client,
    url: String,
}

impl HttpListFetcher {
    pub fn new(config: &EngineConfig) -> EngineResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .build()
            .map_err(|e| EngineError::Fetch(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: config.list_url.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ListFetcher for HttpListFetcher {
    async fn fetch_list(&self) -> EngineResult<String> {
        log::debug!("fetching filter list from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| EngineError::Fetch(format!("fetch error for {}: {}", self.url, e)))?;

        if !response.status().is_success() {
            return Err(EngineError::Fetch(format!(
                "HTTP {} for {}",
                response.status().as_u16(),
                self.url
            )));
        }

        response
            .text()
            .await
            .map_err(|e| EngineError::Fetch(format!("read error for {}: {}", self.url, e)))
    }
}

/// Reads the filter list from a local file.
pub struct FileListFetcher {
    path: PathBuf,
}

impl FileListFetcher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ListFetcher for FileListFetcher {
    async fn fetch_list(&self) -> EngineResult<String> {
        tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            EngineError::Fetch(format!("Failed to read '{}': {}", self.path.display(), e))
        })
    }
}
